//! Game Metadata
//!
//! Identity and configuration of a game. Metadata is edited through [`GamePatch`],
//! which names exactly the fields a caller wants to change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Player slot in a game configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePlayer {
    /// Player number (1-based, matches tile/unit ownership).
    pub player_id: i32,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Team number (0 = no team).
    #[serde(default)]
    pub team_id: i32,
    /// Coins granted before base income on game creation.
    #[serde(default)]
    pub starting_coins: i32,
}

/// Per-tile-type income overrides.
///
/// A field only takes effect when positive; otherwise the default income table applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeConfig {
    /// Land base income.
    #[serde(default)]
    pub landbase_income: i32,
    /// Naval base income.
    #[serde(default)]
    pub navalbase_income: i32,
    /// Airport income.
    #[serde(default)]
    pub airportbase_income: i32,
    /// Missile silo income.
    #[serde(default)]
    pub missilesilo_income: i32,
    /// Mines income.
    #[serde(default)]
    pub mines_income: i32,
    /// Flat income every player receives regardless of tiles.
    #[serde(default)]
    pub game_income: i32,
}

/// Player and economy configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfiguration {
    /// Configured player slots.
    #[serde(default)]
    pub players: Vec<GamePlayer>,
    /// Income overrides.
    #[serde(default)]
    pub income_configs: Option<IncomeConfig>,
}

/// Game metadata record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Game identifier.
    pub id: String,
    /// Owner of the game.
    #[serde(default)]
    pub creator_id: String,
    /// World this game was created from.
    #[serde(default)]
    pub world_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Search tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Difficulty label.
    #[serde(default)]
    pub difficulty: String,
    /// Player and income configuration.
    #[serde(default)]
    pub config: GameConfiguration,
    /// Screenshot URLs.
    #[serde(default)]
    pub preview_urls: Vec<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last metadata write.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Field-level metadata update.
///
/// `None` leaves a field untouched; `Some` replaces it, including with an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New tag list.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// New difficulty.
    #[serde(default)]
    pub difficulty: Option<String>,
    /// New configuration.
    #[serde(default)]
    pub config: Option<GameConfiguration>,
}

impl GamePatch {
    /// Patch that only renames.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.difficulty.is_none()
            && self.config.is_none()
    }

    /// Merge present fields into `game`.
    pub fn apply_to(&self, game: &mut Game) {
        if let Some(name) = &self.name {
            game.name = name.clone();
        }
        if let Some(description) = &self.description {
            game.description = description.clone();
        }
        if let Some(tags) = &self.tags {
            game.tags = tags.clone();
        }
        if let Some(difficulty) = &self.difficulty {
            game.difficulty = difficulty.clone();
        }
        if let Some(config) = &self.config {
            game.config = config.clone();
        }
    }

    /// Build a whole new game record from this patch alone.
    ///
    /// Absent fields take their default values.
    pub fn into_game(self, id: impl Into<String>) -> Game {
        let mut game = Game {
            id: id.into(),
            ..Default::default()
        };
        self.apply_to(&mut game);
        game
    }
}

impl Game {
    /// Player slot by id.
    pub fn player(&self, player_id: i32) -> Option<&GamePlayer> {
        self.config.players.iter().find(|p| p.player_id == player_id)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_game() -> Game {
        Game {
            id: "g1".into(),
            creator_id: "alice".into(),
            name: "Original".into(),
            description: "Two islands".into(),
            tags: vec!["naval".into()],
            difficulty: "hard".into(),
            config: GameConfiguration {
                players: vec![GamePlayer {
                    player_id: 1,
                    starting_coins: 300,
                    ..Default::default()
                }],
                income_configs: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_rename_patch_leaves_other_fields() {
        let mut game = sample_game();
        GamePatch::rename("Renamed").apply_to(&mut game);

        assert_eq!(game.name, "Renamed");
        assert_eq!(game.description, "Two islands");
        assert_eq!(game.tags, vec!["naval".to_string()]);
        assert_eq!(game.creator_id, "alice");
        assert_eq!(game.config.players.len(), 1);
    }

    #[test]
    fn test_present_empty_value_clears_field() {
        let mut game = sample_game();
        let patch = GamePatch {
            description: Some(String::new()),
            tags: Some(vec![]),
            ..Default::default()
        };
        patch.apply_to(&mut game);

        assert_eq!(game.description, "");
        assert!(game.tags.is_empty());
        assert_eq!(game.name, "Original");
    }

    #[test]
    fn test_into_game_replaces_everything() {
        let game = GamePatch::rename("Fresh").into_game("g2");
        assert_eq!(game.id, "g2");
        assert_eq!(game.name, "Fresh");
        assert!(game.creator_id.is_empty());
        assert!(GamePatch::default().is_empty());
    }
}
