//! Game Creation Checks
//!
//! Validation of a new game's player configuration against its world, and the
//! starting economy of each player.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::model::{Game, GameConfiguration, GameState, PlayerState, WorldData};
use crate::rules::calculate_player_base_income;

/// Creation request problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Two player slots share an id.
    #[error("duplicate player ID: {0}")]
    DuplicatePlayerId(i32),

    /// A configured player owns nothing on the map.
    #[error("player {0} has no units or tiles in the world")]
    UnreachablePlayer(i32),
}

/// Check a new game's player slots.
///
/// Player ids must be unique. When a world is supplied, every configured
/// player must own at least one tile or unit in it.
pub fn validate_create_game_request(
    game: &Game,
    world: Option<&WorldData>,
) -> Result<(), ValidationError> {
    let players = &game.config.players;

    let mut seen = BTreeSet::new();
    for player in players {
        if !seen.insert(player.player_id) {
            return Err(ValidationError::DuplicatePlayerId(player.player_id));
        }
    }

    if let Some(world) = world {
        if let Some(player) = players.iter().find(|p| !world.has_presence(p.player_id)) {
            return Err(ValidationError::UnreachablePlayer(player.player_id));
        }
    }

    Ok(())
}

/// Give every configured player starting coins plus base income, and mark them active.
pub fn initialize_player_states(state: &mut GameState, config: &GameConfiguration) {
    let income = config.income_configs.as_ref();
    for player in &config.players {
        let base_income = calculate_player_base_income(player.player_id, &state.world_data, income);
        state.player_states.insert(
            player.player_id,
            PlayerState {
                coins: player.starting_coins + base_income,
                is_active: true,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GamePlayer, Tile, Unit};
    use crate::rules::TILE_PLAINS;

    fn player(id: i32, coins: i32) -> GamePlayer {
        GamePlayer {
            player_id: id,
            starting_coins: coins,
            ..Default::default()
        }
    }

    fn game_with(players: Vec<GamePlayer>) -> Game {
        Game {
            id: "g1".into(),
            config: GameConfiguration {
                players,
                income_configs: None,
            },
            ..Default::default()
        }
    }

    fn two_player_world() -> WorldData {
        let mut world = WorldData::default();
        world.set_tile(Tile { q: 0, r: 0, tile_type: TILE_PLAINS, player: 1, ..Default::default() });
        world.set_unit(Unit { q: 2, r: 0, player: 2, unit_type: 1, ..Default::default() });
        world
    }

    #[test]
    fn test_rejects_duplicate_player_ids() {
        let game = game_with(vec![player(1, 0), player(1, 0)]);
        assert_eq!(
            validate_create_game_request(&game, Some(&two_player_world())),
            Err(ValidationError::DuplicatePlayerId(1))
        );
    }

    #[test]
    fn test_rejects_player_without_presence() {
        let game = game_with(vec![player(1, 0), player(3, 0)]);
        assert_eq!(
            validate_create_game_request(&game, Some(&two_player_world())),
            Err(ValidationError::UnreachablePlayer(3))
        );
    }

    #[test]
    fn test_accepts_players_with_tile_or_unit() {
        let game = game_with(vec![player(1, 0), player(2, 0)]);
        assert!(validate_create_game_request(&game, Some(&two_player_world())).is_ok());
        // without a world only uniqueness is checked
        assert!(validate_create_game_request(&game_with(vec![player(9, 0)]), None).is_ok());
    }

    #[test]
    fn test_starting_economy_with_zero_income() {
        let game = game_with(vec![player(1, 100), player(2, 100)]);
        let mut state = GameState::new("g1");
        state.world_data = two_player_world();
        initialize_player_states(&mut state, &game.config);

        assert_eq!(state.player_states.len(), 2);
        assert_eq!(state.player_states[&1], PlayerState { coins: 100, is_active: true });
        assert_eq!(state.player_states[&2], PlayerState { coins: 100, is_active: true });
    }

    #[test]
    fn test_starting_economy_adds_base_income() {
        let game = game_with(vec![player(1, 50)]);
        let mut state = GameState::new("g1");
        state.world_data.set_tile(Tile {
            q: 0,
            r: 0,
            tile_type: crate::rules::TILE_LAND_BASE,
            player: 1,
            ..Default::default()
        });
        initialize_player_states(&mut state, &game.config);
        assert_eq!(state.player_states[&1].coins, 150);
    }
}
