//! World Data
//!
//! Tiles, units and crossings of a hex map, keyed by `"q,r"` coordinate strings.
//! Older records stored tiles and units as plain lists; those lists are folded into
//! the maps by [`crate::rules::migration::migrate_world_data`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Map key for an axial coordinate.
pub fn coord_key(q: i32, r: i32) -> String {
    format!("{},{}", q, r)
}

/// A map tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Axial Q coordinate.
    pub q: i32,
    /// Axial R coordinate.
    pub r: i32,
    /// Terrain type id.
    pub tile_type: i32,
    /// Owning player (0 = neutral).
    #[serde(default)]
    pub player: i32,
    /// Short label such as "A1".
    #[serde(default)]
    pub shortcut: String,
    /// Turn at which the tile was last refreshed.
    #[serde(default)]
    pub last_topped_up_turn: i32,
}

/// A unit on the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Axial Q coordinate.
    pub q: i32,
    /// Axial R coordinate.
    pub r: i32,
    /// Owning player.
    pub player: i32,
    /// Unit type id.
    pub unit_type: i32,
    /// Short label such as "B2".
    #[serde(default)]
    pub shortcut: String,
    /// Current health (0 = freshly built, not yet topped up).
    #[serde(default)]
    pub available_health: i32,
    /// Movement points left this turn.
    #[serde(default)]
    pub distance_left: i32,
    /// Turn at which the unit was last refreshed.
    #[serde(default)]
    pub last_topped_up_turn: i32,
    /// Attacks received this turn.
    #[serde(default)]
    pub attacks_received_this_turn: i32,
    /// Coordinates attacked this turn.
    #[serde(default)]
    pub attack_history: Vec<String>,
    /// Progress through the unit's action sequence this turn.
    #[serde(default)]
    pub progression_step: i32,
}

/// Kind of crossing laid over a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingType {
    /// No crossing.
    #[default]
    Unspecified,
    /// Road over land.
    Road,
    /// Bridge over water.
    Bridge,
}

/// A road or bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crossing {
    /// Crossing kind.
    #[serde(rename = "type")]
    pub crossing_type: CrossingType,
    /// Connectivity towards each of the six hex neighbours.
    #[serde(default)]
    pub connects_to: Vec<bool>,
}

impl Crossing {
    /// Crossing of the given kind with no connectivity yet.
    pub fn new(crossing_type: CrossingType) -> Self {
        Self {
            crossing_type,
            connects_to: vec![false; 6],
        }
    }
}

/// World snapshot carried by a game state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldData {
    /// Tiles keyed by coordinate.
    #[serde(default)]
    pub tiles_map: BTreeMap<String, Tile>,
    /// Units keyed by coordinate.
    #[serde(default)]
    pub units_map: BTreeMap<String, Unit>,
    /// Roads and bridges keyed by coordinate.
    #[serde(default)]
    pub crossings: BTreeMap<String, Crossing>,
    /// Legacy list-form tiles.
    #[serde(default)]
    pub tiles: Vec<Tile>,
    /// Legacy list-form units.
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl WorldData {
    /// Insert or replace a tile at its coordinate.
    pub fn set_tile(&mut self, tile: Tile) {
        self.tiles_map.insert(coord_key(tile.q, tile.r), tile);
    }

    /// Insert or replace a unit at its coordinate.
    pub fn set_unit(&mut self, unit: Unit) {
        self.units_map.insert(coord_key(unit.q, unit.r), unit);
    }

    /// Tile at a coordinate.
    pub fn tile_at(&self, q: i32, r: i32) -> Option<&Tile> {
        self.tiles_map.get(&coord_key(q, r))
    }

    /// Unit at a coordinate.
    pub fn unit_at(&self, q: i32, r: i32) -> Option<&Unit> {
        self.units_map.get(&coord_key(q, r))
    }

    /// Whether a player owns at least one tile or unit.
    pub fn has_presence(&self, player_id: i32) -> bool {
        self.tiles_map.values().any(|t| t.player == player_id)
            || self.units_map.values().any(|u| u.player == player_id)
    }

    /// Whether legacy lists still need folding into the maps.
    pub fn needs_migration(&self) -> bool {
        !self.tiles.is_empty() || !self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_key_format() {
        assert_eq!(coord_key(3, -2), "3,-2");
    }

    #[test]
    fn test_presence_checks_tiles_and_units() {
        let mut world = WorldData::default();
        world.set_tile(Tile { q: 0, r: 0, tile_type: 5, player: 1, ..Default::default() });
        world.set_unit(Unit { q: 1, r: 0, player: 2, unit_type: 1, ..Default::default() });

        assert!(world.has_presence(1));
        assert!(world.has_presence(2));
        assert!(!world.has_presence(3));
        assert_eq!(world.unit_at(1, 0).map(|u| u.player), Some(2));
    }
}
