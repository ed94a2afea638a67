//! Runtime Game
//!
//! A working copy of a game rebuilt from its stored snapshot. It is only valid
//! for the state version it was built from.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::model::{Game, GameState, Unit, WorldData};

/// Per-turn resources of a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Movement points restored each turn.
    pub movement_points: i32,
    /// Maximum health.
    pub health: i32,
}

/// Unit stats keyed by unit type.
#[derive(Debug, Clone)]
pub struct UnitRules {
    units: BTreeMap<i32, UnitStats>,
}

impl UnitRules {
    /// Empty table.
    pub fn new() -> Self {
        Self {
            units: BTreeMap::new(),
        }
    }

    /// Register or replace a unit type.
    pub fn with_unit(mut self, unit_type: i32, movement_points: i32, health: i32) -> Self {
        self.units.insert(unit_type, UnitStats { movement_points, health });
        self
    }

    /// Stats for a unit type.
    pub fn get(&self, unit_type: i32) -> Result<UnitStats, RulesError> {
        self.units
            .get(&unit_type)
            .copied()
            .ok_or(RulesError::UnknownUnitType(unit_type))
    }
}

impl Default for UnitRules {
    fn default() -> Self {
        Self::new()
            .with_unit(1, 3, 10) // soldier
            .with_unit(2, 2, 10) // heavy infantry
            .with_unit(3, 5, 10) // scout
            .with_unit(4, 4, 10) // tank
            .with_unit(5, 3, 10) // artillery
            .with_unit(10, 6, 10) // fighter
            .with_unit(11, 5, 10) // bomber
            .with_unit(20, 4, 10) // gunboat
            .with_unit(21, 3, 10) // destroyer
            .with_unit(27, 2, 10) // engineer
            .with_unit(28, 4, 10) // transport
            .with_unit(29, 3, 10) // medic
            .with_unit(31, 2, 10) // anti-air
            .with_unit(39, 1, 10) // fortification
    }
}

/// Rules lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    /// Unit type missing from the rules table.
    #[error("unknown unit type {0}")]
    UnknownUnitType(i32),
}

/// Game rebuilt from a metadata record and a state snapshot.
#[derive(Debug, Clone)]
pub struct RuntimeGame {
    /// Game display name.
    pub game_name: String,
    /// Player whose turn it is.
    pub current_player: i32,
    /// Turn counter at build time.
    pub turn_counter: i32,
    /// State version this runtime was built from.
    pub version: i64,
    /// World copy.
    pub world: WorldData,
    rules: Arc<UnitRules>,
}

impl RuntimeGame {
    /// Build from a snapshot.
    pub fn new(game: &Game, state: &GameState, rules: Arc<UnitRules>) -> Self {
        Self {
            game_name: game.name.clone(),
            current_player: state.current_player,
            turn_counter: state.turn_counter,
            version: state.version,
            world: state.world_data.clone(),
            rules,
        }
    }

    /// Whether this runtime still matches `state`.
    pub fn is_current_for(&self, state: &GameState) -> bool {
        self.version == state.version
    }

    /// Restore a unit's per-turn resources once per turn.
    ///
    /// A unit already refreshed this turn is left alone. Freshly built units
    /// (zero health) get full health; damaged units keep theirs.
    pub fn top_up_unit_if_needed(&self, unit: &mut Unit) -> Result<(), RulesError> {
        if unit.last_topped_up_turn >= self.turn_counter {
            return Ok(());
        }

        let stats = self.rules.get(unit.unit_type)?;
        unit.distance_left = stats.movement_points;
        if unit.available_health == 0 {
            unit.available_health = stats.health;
        }
        unit.attack_history.clear();
        unit.attacks_received_this_turn = 0;
        unit.progression_step = 0;
        unit.last_topped_up_turn = self.turn_counter;
        Ok(())
    }

    /// Top up every unit in `world`, returning the unit types that could not be resolved.
    pub fn top_up_units(&self, world: &mut WorldData) -> Vec<RulesError> {
        let mut skipped = Vec::new();
        for unit in world.units_map.values_mut() {
            if let Err(e) = self.top_up_unit_if_needed(unit) {
                skipped.push(e);
            }
        }
        skipped
    }
}
