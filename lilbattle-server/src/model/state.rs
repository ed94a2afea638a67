//! Game State
//!
//! The mutable simulation snapshot. `version` is bumped by exactly one on every
//! gameplay write; screenshot bookkeeping in `screenshot_index_info` is written
//! without touching it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::world::WorldData;

/// Per-player economy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Coins available.
    pub coins: i32,
    /// Whether the player is still in the game.
    pub is_active: bool,
}

/// Screenshot freshness bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Last gameplay write.
    #[serde(default)]
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Last successful screenshot pass.
    #[serde(default)]
    pub last_indexed_at: Option<DateTime<Utc>>,
    /// Screenshots are stale or the last pass failed.
    #[serde(default)]
    pub needs_indexing: bool,
}

/// Mutable game snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Owning game.
    pub game_id: String,
    /// Player whose turn it is.
    #[serde(default)]
    pub current_player: i32,
    /// Turn counter, increments when play wraps back to the first player.
    #[serde(default)]
    pub turn_counter: i32,
    /// Map contents.
    #[serde(default)]
    pub world_data: WorldData,
    /// Economy per player id.
    #[serde(default)]
    pub player_states: BTreeMap<i32, PlayerState>,
    /// Number of the latest move group this state reflects.
    #[serde(default)]
    pub current_group_number: i64,
    /// Optimistic counter.
    #[serde(default)]
    pub version: i64,
    /// Screenshot bookkeeping.
    #[serde(default)]
    pub screenshot_index_info: IndexInfo,
}

impl GameState {
    /// Empty state for a game.
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            ..Default::default()
        }
    }

    /// Advance the version from `previous` and flag the snapshot for re-indexing.
    pub fn mark_committed(&mut self, previous: i64, now: DateTime<Utc>) {
        self.version = previous + 1;
        self.screenshot_index_info.last_updated_at = Some(now);
        self.screenshot_index_info.needs_indexing = true;
    }

    /// Record a finished screenshot pass. Leaves `version` alone.
    pub fn mark_indexed(&mut self, indexed_at: DateTime<Utc>, needs_indexing: bool) {
        self.screenshot_index_info.last_indexed_at = Some(indexed_at);
        self.screenshot_index_info.needs_indexing = needs_indexing;
    }
}
