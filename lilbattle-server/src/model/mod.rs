//! Data Model
//!
//! Persistent records owned by the storage layer.
//!
//! ## Module Structure
//!
//! - `game`: Game metadata, player/income configuration, metadata patches
//! - `state`: Mutable simulation snapshot, per-player economy, index bookkeeping
//! - `world`: Tiles, units and crossings keyed by hex coordinate
//! - `history`: Append-only move log

pub mod game;
pub mod history;
pub mod state;
pub mod world;

// Re-export key types
pub use game::{Game, GameConfiguration, GamePatch, GamePlayer, IncomeConfig};
pub use history::{GameMove, GameMoveGroup, GameMoveHistory, MoveType, Position};
pub use state::{GameState, IndexInfo, PlayerState};
pub use world::{coord_key, Crossing, CrossingType, Tile, Unit, WorldData};
