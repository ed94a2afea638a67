//! Rules Inputs
//!
//! The slice of game rules this layer depends on. The combat and movement engine
//! lives elsewhere; what remains here is pure data shaping.
//!
//! ## Module Structure
//!
//! - `migration`: Schema migration of stored world data
//! - `income`: Base income and starting economy
//! - `runtime`: Runtime game rebuilt from a snapshot, unit top-up

pub mod income;
pub mod migration;
pub mod runtime;

// Re-export key types
pub use income::{calculate_player_base_income, tile_income};
pub use migration::{ensure_shortcuts, migrate_world_data};
pub use runtime::{RulesError, RuntimeGame, UnitRules, UnitStats};

/// Land base tile.
pub const TILE_LAND_BASE: i32 = 1;
/// Naval base tile.
pub const TILE_NAVAL_BASE: i32 = 2;
/// Airport tile.
pub const TILE_AIRPORT: i32 = 3;
/// Desert tile.
pub const TILE_DESERT: i32 = 4;
/// Plains (grass) tile.
pub const TILE_PLAINS: i32 = 5;
/// Regular water tile.
pub const TILE_WATER_REGULAR: i32 = 10;
/// Shallow water tile.
pub const TILE_WATER_SHALLOW: i32 = 14;
/// Deep water tile.
pub const TILE_WATER_DEEP: i32 = 15;
/// Missile silo tile.
pub const TILE_MISSILE_SILO: i32 = 16;
/// Bridge over regular water (legacy tile type).
pub const TILE_BRIDGE_REGULAR: i32 = 17;
/// Bridge over shallow water (legacy tile type).
pub const TILE_BRIDGE_SHALLOW: i32 = 18;
/// Bridge over deep water (legacy tile type).
pub const TILE_BRIDGE_DEEP: i32 = 19;
/// Mines tile.
pub const TILE_MINES: i32 = 20;
/// Road (legacy tile type).
pub const TILE_ROAD: i32 = 22;
