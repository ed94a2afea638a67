//! Base Income
//!
//! Income is a pure function of the player, the world and the income overrides.

use crate::model::{IncomeConfig, WorldData};
use crate::rules::{TILE_AIRPORT, TILE_LAND_BASE, TILE_MINES, TILE_MISSILE_SILO, TILE_NAVAL_BASE};

/// Default land base income.
pub const DEFAULT_LANDBASE_INCOME: i32 = 100;
/// Default naval base income.
pub const DEFAULT_NAVALBASE_INCOME: i32 = 150;
/// Default airport income.
pub const DEFAULT_AIRPORTBASE_INCOME: i32 = 200;
/// Default missile silo income.
pub const DEFAULT_MISSILESILO_INCOME: i32 = 300;
/// Default mines income.
pub const DEFAULT_MINES_INCOME: i32 = 500;

fn default_income(tile_type: i32) -> i32 {
    match tile_type {
        TILE_LAND_BASE => DEFAULT_LANDBASE_INCOME,
        TILE_NAVAL_BASE => DEFAULT_NAVALBASE_INCOME,
        TILE_AIRPORT => DEFAULT_AIRPORTBASE_INCOME,
        TILE_MISSILE_SILO => DEFAULT_MISSILESILO_INCOME,
        TILE_MINES => DEFAULT_MINES_INCOME,
        _ => 0,
    }
}

/// Income a tile of `tile_type` yields per turn.
///
/// A positive override wins; otherwise the default table applies.
pub fn tile_income(tile_type: i32, config: Option<&IncomeConfig>) -> i32 {
    if let Some(config) = config {
        let configured = match tile_type {
            TILE_LAND_BASE => config.landbase_income,
            TILE_NAVAL_BASE => config.navalbase_income,
            TILE_AIRPORT => config.airportbase_income,
            TILE_MISSILE_SILO => config.missilesilo_income,
            TILE_MINES => config.mines_income,
            _ => 0,
        };
        if configured > 0 {
            return configured;
        }
    }
    default_income(tile_type)
}

/// Total base income for a player: owned tile income plus flat game income.
pub fn calculate_player_base_income(
    player_id: i32,
    world: &WorldData,
    config: Option<&IncomeConfig>,
) -> i32 {
    let tiles: i32 = world
        .tiles_map
        .values()
        .filter(|t| t.player == player_id)
        .map(|t| tile_income(t.tile_type, config))
        .sum();

    let game_income = config.map(|c| c.game_income.max(0)).unwrap_or(0);
    tiles + game_income
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tile;
    use crate::rules::TILE_PLAINS;

    fn world() -> WorldData {
        let mut world = WorldData::default();
        world.set_tile(Tile { q: 0, r: 0, tile_type: TILE_LAND_BASE, player: 1, ..Default::default() });
        world.set_tile(Tile { q: 1, r: 0, tile_type: TILE_MINES, player: 1, ..Default::default() });
        world.set_tile(Tile { q: 2, r: 0, tile_type: TILE_PLAINS, player: 1, ..Default::default() });
        world.set_tile(Tile { q: 3, r: 0, tile_type: TILE_AIRPORT, player: 2, ..Default::default() });
        world
    }

    #[test]
    fn test_default_table() {
        assert_eq!(calculate_player_base_income(1, &world(), None), 600);
        assert_eq!(calculate_player_base_income(2, &world(), None), 200);
        assert_eq!(calculate_player_base_income(3, &world(), None), 0);
    }

    #[test]
    fn test_overrides_and_game_income() {
        let config = IncomeConfig {
            landbase_income: 40,
            game_income: 10,
            ..Default::default()
        };
        // land base overridden, mines falls back to default
        assert_eq!(calculate_player_base_income(1, &world(), Some(&config)), 550);
    }

    #[test]
    fn test_plain_tiles_yield_nothing() {
        assert_eq!(tile_income(TILE_PLAINS, None), 0);
    }
}
