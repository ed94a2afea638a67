//! World Data Migration
//!
//! Brings stored world data up to the current schema. Every step is idempotent,
//! so migrating an already-current world is a no-op.

use std::collections::BTreeMap;

use crate::model::{coord_key, Crossing, CrossingType, WorldData};
use crate::rules::{
    TILE_BRIDGE_DEEP, TILE_BRIDGE_REGULAR, TILE_BRIDGE_SHALLOW, TILE_PLAINS, TILE_ROAD,
    TILE_WATER_DEEP, TILE_WATER_REGULAR, TILE_WATER_SHALLOW,
};

/// Migrate world data in place.
///
/// - Legacy `tiles`/`units` lists are folded into the coordinate maps
///   (entries already present in a map win).
/// - Road and bridge tile types become crossings over their base terrain.
/// - Owned tiles and units without a shortcut get one.
pub fn migrate_world_data(world: &mut WorldData) {
    for tile in std::mem::take(&mut world.tiles) {
        world.tiles_map.entry(coord_key(tile.q, tile.r)).or_insert(tile);
    }
    for unit in std::mem::take(&mut world.units) {
        world.units_map.entry(coord_key(unit.q, unit.r)).or_insert(unit);
    }

    extract_crossings(world);
    ensure_shortcuts(world);
}

fn extract_crossings(world: &mut WorldData) {
    for (key, tile) in world.tiles_map.iter_mut() {
        let (crossing, base) = match tile.tile_type {
            TILE_ROAD => (CrossingType::Road, TILE_PLAINS),
            TILE_BRIDGE_SHALLOW => (CrossingType::Bridge, TILE_WATER_SHALLOW),
            TILE_BRIDGE_REGULAR => (CrossingType::Bridge, TILE_WATER_REGULAR),
            TILE_BRIDGE_DEEP => (CrossingType::Bridge, TILE_WATER_DEEP),
            _ => continue,
        };
        world.crossings.insert(key.clone(), Crossing::new(crossing));
        tile.tile_type = base;
    }
}

/// Give every owned tile and unit a shortcut such as "A1" (player 1, first item).
///
/// Existing shortcuts are kept and numbering continues after the highest one.
pub fn ensure_shortcuts(world: &mut WorldData) {
    let mut tile_counters = BTreeMap::new();
    for tile in world.tiles_map.values() {
        note_shortcut(tile.player, &tile.shortcut, &mut tile_counters);
    }
    for tile in world.tiles_map.values_mut() {
        if tile.player > 0 && tile.shortcut.is_empty() {
            tile.shortcut = next_shortcut(tile.player, &mut tile_counters);
        }
    }

    let mut unit_counters = BTreeMap::new();
    for unit in world.units_map.values() {
        note_shortcut(unit.player, &unit.shortcut, &mut unit_counters);
    }
    for unit in world.units_map.values_mut() {
        if unit.player > 0 && unit.shortcut.is_empty() {
            unit.shortcut = next_shortcut(unit.player, &mut unit_counters);
        }
    }
}

fn note_shortcut(player: i32, shortcut: &str, counters: &mut BTreeMap<i32, i32>) {
    if player <= 0 || shortcut.len() < 2 {
        return;
    }
    let mut chars = shortcut.chars();
    let letter = match chars.next() {
        Some(c) if c.is_ascii_uppercase() => c,
        _ => return,
    };
    if let Ok(num) = chars.as_str().parse::<i32>() {
        let owner = (letter as i32) - ('A' as i32) + 1;
        let counter = counters.entry(owner).or_insert(0);
        *counter = (*counter).max(num);
    }
}

fn next_shortcut(player: i32, counters: &mut BTreeMap<i32, i32>) -> String {
    if !(1..=26).contains(&player) {
        return String::new();
    }
    let counter = counters.entry(player).or_insert(0);
    *counter += 1;
    let letter = (b'A' + (player - 1) as u8) as char;
    format!("{}{}", letter, counter)
}
