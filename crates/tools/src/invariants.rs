//! Structural checks the fuzz harness runs on every generated dungeon.

use std::collections::BTreeSet;

use dungen_core::geometry::distance;
use dungen_core::{CellKind, Dungeon, DungeonConfig, Pos};

/// Every violated invariant, described; empty when the dungeon is sound.
pub fn violations(dungeon: &Dungeon, config: &DungeonConfig) -> Vec<String> {
    let mut found = Vec::new();
    check_rooms(dungeon, config, &mut found);
    check_connectivity(dungeon, &mut found);
    check_grid(dungeon, &mut found);
    check_partition(dungeon, &mut found);
    found
}

fn check_rooms(dungeon: &Dungeon, config: &DungeonConfig, found: &mut Vec<String>) {
    let allowed = i64::from(config.rooms.min_area)..=i64::from(config.rooms.max_area);
    let procedural: Vec<_> = dungeon.rooms.iter().filter(|room| !room.is_prefab()).collect();
    for room in &procedural {
        if !allowed.contains(&room.area()) {
            found.push(format!("{} has area {} outside {allowed:?}", room.label(), room.area()));
        }
    }
    for (index, a) in procedural.iter().enumerate() {
        for b in &procedural[index + 1..] {
            if distance(a.center, b.center) < a.radius + b.radius {
                found.push(format!("{} overlaps {}", a.label(), b.label()));
            }
        }
    }
}

fn check_connectivity(dungeon: &Dungeon, found: &mut Vec<String>) {
    let rooms = dungeon.rooms.len();
    if rooms > 1 && !dungeon.proximity.is_connected() {
        found.push("proximity graph is disconnected".to_string());
    }
    if dungeon.tree.edge_count() != rooms.saturating_sub(1) {
        found.push(format!(
            "spanning tree has {} edges for {rooms} rooms",
            dungeon.tree.edge_count()
        ));
    }
    if !dungeon.tree.is_connected() {
        found.push("spanning tree is disconnected".to_string());
    }
    if dungeon.corridors.len() != dungeon.tree.edge_count() {
        found.push(format!(
            "{} corridors for {} tree edges",
            dungeon.corridors.len(),
            dungeon.tree.edge_count()
        ));
    }
}

fn check_grid(dungeon: &Dungeon, found: &mut Vec<String>) {
    let grid = &dungeon.grid;
    let mut expected: BTreeSet<Pos> =
        dungeon.rooms.iter().flat_map(|room| room.floor_cells()).collect();
    let room_cells = expected.iter().filter(|&&pos| grid.in_bounds(pos)).count();
    expected.extend(dungeon.corridors.iter().flat_map(|corridor| corridor.cells()));
    let expected = expected.into_iter().filter(|&pos| grid.in_bounds(pos)).count();

    if grid.occupied_count() != expected {
        found.push(format!(
            "grid has {} occupied cells, expected {expected}",
            grid.occupied_count()
        ));
    }
    if grid.count(CellKind::Room) != room_cells {
        found.push("a room cell was downgraded".to_string());
    }
    for wall in &dungeon.walls {
        let length = (wall.end.x - wall.start.x) + (wall.end.y - wall.start.y);
        if length != 1 {
            found.push(format!("wall {wall:?} is not a unit segment"));
        }
    }
}

fn check_partition(dungeon: &Dungeon, found: &mut Vec<String>) {
    let leaf_area: i64 = dungeon.partition.leaves().map(|leaf| leaf.region.area()).sum();
    let root_area = dungeon.partition.root().map_or(0, |root| root.region.area());
    if leaf_area != root_area {
        found.push(format!("BSP leaves cover {leaf_area} cells of {root_area}"));
    }
    for room in dungeon.rooms.iter() {
        if !dungeon.partition.leaves().any(|leaf| leaf.rooms.contains(&room.id)) {
            found.push(format!("{} is not on any BSP leaf", room.label()));
        }
    }
}

#[cfg(test)]
mod tests {
    use dungen_core::{GraphAlgorithm, generate_dungeon};

    use super::*;

    #[test]
    fn generated_dungeons_are_clean() {
        for (seed, algorithm) in [
            (1, GraphAlgorithm::Gabriel),
            (2, GraphAlgorithm::Delaunay),
            (3, GraphAlgorithm::RelativeNeighborhood),
        ] {
            let mut config = DungeonConfig::default().with_seed(seed);
            config.general.graph = algorithm;
            let dungeon = generate_dungeon(config.clone()).expect("generates");
            assert_eq!(violations(&dungeon, &config), Vec::<String>::new());
        }
    }

    #[test]
    fn tampered_grid_is_reported() {
        let config = DungeonConfig::default().with_seed(4);
        let mut dungeon = generate_dungeon(config.clone()).expect("generates");
        dungeon.corridors.clear();
        let found = violations(&dungeon, &config);
        assert!(found.iter().any(|violation| violation.contains("corridors for")));
        assert!(found.iter().any(|violation| violation.contains("occupied cells")));
    }
}
