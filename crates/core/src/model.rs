//! Owned snapshot of a finished run, plus its summary statistics.

use serde::Serialize;
use xxhash_rust::xxh3::xxh3_64;

use crate::bsp::SpacePartition;
use crate::corridors::{Corridor, CorridorStyle};
use crate::graph::Graph;
use crate::grid::Grid;
use crate::pipeline::GenerationContext;
use crate::rooms::{RoomOrigin, RoomSet};
use crate::types::{CellKind, Pos, Rect, RoomId};
use crate::walls::WallSegment;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GenerationStats {
    pub seed: u64,
    pub elapsed_ms: f64,
    pub rooms: usize,
    pub prefabs: usize,
    pub proximity_edges: usize,
    pub tree_edges: usize,
    pub corridors: usize,
    pub corridor_blocks: usize,
    pub room_cells: usize,
    pub corridor_cells: usize,
    pub occupied_cells: usize,
    pub wall_segments: usize,
    pub bsp_nodes: usize,
    pub bsp_leaves: usize,
    pub width: i32,
    pub height: i32,
}

impl GenerationStats {
    /// Counts whatever the context holds so far; earlier stages of an
    /// unfinished run report zeros for the later slots.
    pub fn collect(ctx: &GenerationContext, elapsed_ms: f64) -> Self {
        Self {
            seed: ctx.seed,
            elapsed_ms,
            rooms: ctx.rooms.len(),
            prefabs: ctx.rooms.prefab_count(),
            proximity_edges: ctx.proximity.proximity_edge_count(),
            tree_edges: ctx.tree.tree_edge_count(),
            corridors: ctx.corridors.len(),
            corridor_blocks: ctx.corridors.iter().map(|corridor| corridor.blocks.len()).sum(),
            room_cells: ctx.grid.count(CellKind::Room),
            corridor_cells: ctx.grid.count(CellKind::Corridor),
            occupied_cells: ctx.grid.occupied_count(),
            wall_segments: ctx.walls.len(),
            bsp_nodes: ctx.partition.len(),
            bsp_leaves: ctx.partition.leaf_count(),
            width: ctx.bounds.width,
            height: ctx.bounds.height,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Dungeon {
    pub seed: u64,
    pub width: i32,
    pub height: i32,
    pub rooms: RoomSet,
    pub proximity: Graph,
    pub tree: Graph,
    pub corridors: Vec<Corridor>,
    pub grid: Grid,
    pub walls: Vec<WallSegment>,
    pub partition: SpacePartition,
    pub stats: GenerationStats,
}

impl Dungeon {
    pub fn from_context(ctx: &GenerationContext, elapsed_ms: f64) -> Self {
        Self {
            seed: ctx.seed,
            width: ctx.bounds.width,
            height: ctx.bounds.height,
            rooms: ctx.rooms.clone(),
            proximity: ctx.proximity.clone(),
            tree: ctx.tree.clone(),
            corridors: ctx.corridors.clone(),
            grid: ctx.grid.clone(),
            walls: ctx.walls.clone(),
            partition: ctx.partition.clone(),
            stats: GenerationStats::collect(ctx, elapsed_ms),
        }
    }

    /// Stable little-endian encoding of everything a run produced. Timing is
    /// left out and handles are written as creation indices.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(self.seed.to_le_bytes());
        bytes.extend(self.width.to_le_bytes());
        bytes.extend(self.height.to_le_bytes());

        bytes.extend((self.rooms.len() as u32).to_le_bytes());
        for room in self.rooms.iter() {
            match &room.origin {
                RoomOrigin::Procedural => bytes.push(0),
                RoomOrigin::Prefab { name, mode } => {
                    bytes.push(1 + *mode as u8);
                    push_str(&mut bytes, name);
                }
            }
            push_rect(&mut bytes, room.rect);
            push_pos(&mut bytes, room.center);
            bytes.extend(room.radius.to_bits().to_le_bytes());
            bytes.extend(room.cells.iter().map(|&cell| cell as u8));
            bytes.extend((room.portals.len() as u32).to_le_bytes());
            for &portal in &room.portals {
                push_pos(&mut bytes, portal);
            }
        }

        for graph in [&self.proximity, &self.tree] {
            let edges = graph.edges();
            bytes.extend((edges.len() as u32).to_le_bytes());
            for edge in edges {
                let index = |id| graph.node(id).map_or(u32::MAX, |node| node.index as u32);
                bytes.extend(index(edge.from).to_le_bytes());
                bytes.extend(index(edge.to).to_le_bytes());
                bytes.extend(edge.weight.to_le_bytes());
            }
        }

        bytes.extend((self.corridors.len() as u32).to_le_bytes());
        for corridor in &self.corridors {
            bytes.extend(self.room_index(corridor.from_room).to_le_bytes());
            bytes.extend(self.room_index(corridor.to_room).to_le_bytes());
            bytes.push(match corridor.style {
                CorridorStyle::LShape => 0,
                CorridorStyle::Bresenham => 1,
            });
            push_pos(&mut bytes, corridor.start);
            push_pos(&mut bytes, corridor.end);
            bytes.extend((corridor.blocks.len() as u32).to_le_bytes());
            for &block in &corridor.blocks {
                push_rect(&mut bytes, block);
            }
        }

        bytes.extend(self.grid.width().to_le_bytes());
        bytes.extend(self.grid.height().to_le_bytes());
        bytes.extend(self.grid.cells().iter().map(|&cell| cell as u8));

        bytes.extend((self.walls.len() as u32).to_le_bytes());
        for wall in &self.walls {
            push_pos(&mut bytes, wall.start);
            push_pos(&mut bytes, wall.end);
        }

        bytes.extend((self.partition.len() as u32).to_le_bytes());
        for node in self.partition.nodes() {
            push_rect(&mut bytes, node.region);
            for child in [node.left, node.right] {
                bytes.extend(child.map_or(u32::MAX, |child| child as u32).to_le_bytes());
            }
            bytes.extend((node.rooms.len() as u32).to_le_bytes());
            for &room in &node.rooms {
                bytes.extend(self.room_index(room).to_le_bytes());
            }
        }

        bytes
    }

    pub fn fingerprint(&self) -> u64 {
        xxh3_64(&self.canonical_bytes())
    }

    fn room_index(&self, id: RoomId) -> u32 {
        self.rooms.get(id).map_or(u32::MAX, |room| room.index as u32)
    }
}

fn push_pos(bytes: &mut Vec<u8>, pos: Pos) {
    bytes.extend(pos.x.to_le_bytes());
    bytes.extend(pos.y.to_le_bytes());
}

fn push_rect(bytes: &mut Vec<u8>, rect: Rect) {
    bytes.extend(rect.x.to_le_bytes());
    bytes.extend(rect.y.to_le_bytes());
    bytes.extend(rect.width.to_le_bytes());
    bytes.extend(rect.height.to_le_bytes());
}

fn push_str(bytes: &mut Vec<u8>, text: &str) {
    bytes.extend((text.len() as u32).to_le_bytes());
    bytes.extend(text.as_bytes());
}
