//! JSON view of a generated dungeon for external renderers.

use anyhow::{Context, Result};
use dungen_core::corridors::{CorridorStyle, Segment};
use dungen_core::graph::Graph;
use dungen_core::walls::WallSegment;
use dungen_core::{Dungeon, GenerationStats, Pos, Rect, RoomId};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DungeonExport {
    pub seed: u64,
    pub fingerprint: String,
    pub width: i32,
    pub height: i32,
    pub stats: GenerationStats,
    pub rooms: Vec<RoomExport>,
    pub proximity_edges: Vec<EdgeExport>,
    pub tree_edges: Vec<EdgeExport>,
    pub corridors: Vec<CorridorExport>,
    pub walls: Vec<WallSegment>,
    /// One string per grid row: `#` room, `.` corridor, space empty.
    pub grid: Vec<String>,
    pub partition: Vec<PartitionExport>,
}

#[derive(Debug, Serialize)]
pub struct RoomExport {
    pub index: usize,
    pub name: Option<String>,
    pub rect: Rect,
    pub center: Pos,
    pub radius: f64,
    pub portals: Vec<Pos>,
}

#[derive(Debug, Serialize)]
pub struct EdgeExport {
    pub from: usize,
    pub to: usize,
    pub weight: u32,
}

#[derive(Debug, Serialize)]
pub struct CorridorExport {
    pub from: usize,
    pub to: usize,
    pub style: CorridorStyle,
    pub segments: Vec<Segment>,
    pub blocks: Vec<Rect>,
}

#[derive(Debug, Serialize)]
pub struct PartitionExport {
    pub region: Rect,
    pub depth: u32,
    pub children: Option<(usize, usize)>,
    pub rooms: Vec<usize>,
}

impl DungeonExport {
    pub fn from_dungeon(dungeon: &Dungeon) -> Self {
        let room_index = |id: RoomId| dungeon.rooms.get(id).map_or(usize::MAX, |room| room.index);

        Self {
            seed: dungeon.seed,
            fingerprint: format!("{:016x}", dungeon.fingerprint()),
            width: dungeon.width,
            height: dungeon.height,
            stats: dungeon.stats.clone(),
            rooms: dungeon
                .rooms
                .iter()
                .map(|room| RoomExport {
                    index: room.index,
                    name: room.name().map(str::to_string),
                    rect: room.rect,
                    center: room.center,
                    radius: room.radius,
                    portals: room.portals.clone(),
                })
                .collect(),
            proximity_edges: edges(&dungeon.proximity, &room_index),
            tree_edges: edges(&dungeon.tree, &room_index),
            corridors: dungeon
                .corridors
                .iter()
                .map(|corridor| CorridorExport {
                    from: room_index(corridor.from_room),
                    to: room_index(corridor.to_room),
                    style: corridor.style,
                    segments: corridor.segments.clone(),
                    blocks: corridor.blocks.clone(),
                })
                .collect(),
            walls: dungeon.walls.clone(),
            grid: dungeon.grid.render_ascii().lines().map(str::to_string).collect(),
            partition: dungeon
                .partition
                .nodes()
                .iter()
                .map(|node| PartitionExport {
                    region: node.region,
                    depth: node.depth,
                    children: node.left.zip(node.right),
                    rooms: node.rooms.iter().map(|&id| room_index(id)).collect(),
                })
                .collect(),
        }
    }
}

/// Edges as room indices, so the export does not leak arena handles.
fn edges(graph: &Graph, room_index: &impl Fn(RoomId) -> usize) -> Vec<EdgeExport> {
    graph
        .edges()
        .into_iter()
        .filter_map(|edge| {
            let from = graph.node(edge.from)?.room;
            let to = graph.node(edge.to)?.room;
            Some(EdgeExport { from: room_index(from), to: room_index(to), weight: edge.weight })
        })
        .collect()
}

pub fn to_json(dungeon: &Dungeon) -> Result<String> {
    serde_json::to_string_pretty(&DungeonExport::from_dungeon(dungeon))
        .context("failed to serialize dungeon export")
}
