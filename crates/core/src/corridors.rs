//! One corridor per spanning-tree edge, routed between the closest portals.

mod routing;

use std::collections::BTreeSet;
use std::slice;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DungeonConfig;
use crate::error::GenerationResult;
use crate::geometry::distance;
use crate::pipeline::{GenerationContext, PipelineStage, StageCursor, StageKind, StepStatus};
use crate::rooms::Room;
use crate::types::{NodeId, Pos, Rect, RoomId};

pub use routing::{Route, Segment, bresenham, l_shape};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorridorStyle {
    LShape,
    Bresenham,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Corridor {
    pub from: NodeId,
    pub to: NodeId,
    pub from_room: RoomId,
    pub to_room: RoomId,
    pub start: Pos,
    pub end: Pos,
    pub style: CorridorStyle,
    pub segments: Vec<Segment>,
    pub blocks: Vec<Rect>,
}

impl Corridor {
    /// Every cell claimed by a block; cells shared by blocks repeat.
    pub fn cells(&self) -> impl Iterator<Item = Pos> + '_ {
        self.blocks.iter().flat_map(|block| block.cells())
    }
}

/// Closest portal pair by straight distance; the first pair wins ties.
/// Rooms without portals use their centre.
fn closest_portals(from: &Room, to: &Room) -> (Pos, Pos) {
    let from_portals: &[Pos] =
        if from.portals.is_empty() { slice::from_ref(&from.center) } else { &from.portals };
    let to_portals: &[Pos] =
        if to.portals.is_empty() { slice::from_ref(&to.center) } else { &to.portals };

    let mut best = (from.center, to.center);
    let mut best_gap = f64::INFINITY;
    for &start in from_portals {
        for &end in to_portals {
            let gap = distance(start, end);
            if gap < best_gap {
                best = (start, end);
                best_gap = gap;
            }
        }
    }
    best
}

#[derive(Clone, Debug, Default)]
pub struct CorridorStage {
    width: i32,
    algorithm_ratio: i32,
    primary: usize,
    emitted: BTreeSet<(usize, usize)>,
}

impl CorridorStage {
    fn connect(&self, ctx: &mut GenerationContext, from: NodeId, to: NodeId) -> Option<Corridor> {
        let from_room = ctx.tree.node(from)?.room;
        let to_room = ctx.tree.node(to)?.room;
        let (Some(first), Some(second)) = (ctx.rooms.get(from_room), ctx.rooms.get(to_room)) else {
            return None;
        };
        for room in [first, second] {
            if room.portals.is_empty() {
                warn!(room = %room.label(), "room has no portals, routing from its centre");
            }
        }

        let (start, end) = closest_portals(first, second);
        let style = if ctx.rng.percent() >= self.algorithm_ratio {
            CorridorStyle::LShape
        } else {
            CorridorStyle::Bresenham
        };
        let Route { segments, blocks } = match style {
            CorridorStyle::LShape => l_shape(start, end, self.width),
            CorridorStyle::Bresenham => bresenham(start, end, self.width),
        };

        Some(Corridor { from, to, from_room, to_room, start, end, style, segments, blocks })
    }
}

impl PipelineStage for CorridorStage {
    fn kind(&self) -> StageKind {
        StageKind::Corridors
    }

    fn clear(&mut self) {
        self.primary = 0;
        self.emitted.clear();
    }

    fn load_data(&mut self, config: &DungeonConfig) -> GenerationResult<()> {
        self.width = config.corridors.width;
        self.algorithm_ratio = config.corridors.algorithm_ratio;
        Ok(())
    }

    fn pre_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        ctx.corridors.clear();
        self.primary = 0;
        self.emitted.clear();
        Ok(())
    }

    fn step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<StepStatus> {
        let Some(&node) = ctx.tree.node_ids().get(self.primary) else {
            return Ok(StepStatus::Done);
        };
        let neighbors: Vec<NodeId> =
            ctx.tree.neighbors(node).iter().map(|neighbor| neighbor.node).collect();

        for neighbor in neighbors {
            let (Some(a), Some(b)) = (ctx.tree.node(node), ctx.tree.node(neighbor)) else {
                continue;
            };
            let pair = (a.index.min(b.index), a.index.max(b.index));
            if !self.emitted.insert(pair) {
                continue;
            }
            if let Some(corridor) = self.connect(ctx, node, neighbor) {
                ctx.corridors.push(corridor);
            }
        }

        self.primary += 1;
        Ok(if self.primary >= ctx.tree.len() { StepStatus::Done } else { StepStatus::Continue })
    }

    fn post_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        for block in ctx.corridors.iter().flat_map(|corridor| &corridor.blocks) {
            ctx.bounds.include(block.right(), block.bottom());
        }
        debug!(
            corridors = ctx.corridors.len(),
            blocks = ctx.corridors.iter().map(|corridor| corridor.blocks.len()).sum::<usize>(),
            width = ctx.bounds.width,
            height = ctx.bounds.height,
            "corridors routed"
        );
        Ok(())
    }

    fn cursor(&self, _ctx: &GenerationContext) -> StageCursor {
        StageCursor::Nodes { primary: self.primary }
    }
}

#[cfg(test)]
mod tests {
    use crate::pipeline::Stage;
    use crate::rooms::test_support::rooms_at;
    use super::*;

    #[test]
    fn closest_portals_picks_the_nearest_pair() {
        let mut rooms = rooms_at(&[(0, 0), (20, 0)]);
        rooms[0].portals = vec![Pos::new(-2, 0), Pos::new(3, 0)];
        rooms[1].portals = vec![Pos::new(17, 0), Pos::new(23, 0)];
        assert_eq!(closest_portals(&rooms[0], &rooms[1]), (Pos::new(3, 0), Pos::new(17, 0)));
    }

    #[test]
    fn rooms_without_portals_route_from_their_centres() {
        let mut rooms = rooms_at(&[(1, 1), (9, 4)]);
        rooms[0].portals.clear();
        rooms[1].portals.clear();
        assert_eq!(closest_portals(&rooms[0], &rooms[1]), (Pos::new(1, 1), Pos::new(9, 4)));
    }

    #[test]
    fn each_tree_edge_gets_exactly_one_corridor() {
        let config = DungeonConfig::default().with_seed(99);
        let mut ctx = GenerationContext::new(99);
        for mut stage in Stage::pipeline().into_iter().take(3) {
            stage.load_data(&config).expect("config loads");
            stage.run(&mut ctx).expect("stage runs");
        }

        let mut stage = CorridorStage::default();
        stage.load_data(&config).expect("config loads");
        stage.run(&mut ctx).expect("corridors route");

        assert_eq!(ctx.corridors.len(), ctx.tree.edge_count());
        let pairs: BTreeSet<(RoomId, RoomId)> = ctx
            .corridors
            .iter()
            .map(|corridor| {
                (corridor.from_room.min(corridor.to_room), corridor.from_room.max(corridor.to_room))
            })
            .collect();
        assert_eq!(pairs.len(), ctx.corridors.len(), "a room pair was connected twice");
    }
}
