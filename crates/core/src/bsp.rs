//! Binary space partition over the finished layout, for spatial lookups.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::DungeonConfig;
use crate::error::GenerationResult;
use crate::pipeline::{GenerationContext, PipelineStage, StageCursor, StageKind, StepStatus};
use crate::random::DungeonRng;
use crate::rooms::RoomSet;
use crate::types::{Pos, Rect, RoomId};

/// Below this relative difference between width and height the split axis
/// is picked at random.
const SQUARE_TOLERANCE: f64 = 0.05;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BspNode {
    pub region: Rect,
    pub left: Option<usize>,
    pub right: Option<usize>,
    /// Rooms whose footprint overlaps `region`.
    pub rooms: Vec<RoomId>,
    pub depth: u32,
}

impl BspNode {
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Arena-backed tree; index 0 is the root once built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpacePartition {
    nodes: Vec<BspNode>,
    min_leaf_size: i32,
}

impl SpacePartition {
    pub fn new(region: Rect, rooms: &RoomSet, min_leaf_size: i32) -> Self {
        let rooms =
            rooms.iter().filter(|room| room.rect.overlaps(&region)).map(|room| room.id).collect();
        Self {
            nodes: vec![BspNode { region, left: None, right: None, rooms, depth: 0 }],
            min_leaf_size,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn min_leaf_size(&self) -> i32 {
        self.min_leaf_size
    }

    pub fn root(&self) -> Option<&BspNode> {
        self.nodes.first()
    }

    pub fn node(&self, index: usize) -> Option<&BspNode> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    pub fn leaves(&self) -> impl Iterator<Item = &BspNode> + '_ {
        self.nodes.iter().filter(|node| node.is_leaf())
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Index of the leaf whose region contains `pos`.
    pub fn leaf_at(&self, pos: Pos) -> Option<usize> {
        let mut index = 0;
        loop {
            let node = self.nodes.get(index)?;
            if !node.region.contains(pos) {
                return None;
            }
            let next = [node.left, node.right]
                .into_iter()
                .flatten()
                .find(|&child| {
                    self.nodes.get(child).is_some_and(|child| child.region.contains(pos))
                });
            match next {
                Some(child) => index = child,
                None => return Some(index),
            }
        }
    }

    /// Rooms recorded on the leaf containing `pos`.
    pub fn rooms_near(&self, pos: Pos) -> &[RoomId] {
        match self.leaf_at(pos).and_then(|index| self.nodes.get(index)) {
            Some(leaf) => &leaf.rooms,
            None => &[],
        }
    }

    /// Splits the node at `index` in half across its longer side. Returns the
    /// two children, or `None` when a half would not exceed the minimum leaf
    /// size.
    pub fn split(
        &mut self,
        index: usize,
        rooms: &RoomSet,
        rng: &mut DungeonRng,
    ) -> Option<(usize, usize)> {
        let node = self.nodes.get(index)?;
        if !node.is_leaf() {
            return None;
        }
        let region = node.region;
        let longest = region.width.max(region.height);
        if longest <= 0 {
            return None;
        }

        let difference = f64::from((region.width - region.height).abs()) / f64::from(longest);
        let split_rows = if difference < SQUARE_TOLERANCE {
            rng.chance_half()
        } else {
            region.height > region.width
        };
        let split = if split_rows { region.height / 2 } else { region.width / 2 };
        if split <= self.min_leaf_size {
            return None;
        }

        let (first, second) = if split_rows {
            (
                Rect::new(region.x, region.y, region.width, split),
                Rect::new(region.x, region.y + split, region.width, region.height - split),
            )
        } else {
            (
                Rect::new(region.x, region.y, split, region.height),
                Rect::new(region.x + split, region.y, region.width - split, region.height),
            )
        };

        let depth = node.depth + 1;
        let inherit = |child: Rect| -> Vec<RoomId> {
            node.rooms
                .iter()
                .copied()
                .filter(|&id| rooms.get(id).is_some_and(|room| room.rect.overlaps(&child)))
                .collect()
        };
        let first_rooms = inherit(first);
        let second_rooms = inherit(second);

        let left = self.nodes.len();
        let right = left + 1;
        self.nodes.push(BspNode {
            region: first,
            left: None,
            right: None,
            rooms: first_rooms,
            depth,
        });
        self.nodes.push(BspNode {
            region: second,
            left: None,
            right: None,
            rooms: second_rooms,
            depth,
        });
        self.nodes[index].left = Some(left);
        self.nodes[index].right = Some(right);
        Some((left, right))
    }
}

/// Splits one pending node per step, breadth first.
#[derive(Clone, Debug, Default)]
pub struct PartitionStage {
    min_leaf_size: i32,
    pending: VecDeque<usize>,
}

impl PipelineStage for PartitionStage {
    fn kind(&self) -> StageKind {
        StageKind::SpacePartition
    }

    fn clear(&mut self) {
        self.pending.clear();
    }

    fn load_data(&mut self, config: &DungeonConfig) -> GenerationResult<()> {
        self.min_leaf_size = config.bsp.min_leaf_size;
        Ok(())
    }

    fn pre_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        let region = Rect::new(0, 0, ctx.bounds.width, ctx.bounds.height);
        ctx.partition = SpacePartition::new(region, &ctx.rooms, self.min_leaf_size);
        self.pending = VecDeque::from([0]);
        Ok(())
    }

    fn step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<StepStatus> {
        if let Some(index) = self.pending.pop_front()
            && let Some((left, right)) = ctx.partition.split(index, &ctx.rooms, &mut ctx.rng)
        {
            self.pending.push_back(left);
            self.pending.push_back(right);
        }
        Ok(if self.pending.is_empty() { StepStatus::Done } else { StepStatus::Continue })
    }

    fn post_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        debug!(
            nodes = ctx.partition.len(),
            leaves = ctx.partition.leaf_count(),
            "space partition built"
        );
        Ok(())
    }

    fn cursor(&self, _ctx: &GenerationContext) -> StageCursor {
        StageCursor::Splits { pending: self.pending.len() }
    }
}
