use crate::bsp::SpacePartition;
use crate::corridors::Corridor;
use crate::graph::Graph;
use crate::grid::Grid;
use crate::random::DungeonRng;
use crate::rooms::RoomSet;
use crate::walls::WallSegment;

/// Size of the normalised layout. Only ever grows during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutBounds {
    pub width: i32,
    pub height: i32,
}

impl LayoutBounds {
    pub fn include(&mut self, width: i32, height: i32) {
        self.width = self.width.max(width);
        self.height = self.height.max(height);
    }
}

/// Shared state of one run: the injected RNG plus one output slot per stage,
/// in pipeline order.
#[derive(Clone, Debug)]
pub struct GenerationContext {
    pub seed: u64,
    pub rng: DungeonRng,
    pub bounds: LayoutBounds,
    pub rooms: RoomSet,
    pub proximity: Graph,
    pub tree: Graph,
    pub corridors: Vec<Corridor>,
    pub grid: Grid,
    pub walls: Vec<WallSegment>,
    pub partition: SpacePartition,
}

impl GenerationContext {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: DungeonRng::seeded(seed),
            bounds: LayoutBounds::default(),
            rooms: RoomSet::default(),
            proximity: Graph::default(),
            tree: Graph::default(),
            corridors: Vec::new(),
            grid: Grid::default(),
            walls: Vec::new(),
            partition: SpacePartition::default(),
        }
    }
}
