pub mod bsp;
pub mod config;
pub mod corridors;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod grid;
pub mod model;
pub mod pipeline;
pub mod prefab;
pub mod random;
pub mod rooms;
pub mod seed;
pub mod types;
pub mod walls;

pub use config::{DungeonConfig, GenerationMode, GraphAlgorithm};
pub use error::{GenerationError, GenerationResult};
pub use model::{Dungeon, GenerationStats};
pub use pipeline::{
    DungeonGenerator, GenerationContext, GenerationStatus, PipelineStage, Stage, StageCursor,
    StageKind, StagePhase, Suspended, generate_dungeon,
};
pub use types::*;
