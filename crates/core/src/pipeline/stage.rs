//! The lifecycle every generation stage implements, and the tagged stage list.

use std::fmt;

use serde::Serialize;

use crate::bsp::PartitionStage;
use crate::config::DungeonConfig;
use crate::corridors::CorridorStage;
use crate::error::GenerationResult;
use crate::graph::{ProximityStage, SpanningTreeStage};
use crate::grid::GridStage;
use crate::rooms::RoomStage;
use crate::walls::WallStage;

use super::GenerationContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Rooms,
    ProximityGraph,
    SpanningTree,
    Corridors,
    Grid,
    Walls,
    SpacePartition,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rooms => "rooms",
            Self::ProximityGraph => "proximity graph",
            Self::SpanningTree => "spanning tree",
            Self::Corridors => "corridors",
            Self::Grid => "grid",
            Self::Walls => "walls",
            Self::SpacePartition => "space partition",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    PreStep,
    Step,
    PostStep,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    Continue,
    Done,
}

/// Where a stage will pick up on its next step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageCursor {
    #[default]
    Idle,
    Rooms { placed: usize, pending_prefabs: usize },
    Pairs { primary: usize },
    Triples { primary: usize, secondary: usize },
    Tree { edges: usize, target: usize },
    Nodes { primary: usize },
    Sources { rooms: usize, corridors: usize },
    Columns { column: i32 },
    Splits { pending: usize },
}

/// A resumable unit of the pipeline.
///
/// All progress lives on the stage itself so that `step` can be called once
/// per tick without holding anything on the call stack. A stage reads the
/// context slots of earlier stages and writes only its own.
pub trait PipelineStage {
    fn kind(&self) -> StageKind;

    /// Drops per-run state. Configuration is reloaded by `load_data`.
    fn clear(&mut self);

    fn load_data(&mut self, config: &DungeonConfig) -> GenerationResult<()>;

    fn pre_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()>;

    fn step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<StepStatus>;

    fn post_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()>;

    fn cursor(&self, ctx: &GenerationContext) -> StageCursor;

    /// Runs the whole stage. Goes through the same phases as stepped
    /// execution, so both produce identical output.
    fn run(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        self.pre_step(ctx)?;
        while self.step(ctx)? == StepStatus::Continue {}
        self.post_step(ctx)
    }
}

#[derive(Clone, Debug)]
pub enum Stage {
    Rooms(RoomStage),
    ProximityGraph(ProximityStage),
    SpanningTree(SpanningTreeStage),
    Corridors(CorridorStage),
    Grid(GridStage),
    Walls(WallStage),
    SpacePartition(PartitionStage),
}

impl Stage {
    /// Every stage, in execution order.
    pub fn pipeline() -> Vec<Stage> {
        vec![
            Stage::Rooms(RoomStage::default()),
            Stage::ProximityGraph(ProximityStage::default()),
            Stage::SpanningTree(SpanningTreeStage::default()),
            Stage::Corridors(CorridorStage::default()),
            Stage::Grid(GridStage::default()),
            Stage::Walls(WallStage::default()),
            Stage::SpacePartition(PartitionStage::default()),
        ]
    }

    fn inner(&self) -> &dyn PipelineStage {
        match self {
            Stage::Rooms(stage) => stage,
            Stage::ProximityGraph(stage) => stage,
            Stage::SpanningTree(stage) => stage,
            Stage::Corridors(stage) => stage,
            Stage::Grid(stage) => stage,
            Stage::Walls(stage) => stage,
            Stage::SpacePartition(stage) => stage,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn PipelineStage {
        match self {
            Stage::Rooms(stage) => stage,
            Stage::ProximityGraph(stage) => stage,
            Stage::SpanningTree(stage) => stage,
            Stage::Corridors(stage) => stage,
            Stage::Grid(stage) => stage,
            Stage::Walls(stage) => stage,
            Stage::SpacePartition(stage) => stage,
        }
    }
}

impl PipelineStage for Stage {
    fn kind(&self) -> StageKind {
        self.inner().kind()
    }

    fn clear(&mut self) {
        self.inner_mut().clear();
    }

    fn load_data(&mut self, config: &DungeonConfig) -> GenerationResult<()> {
        self.inner_mut().load_data(config)
    }

    fn pre_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        self.inner_mut().pre_step(ctx)
    }

    fn step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<StepStatus> {
        self.inner_mut().step(ctx)
    }

    fn post_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        self.inner_mut().post_step(ctx)
    }

    fn cursor(&self, ctx: &GenerationContext) -> StageCursor {
        self.inner().cursor(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_runs_stages_in_data_order() {
        let kinds: Vec<StageKind> = Stage::pipeline().iter().map(PipelineStage::kind).collect();
        assert_eq!(
            kinds,
            vec![
                StageKind::Rooms,
                StageKind::ProximityGraph,
                StageKind::SpanningTree,
                StageKind::Corridors,
                StageKind::Grid,
                StageKind::Walls,
                StageKind::SpacePartition,
            ]
        );
    }

    #[test]
    fn stages_are_usable_as_trait_objects() {
        let mut stages = Stage::pipeline();
        let dynamic: Vec<&mut dyn PipelineStage> =
            stages.iter_mut().map(|stage| stage as &mut dyn PipelineStage).collect();
        assert_eq!(dynamic.len(), 7);
    }
}
