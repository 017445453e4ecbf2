//! Stage that builds the proximity graph with the configured predicate.

use tracing::debug;

use crate::config::{DungeonConfig, GraphAlgorithm};
use crate::error::GenerationResult;
use crate::pipeline::{GenerationContext, PipelineStage, StageCursor, StageKind, StepStatus};
use crate::rooms::Room;

use super::{delaunay, gabriel, relative_neighborhood};

/// Pair-based builders advance one primary room per step; the triangle
/// builder advances one `(primary, secondary)` pair per step.
#[derive(Clone, Debug, Default)]
pub struct ProximityStage {
    algorithm: GraphAlgorithm,
    primary: usize,
    secondary: usize,
}

impl ProximityStage {
    pub fn algorithm(&self) -> GraphAlgorithm {
        self.algorithm
    }

    fn pair_step(&mut self, ctx: &mut GenerationContext) -> StepStatus {
        let rooms: Vec<&Room> = ctx.rooms.iter().collect();
        if self.primary + 1 >= rooms.len() {
            return StepStatus::Done;
        }
        match self.algorithm {
            GraphAlgorithm::RelativeNeighborhood => {
                relative_neighborhood::connect_primary(&rooms, &mut ctx.proximity, self.primary);
            }
            _ => gabriel::connect_primary(&rooms, &mut ctx.proximity, self.primary),
        }
        self.primary += 1;
        if self.primary + 1 >= rooms.len() { StepStatus::Done } else { StepStatus::Continue }
    }

    fn triangle_step(&mut self, ctx: &mut GenerationContext) -> StepStatus {
        let rooms: Vec<&Room> = ctx.rooms.iter().collect();
        let count = rooms.len();
        if count < 3 || self.primary + 3 > count {
            return StepStatus::Done;
        }
        delaunay::connect_pair(&rooms, &mut ctx.proximity, self.primary, self.secondary);

        self.secondary += 1;
        if self.secondary + 2 > count {
            self.primary += 1;
            self.secondary = self.primary + 1;
        }
        if self.primary + 3 > count { StepStatus::Done } else { StepStatus::Continue }
    }
}

impl PipelineStage for ProximityStage {
    fn kind(&self) -> StageKind {
        StageKind::ProximityGraph
    }

    fn clear(&mut self) {
        self.primary = 0;
        self.secondary = 1;
    }

    fn load_data(&mut self, config: &DungeonConfig) -> GenerationResult<()> {
        self.algorithm = config.general.graph;
        Ok(())
    }

    fn pre_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        ctx.proximity.clear();
        self.primary = 0;
        self.secondary = 1;
        if self.algorithm == GraphAlgorithm::Delaunay {
            let rooms: Vec<&Room> = ctx.rooms.iter().collect();
            delaunay::check_geometry(&rooms)?;
        }
        Ok(())
    }

    fn step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<StepStatus> {
        Ok(match self.algorithm {
            GraphAlgorithm::Delaunay => self.triangle_step(ctx),
            GraphAlgorithm::Gabriel | GraphAlgorithm::RelativeNeighborhood => self.pair_step(ctx),
        })
    }

    fn post_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        if self.algorithm == GraphAlgorithm::Delaunay {
            let rooms: Vec<&Room> = ctx.rooms.iter().collect();
            let repaired = delaunay::connect_isolated(&rooms, &mut ctx.proximity);
            if repaired > 0 {
                debug!(repaired, "linked isolated rooms to their nearest neighbours");
            }
        }
        ctx.proximity.mark_built(self.algorithm);
        debug!(
            algorithm = %self.algorithm,
            nodes = ctx.proximity.len(),
            edges = ctx.proximity.edge_count(),
            "proximity graph built"
        );
        Ok(())
    }

    fn cursor(&self, _ctx: &GenerationContext) -> StageCursor {
        match self.algorithm {
            GraphAlgorithm::Delaunay => {
                StageCursor::Triples { primary: self.primary, secondary: self.secondary }
            }
            GraphAlgorithm::Gabriel | GraphAlgorithm::RelativeNeighborhood => {
                StageCursor::Pairs { primary: self.primary }
            }
        }
    }
}
