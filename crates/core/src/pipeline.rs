//! Runs the stages in order, either straight through or one phase per tick.

mod context;
mod stage;

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{DungeonConfig, GenerationMode};
use crate::error::{GenerationError, GenerationResult};
use crate::model::{Dungeon, GenerationStats};
use crate::seed::resolve_seed;

pub use context::{GenerationContext, LayoutBounds};
pub use stage::{PipelineStage, Stage, StageCursor, StageKind, StagePhase, StepStatus};

/// Where a stepped run will resume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Suspended {
    pub stage: StageKind,
    pub next_phase: StagePhase,
    pub cursor: StageCursor,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GenerationStatus {
    InProgress(Suspended),
    Complete,
    Failed(GenerationError),
}

impl GenerationStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::InProgress(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
enum RunState {
    Pending { stage: usize, phase: StagePhase },
    Complete,
    Failed(GenerationError),
}

pub struct DungeonGenerator {
    config: DungeonConfig,
    stages: Vec<Stage>,
    ctx: GenerationContext,
    state: RunState,
    elapsed: Duration,
}

impl DungeonGenerator {
    pub fn new(config: DungeonConfig) -> GenerationResult<Self> {
        config.validate()?;
        let mut generator = Self {
            ctx: GenerationContext::new(config.general.seed),
            config,
            stages: Stage::pipeline(),
            state: RunState::Pending { stage: 0, phase: StagePhase::PreStep },
            elapsed: Duration::ZERO,
        };
        generator.reset()?;
        Ok(generator)
    }

    pub fn config(&self) -> &DungeonConfig {
        &self.config
    }

    /// Clears every stage, reloads the configuration and reseeds. A configured
    /// seed of zero picks a fresh seed on every reset.
    pub fn reset(&mut self) -> GenerationResult<()> {
        self.elapsed = Duration::ZERO;
        for stage in &mut self.stages {
            stage.clear();
            if let Err(err) = stage.load_data(&self.config) {
                self.state = RunState::Failed(err.clone());
                return Err(err);
            }
        }
        self.ctx = GenerationContext::new(resolve_seed(self.config.general.seed));
        self.state = RunState::Pending { stage: 0, phase: StagePhase::PreStep };
        Ok(())
    }

    pub fn reconfigure(&mut self, config: DungeonConfig) -> GenerationResult<()> {
        config.validate()?;
        self.config = config;
        self.reset()
    }

    /// Runs from scratch to completion in the configured mode.
    pub fn generate(&mut self) -> GenerationResult<Dungeon> {
        match self.config.general.mode {
            GenerationMode::Direct => self.generate_direct()?,
            GenerationMode::Stepped => {
                self.reset()?;
                loop {
                    match self.generate_step() {
                        GenerationStatus::InProgress(_) => {}
                        GenerationStatus::Complete => break,
                        GenerationStatus::Failed(err) => return Err(err),
                    }
                }
            }
        }
        Ok(self.snapshot())
    }

    /// Resets, then runs every stage to completion in turn.
    pub fn generate_direct(&mut self) -> GenerationResult<()> {
        self.reset()?;
        self.log_start(GenerationMode::Direct);
        let started = Instant::now();
        let mut outcome = Ok(());
        for stage in &mut self.stages {
            debug!(stage = %stage.kind(), "running stage");
            if let Err(err) = stage.run(&mut self.ctx) {
                outcome = Err(err);
                break;
            }
        }
        self.elapsed = started.elapsed();
        match outcome {
            Ok(()) => {
                self.state = RunState::Complete;
                self.log_complete();
                Ok(())
            }
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Advances exactly one phase of the current stage. Once the run has
    /// completed or failed, further calls report the same outcome until the
    /// next reset.
    pub fn generate_step(&mut self) -> GenerationStatus {
        let RunState::Pending { stage, phase } = self.state else {
            return self.status();
        };
        if stage == 0 && phase == StagePhase::PreStep {
            self.log_start(GenerationMode::Stepped);
        }

        let started = Instant::now();
        let outcome = self.advance(stage, phase);
        self.elapsed += started.elapsed();

        match outcome {
            Ok(RunState::Complete) => {
                self.state = RunState::Complete;
                self.log_complete();
            }
            Ok(next) => self.state = next,
            Err(err) => self.fail(err),
        }
        self.status()
    }

    fn advance(&mut self, index: usize, phase: StagePhase) -> GenerationResult<RunState> {
        let count = self.stages.len();
        let Some(stage) = self.stages.get_mut(index) else {
            return Ok(RunState::Complete);
        };
        let next = match phase {
            StagePhase::PreStep => {
                debug!(stage = %stage.kind(), "stage starting");
                stage.pre_step(&mut self.ctx)?;
                RunState::Pending { stage: index, phase: StagePhase::Step }
            }
            StagePhase::Step => match stage.step(&mut self.ctx)? {
                StepStatus::Continue => RunState::Pending { stage: index, phase: StagePhase::Step },
                StepStatus::Done => RunState::Pending { stage: index, phase: StagePhase::PostStep },
            },
            StagePhase::PostStep => {
                stage.post_step(&mut self.ctx)?;
                debug!(stage = %stage.kind(), "stage finished");
                if index + 1 < count {
                    RunState::Pending { stage: index + 1, phase: StagePhase::PreStep }
                } else {
                    RunState::Complete
                }
            }
        };
        Ok(next)
    }

    pub fn status(&self) -> GenerationStatus {
        match &self.state {
            RunState::Pending { stage, phase } => {
                GenerationStatus::InProgress(self.suspension(*stage, *phase))
            }
            RunState::Complete => GenerationStatus::Complete,
            RunState::Failed(err) => GenerationStatus::Failed(err.clone()),
        }
    }

    pub fn suspended(&self) -> Option<Suspended> {
        match self.state {
            RunState::Pending { stage, phase } => Some(self.suspension(stage, phase)),
            _ => None,
        }
    }

    fn suspension(&self, index: usize, phase: StagePhase) -> Suspended {
        match self.stages.get(index) {
            Some(stage) => {
                let cursor = if phase == StagePhase::PreStep {
                    StageCursor::Idle
                } else {
                    stage.cursor(&self.ctx)
                };
                Suspended { stage: stage.kind(), next_phase: phase, cursor }
            }
            None => Suspended {
                stage: StageKind::SpacePartition,
                next_phase: StagePhase::PostStep,
                cursor: StageCursor::Idle,
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == RunState::Complete
    }

    /// Time spent inside stages since the last reset.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    pub fn seed(&self) -> u64 {
        self.ctx.seed
    }

    pub fn stats(&self) -> GenerationStats {
        GenerationStats::collect(&self.ctx, self.elapsed_ms())
    }

    /// Snapshot of the finished run, or `None` while it is still pending or
    /// after it failed.
    pub fn dungeon(&self) -> Option<Dungeon> {
        self.is_complete().then(|| self.snapshot())
    }

    /// Live view of the run so far, for drawing partial results.
    pub fn context(&self) -> &GenerationContext {
        &self.ctx
    }

    fn snapshot(&self) -> Dungeon {
        Dungeon::from_context(&self.ctx, self.elapsed_ms())
    }

    fn fail(&mut self, err: GenerationError) {
        warn!(seed = self.ctx.seed, error = %err, "dungeon generation failed");
        self.state = RunState::Failed(err);
    }

    fn log_start(&self, mode: GenerationMode) {
        info!(
            seed = self.ctx.seed,
            ?mode,
            graph = %self.config.general.graph,
            rooms = self.config.rooms.amount,
            "dungeon generation started"
        );
    }

    fn log_complete(&self) {
        info!(
            seed = self.ctx.seed,
            elapsed_ms = self.elapsed_ms(),
            rooms = self.ctx.rooms.len(),
            corridors = self.ctx.corridors.len(),
            walls = self.ctx.walls.len(),
            "dungeon generation complete"
        );
    }
}

/// Validates `config` and runs it to completion.
pub fn generate_dungeon(config: DungeonConfig) -> GenerationResult<Dungeon> {
    DungeonGenerator::new(config)?.generate()
}
