//! Failure categories for a generation run.

use thiserror::Error;

use crate::pipeline::StageKind;

/// Every way a run can end without producing a dungeon.
///
/// Out-of-range grid access is deliberately absent: those writes are dropped
/// silently by the grid itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// The configuration can never be satisfied (bad ranges, impossible ratios).
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    /// Input geometry the proximity builders cannot work with, such as every
    /// room centre lying on one line.
    #[error("degenerate geometry in {stage}: {reason}")]
    DegenerateGeometry { stage: StageKind, reason: String },

    /// A prefab layout or its placement parameters are unusable.
    #[error("malformed prefab '{name}': {reason}")]
    MalformedPrefab { name: String, reason: String },

    /// No free spot was found for a room within the retry cap.
    #[error("could not place room '{room}' after {attempts} attempts")]
    PlacementExhausted { room: String, attempts: u32 },
}

impl GenerationError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration { reason: reason.into() }
    }

    pub fn malformed_prefab(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPrefab { name: name.into(), reason: reason.into() }
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;
