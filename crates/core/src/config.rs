//! Typed generation settings. Parsing them from disk belongs to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, GenerationResult};
use crate::prefab::{Prefab, PrefabConfig};

pub const DEFAULT_START: i32 = 60;
pub const DEFAULT_MAX_SIZE_ATTEMPTS: u32 = 1_000;
pub const DEFAULT_MAX_PLACEMENT_ATTEMPTS: u32 = 5_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Every stage runs to completion inside one call.
    #[default]
    Direct,
    /// One lifecycle phase per external tick.
    Stepped,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphAlgorithm {
    #[default]
    Gabriel,
    Delaunay,
    RelativeNeighborhood,
}

impl fmt::Display for GraphAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gabriel => "gabriel",
            Self::Delaunay => "delaunay",
            Self::RelativeNeighborhood => "relative_neighborhood",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Zero picks a fresh seed on every reset.
    pub seed: u64,
    pub mode: GenerationMode,
    pub graph: GraphAlgorithm,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub amount: u32,
    pub mult_area: f64,
    pub min_area: i32,
    pub max_area: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    /// Lower bound on shorter side / longer side.
    pub min_ratio: f64,
    pub max_ratio: f64,
    pub start_x: i32,
    pub start_y: i32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            amount: 20,
            mult_area: 10.0,
            min_area: 4,
            max_area: 30,
            min_width: 2,
            min_height: 2,
            max_width: 10,
            max_height: 10,
            min_ratio: 0.5,
            max_ratio: 1.0,
            start_x: DEFAULT_START,
            start_y: DEFAULT_START,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub spacing_x: f64,
    pub spacing_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { spacing_x: 1.0, spacing_y: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorConfig {
    pub width: i32,
    /// Percentage of corridors traced with Bresenham; the rest are L-shaped.
    pub algorithm_ratio: i32,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self { width: 1, algorithm_ratio: 30 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BspConfig {
    pub min_leaf_size: i32,
}

impl Default for BspConfig {
    fn default() -> Self {
        Self { min_leaf_size: 10 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Area samples tried per procedural room before giving up.
    pub max_size_attempts: u32,
    /// Candidate positions tried per room before giving up.
    pub max_placement_attempts: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_size_attempts: DEFAULT_MAX_SIZE_ATTEMPTS,
            max_placement_attempts: DEFAULT_MAX_PLACEMENT_ATTEMPTS,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    pub general: GeneralConfig,
    pub rooms: RoomConfig,
    pub layout: LayoutConfig,
    pub corridors: CorridorConfig,
    pub bsp: BspConfig,
    pub limits: LimitsConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prefabs: Vec<PrefabConfig>,
}

impl DungeonConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.general.seed = seed;
        self
    }

    /// Rejects settings no run could ever satisfy. Prefab declarations are
    /// parsed here too, so a broken layout fails before generation starts.
    pub fn validate(&self) -> GenerationResult<()> {
        let rooms = &self.rooms;
        ensure(rooms.min_area >= 1, "rooms.min_area must be at least 1")?;
        ensure(rooms.min_area <= rooms.max_area, "rooms.min_area exceeds rooms.max_area")?;
        ensure(
            rooms.min_width >= 1 && rooms.min_height >= 1,
            "rooms.min_width and rooms.min_height must be at least 1",
        )?;
        ensure(rooms.min_width <= rooms.max_width, "rooms.min_width exceeds rooms.max_width")?;
        ensure(rooms.min_height <= rooms.max_height, "rooms.min_height exceeds rooms.max_height")?;
        ensure(
            i64::from(rooms.min_width) * i64::from(rooms.min_height) <= i64::from(rooms.max_area),
            "the smallest allowed room is larger than rooms.max_area",
        )?;
        ensure(
            i64::from(rooms.max_width) * i64::from(rooms.max_height) >= i64::from(rooms.min_area),
            "the largest allowed room is smaller than rooms.min_area",
        )?;
        ensure(
            rooms.mult_area.is_finite() && rooms.mult_area > 0.0,
            "rooms.mult_area must be positive",
        )?;
        ensure(
            rooms.min_ratio > 0.0 && rooms.min_ratio <= 1.0,
            "rooms.min_ratio must lie in (0, 1]",
        )?;
        ensure(
            rooms.max_ratio > 0.0 && rooms.max_ratio <= 1.0,
            "rooms.max_ratio must lie in (0, 1]",
        )?;
        ensure(rooms.min_ratio <= rooms.max_ratio, "rooms.min_ratio exceeds rooms.max_ratio")?;

        let layout = &self.layout;
        ensure(
            layout.spacing_x.is_finite()
                && layout.spacing_x > 0.0
                && layout.spacing_y.is_finite()
                && layout.spacing_y > 0.0,
            "layout spacing must be positive",
        )?;

        ensure(self.corridors.width >= 1, "corridors.width must be at least 1")?;
        ensure(
            (0..=100).contains(&self.corridors.algorithm_ratio),
            "corridors.algorithm_ratio must lie in 0..=100",
        )?;
        ensure(self.bsp.min_leaf_size >= 1, "bsp.min_leaf_size must be at least 1")?;
        ensure(
            self.limits.max_size_attempts >= 1 && self.limits.max_placement_attempts >= 1,
            "limits must allow at least one attempt",
        )?;

        self.load_prefabs().map(|_| ())
    }

    pub fn load_prefabs(&self) -> GenerationResult<Vec<Prefab>> {
        self.prefabs.iter().map(Prefab::from_config).collect()
    }
}

fn ensure(condition: bool, reason: &str) -> GenerationResult<()> {
    if condition { Ok(()) } else { Err(GenerationError::configuration(reason)) }
}
