//! Hand-authored room layouts and how they ask to be placed.

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, GenerationResult};
use crate::types::{CellKind, Pos};

const FLOOR_MARK: char = 'F';
const PORTAL_MARK: char = 'P';

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Orbit a previously placed room, like procedural rooms do.
    #[default]
    Scatter,
    /// Exactly at `desired_x`/`desired_y`, without any overlap test.
    Fixed,
    /// Random angle at `radius` around `desired_x`/`desired_y`.
    Radius,
    /// Random angle around the room named by `related_room`.
    Relative,
}

/// One prefab declaration as it appears in configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefabConfig {
    pub name: String,
    /// Character grid: `F` floor, `P` portal, anything else empty.
    pub layout: String,
    pub required: bool,
    pub count: u32,
    pub mode: PlacementMode,
    pub desired_x: i32,
    pub desired_y: i32,
    pub radius: f64,
    pub related_room: Option<String>,
    /// Collision radius override; zero derives it from the layout size.
    pub room_radius: f64,
}

/// Parsed footprint of a prefab. Row `y` of the text is row `y` of the room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefabLayout {
    pub width: i32,
    pub height: i32,
    pub cells: Vec<CellKind>,
    /// Portal marks relative to the layout's top-left corner.
    pub portals: Vec<Pos>,
}

impl PrefabLayout {
    pub fn parse(name: &str, text: &str) -> GenerationResult<Self> {
        let mut rows: Vec<&str> = text.lines().map(|line| line.trim_end_matches('\r')).collect();
        while rows.last().is_some_and(|row| row.trim().is_empty()) {
            rows.pop();
        }
        if rows.is_empty() {
            return Err(GenerationError::malformed_prefab(name, "layout is empty"));
        }

        let width = rows[0].chars().count();
        if width == 0 {
            return Err(GenerationError::malformed_prefab(name, "first layout row is empty"));
        }
        if let Some((index, row)) =
            rows.iter().enumerate().find(|(_, row)| row.chars().count() != width)
        {
            return Err(GenerationError::malformed_prefab(
                name,
                format!("row {index} has {} columns, expected {width}", row.chars().count()),
            ));
        }

        let (Ok(width_cells), Ok(height_cells)) = (i32::try_from(width), i32::try_from(rows.len()))
        else {
            return Err(GenerationError::malformed_prefab(name, "layout is too large"));
        };

        let mut cells = Vec::with_capacity(width * rows.len());
        let mut portals = Vec::new();
        for (y, row) in (0_i32..).zip(&rows) {
            for (x, mark) in (0_i32..).zip(row.chars()) {
                cells.push(if mark == FLOOR_MARK { CellKind::Room } else { CellKind::Empty });
                if mark == PORTAL_MARK {
                    portals.push(Pos::new(x, y));
                }
            }
        }

        Ok(Self { width: width_cells, height: height_cells, cells, portals })
    }

    pub fn floor_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_occupied()).count()
    }
}

/// Where a prefab wants to go, with its parameters already checked.
#[derive(Clone, Debug, PartialEq)]
pub enum Placement {
    Scatter,
    Fixed(Pos),
    Radius { center: Pos, radius: f64 },
    /// `radius` of `None` orbits at the sum of both collision radii.
    Relative { room: String, radius: Option<f64> },
}

impl Placement {
    pub fn mode(&self) -> PlacementMode {
        match self {
            Self::Scatter => PlacementMode::Scatter,
            Self::Fixed(_) => PlacementMode::Fixed,
            Self::Radius { .. } => PlacementMode::Radius,
            Self::Relative { .. } => PlacementMode::Relative,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Prefab {
    pub name: String,
    pub layout: PrefabLayout,
    pub required: bool,
    pub count: u32,
    pub placement: Placement,
    pub room_radius: Option<f64>,
}

impl Prefab {
    pub fn from_config(config: &PrefabConfig) -> GenerationResult<Self> {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(GenerationError::malformed_prefab("<unnamed>", "prefab needs a name"));
        }
        let layout = PrefabLayout::parse(name, &config.layout)?;

        let placement = match config.mode {
            PlacementMode::Scatter => Placement::Scatter,
            PlacementMode::Fixed => Placement::Fixed(Pos::new(config.desired_x, config.desired_y)),
            PlacementMode::Radius => {
                if !(config.radius.is_finite() && config.radius > 0.0) {
                    return Err(GenerationError::malformed_prefab(
                        name,
                        "radius placement needs a positive radius",
                    ));
                }
                Placement::Radius {
                    center: Pos::new(config.desired_x, config.desired_y),
                    radius: config.radius,
                }
            }
            PlacementMode::Relative => {
                let Some(room) =
                    config.related_room.as_deref().map(str::trim).filter(|room| !room.is_empty())
                else {
                    return Err(GenerationError::malformed_prefab(
                        name,
                        "relative placement needs a related_room",
                    ));
                };
                if !(config.radius.is_finite() && config.radius >= 0.0) {
                    return Err(GenerationError::malformed_prefab(
                        name,
                        "relative placement radius must not be negative",
                    ));
                }
                Placement::Relative {
                    room: room.to_string(),
                    radius: (config.radius > 0.0).then_some(config.radius),
                }
            }
        };

        if !(config.room_radius.is_finite() && config.room_radius >= 0.0) {
            return Err(GenerationError::malformed_prefab(name, "room_radius must not be negative"));
        }

        Ok(Self {
            name: name.to_string(),
            layout,
            required: config.required,
            count: config.count,
            placement,
            room_radius: (config.room_radius > 0.0).then_some(config.room_radius),
        })
    }

    /// Copies placed before any procedural room; zero means one.
    pub fn copies(&self) -> u32 {
        self.count.max(1)
    }
}
