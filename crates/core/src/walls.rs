//! Unit wall segments along every occupied cell's exposed sides.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DungeonConfig;
use crate::error::GenerationResult;
use crate::grid::Grid;
use crate::pipeline::{GenerationContext, PipelineStage, StageCursor, StageKind, StepStatus};
use crate::types::Pos;

/// Axis-aligned unit line on cell-corner coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallSegment {
    pub start: Pos,
    pub end: Pos,
}

/// Walls for one grid column, checking north, south, west then east.
pub fn column_walls(grid: &Grid, x: i32, walls: &mut Vec<WallSegment>) {
    for y in 0..grid.height() {
        let cell = Pos::new(x, y);
        if !grid.get(cell).is_occupied() {
            continue;
        }
        let sides = [
            (cell.offset(0, -1), Pos::new(x, y), Pos::new(x + 1, y)),
            (cell.offset(0, 1), Pos::new(x, y + 1), Pos::new(x + 1, y + 1)),
            (cell.offset(-1, 0), Pos::new(x, y), Pos::new(x, y + 1)),
            (cell.offset(1, 0), Pos::new(x + 1, y), Pos::new(x + 1, y + 1)),
        ];
        for (neighbor, start, end) in sides {
            if !grid.get(neighbor).is_occupied() {
                walls.push(WallSegment { start, end });
            }
        }
    }
}

pub fn extract_walls(grid: &Grid) -> Vec<WallSegment> {
    let mut walls = Vec::new();
    for x in 0..grid.width() {
        column_walls(grid, x, &mut walls);
    }
    walls
}

#[derive(Clone, Debug, Default)]
pub struct WallStage {
    column: i32,
}

impl PipelineStage for WallStage {
    fn kind(&self) -> StageKind {
        StageKind::Walls
    }

    fn clear(&mut self) {
        self.column = 0;
    }

    fn load_data(&mut self, _config: &DungeonConfig) -> GenerationResult<()> {
        Ok(())
    }

    fn pre_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        ctx.walls.clear();
        self.column = 0;
        Ok(())
    }

    fn step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<StepStatus> {
        if self.column < ctx.grid.width() {
            column_walls(&ctx.grid, self.column, &mut ctx.walls);
            self.column += 1;
        }
        Ok(if self.column >= ctx.grid.width() { StepStatus::Done } else { StepStatus::Continue })
    }

    fn post_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        debug!(segments = ctx.walls.len(), "walls extracted");
        Ok(())
    }

    fn cursor(&self, _ctx: &GenerationContext) -> StageCursor {
        StageCursor::Columns { column: self.column }
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{CellKind, Rect};
    use super::*;

    #[test]
    fn isolated_three_by_three_room_has_twelve_walls() {
        let mut grid = Grid::new(5, 5);
        grid.upgrade_rect(Rect::new(1, 1, 3, 3), CellKind::Room);
        assert_eq!(extract_walls(&grid).len(), 12);
    }

    #[test]
    fn cells_on_the_grid_edge_are_walled_on_the_outside() {
        let mut grid = Grid::new(1, 1);
        grid.upgrade(Pos::new(0, 0), CellKind::Room);
        let walls = extract_walls(&grid);
        assert_eq!(
            walls,
            vec![
                WallSegment { start: Pos::new(0, 0), end: Pos::new(1, 0) },
                WallSegment { start: Pos::new(0, 1), end: Pos::new(1, 1) },
                WallSegment { start: Pos::new(0, 0), end: Pos::new(0, 1) },
                WallSegment { start: Pos::new(1, 0), end: Pos::new(1, 1) },
            ]
        );
    }

    #[test]
    fn corridor_touching_a_room_removes_the_shared_side() {
        let mut grid = Grid::new(6, 3);
        grid.upgrade_rect(Rect::new(0, 0, 3, 3), CellKind::Room);
        grid.upgrade_rect(Rect::new(3, 1, 3, 1), CellKind::Corridor);
        // 12 for the room, 8 for the corridor, minus the shared edge counted on both sides.
        assert_eq!(extract_walls(&grid).len(), 12 + 8 - 2);
    }
}
