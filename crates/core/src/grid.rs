//! Occupancy grid merged from room footprints and corridor blocks.

use tracing::debug;

use crate::config::DungeonConfig;
use crate::error::GenerationResult;
use crate::pipeline::{GenerationContext, PipelineStage, StageCursor, StageKind, StepStatus};
use crate::types::{CellKind, Pos, Rect};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<CellKind>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self { width, height, cells: vec![CellKind::Empty; width as usize * height as usize] }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cells(&self) -> &[CellKind] {
        &self.cells
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.in_bounds(pos).then(|| pos.y as usize * self.width as usize + pos.x as usize)
    }

    /// Out-of-range reads see an empty cell.
    pub fn get(&self, pos: Pos) -> CellKind {
        self.index(pos).map_or(CellKind::Empty, |index| self.cells[index])
    }

    /// Raises the cell to `kind` if that outranks its current kind.
    /// Out-of-range writes are dropped.
    pub fn upgrade(&mut self, pos: Pos, kind: CellKind) {
        if let Some(index) = self.index(pos) {
            let cell = &mut self.cells[index];
            if kind > *cell {
                *cell = kind;
            }
        }
    }

    pub fn upgrade_rect(&mut self, rect: Rect, kind: CellKind) {
        for pos in rect.cells() {
            self.upgrade(pos, kind);
        }
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|&&cell| cell == kind).count()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_occupied()).count()
    }

    /// `#` room, `.` corridor, space empty; one line per row.
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for row in self.cells.chunks(self.width.max(1) as usize) {
            for cell in row {
                out.push(match cell {
                    CellKind::Room => '#',
                    CellKind::Corridor => '.',
                    CellKind::Empty => ' ',
                });
            }
            out.push('\n');
        }
        out
    }
}

/// Writes one room or one corridor per step, rooms first.
#[derive(Clone, Debug, Default)]
pub struct GridStage {
    rooms_written: usize,
    corridors_written: usize,
}

impl PipelineStage for GridStage {
    fn kind(&self) -> StageKind {
        StageKind::Grid
    }

    fn clear(&mut self) {
        self.rooms_written = 0;
        self.corridors_written = 0;
    }

    fn load_data(&mut self, _config: &DungeonConfig) -> GenerationResult<()> {
        Ok(())
    }

    fn pre_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        ctx.grid = Grid::new(ctx.bounds.width, ctx.bounds.height);
        self.clear();
        Ok(())
    }

    fn step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<StepStatus> {
        if let Some(room) = ctx.rooms.by_index(self.rooms_written) {
            for pos in room.floor_cells() {
                ctx.grid.upgrade(pos, CellKind::Room);
            }
            self.rooms_written += 1;
        } else if let Some(corridor) = ctx.corridors.get(self.corridors_written) {
            for &block in &corridor.blocks {
                ctx.grid.upgrade_rect(block, CellKind::Corridor);
            }
            self.corridors_written += 1;
        }

        let finished = self.rooms_written >= ctx.rooms.len()
            && self.corridors_written >= ctx.corridors.len();
        Ok(if finished { StepStatus::Done } else { StepStatus::Continue })
    }

    fn post_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        debug!(
            width = ctx.grid.width(),
            height = ctx.grid.height(),
            rooms = ctx.grid.count(CellKind::Room),
            corridors = ctx.grid.count(CellKind::Corridor),
            "grid rasterised"
        );
        Ok(())
    }

    fn cursor(&self, _ctx: &GenerationContext) -> StageCursor {
        StageCursor::Sources { rooms: self.rooms_written, corridors: self.corridors_written }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooms_are_never_downgraded_by_corridors() {
        let mut grid = Grid::new(4, 4);
        grid.upgrade(Pos::new(1, 1), CellKind::Room);
        grid.upgrade(Pos::new(1, 1), CellKind::Corridor);
        grid.upgrade(Pos::new(2, 1), CellKind::Corridor);
        assert_eq!(grid.get(Pos::new(1, 1)), CellKind::Room);
        assert_eq!(grid.get(Pos::new(2, 1)), CellKind::Corridor);
    }

    #[test]
    fn out_of_range_access_is_silent() {
        let mut grid = Grid::new(2, 2);
        grid.upgrade(Pos::new(-1, 0), CellKind::Room);
        grid.upgrade(Pos::new(0, 2), CellKind::Room);
        grid.upgrade_rect(Rect::new(1, 1, 5, 5), CellKind::Corridor);
        assert_eq!(grid.occupied_count(), 1);
        assert_eq!(grid.get(Pos::new(7, 7)), CellKind::Empty);
    }

    #[test]
    fn applying_the_same_writes_twice_is_idempotent() {
        let writes = [
            (Rect::new(0, 0, 3, 2), CellKind::Room),
            (Rect::new(2, 1, 4, 1), CellKind::Corridor),
            (Rect::new(5, 0, 1, 3), CellKind::Corridor),
        ];
        let mut once = Grid::new(6, 3);
        for (rect, kind) in writes {
            once.upgrade_rect(rect, kind);
        }
        let mut twice = once.clone();
        for (rect, kind) in writes {
            twice.upgrade_rect(rect, kind);
        }
        assert_eq!(once, twice);
    }

    #[test]
    fn ascii_rendering_uses_one_glyph_per_cell() {
        let mut grid = Grid::new(3, 2);
        grid.upgrade(Pos::new(0, 0), CellKind::Room);
        grid.upgrade(Pos::new(1, 0), CellKind::Corridor);
        assert_eq!(grid.render_ascii(), "#. \n   \n");
    }
}
