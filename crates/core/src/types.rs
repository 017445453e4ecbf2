use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct RoomId;
    pub struct NodeId;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Occupancy of one grid cell. The declaration order is the write priority:
/// a later write only lands when it outranks what is already there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Empty,
    Corridor,
    Room,
}

impl CellKind {
    pub fn is_occupied(self) -> bool {
        self != Self::Empty
    }
}

/// Axis-aligned block of cells. `right()` and `bottom()` are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub const fn right(self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(self) -> i32 {
        self.y + self.height
    }

    pub const fn area(self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Strict overlap: rectangles that only share an edge do not overlap.
    pub fn overlaps(self, other: &Self) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn contains(self, pos: Pos) -> bool {
        pos.x >= self.x && pos.x < self.right() && pos.y >= self.y && pos.y < self.bottom()
    }

    pub const fn translated(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy, width: self.width, height: self.height }
    }

    pub fn cells(self) -> impl Iterator<Item = Pos> {
        (self.y..self.bottom()).flat_map(move |y| (self.x..self.right()).map(move |x| Pos { x, y }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_kinds_rank_room_over_corridor_over_empty() {
        assert!(CellKind::Room > CellKind::Corridor);
        assert!(CellKind::Corridor > CellKind::Empty);
        assert!(!CellKind::Empty.is_occupied());
    }

    #[test]
    fn rects_sharing_an_edge_do_not_overlap() {
        let left = Rect::new(0, 0, 4, 4);
        let right = Rect::new(4, 0, 4, 4);
        assert!(!left.overlaps(&right));
        assert!(left.overlaps(&Rect::new(3, 3, 2, 2)));
    }

    #[test]
    fn rect_cells_walk_rows_in_order() {
        let cells: Vec<Pos> = Rect::new(1, 2, 2, 2).cells().collect();
        assert_eq!(cells, vec![Pos::new(1, 2), Pos::new(2, 2), Pos::new(1, 3), Pos::new(2, 3)]);
    }
}
