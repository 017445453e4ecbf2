//! Corridor path shapes between two portals.

use std::mem::swap;

use serde::{Deserialize, Serialize};

use crate::types::{Pos, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub start: Pos,
    pub end: Pos,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Route {
    pub segments: Vec<Segment>,
    pub blocks: Vec<Rect>,
}

/// One horizontal and one vertical leg meeting at an elbow. The elbow takes
/// the start's X and the end's Y, except when the path runs left and down,
/// where it takes the end's X and the start's Y. Both legs include their
/// endpoints so the elbow cell is always claimed.
pub fn l_shape(start: Pos, end: Pos, width: i32) -> Route {
    let elbow = if start.x > end.x && start.y < end.y {
        Pos::new(end.x, start.y)
    } else {
        Pos::new(start.x, end.y)
    };

    let mut route = Route::default();
    if start.x != end.x {
        let (left, right) = (start.x.min(end.x), start.x.max(end.x));
        let segment = Segment { start: Pos::new(left, elbow.y), end: Pos::new(right, elbow.y) };
        route.segments.push(segment);
        route.blocks.push(Rect::new(left, elbow.y, right - left + 1, width));
    }
    if start.y != end.y {
        let (top, bottom) = (start.y.min(end.y), start.y.max(end.y));
        let segment = Segment { start: Pos::new(elbow.x, top), end: Pos::new(elbow.x, bottom) };
        route.segments.push(segment);
        route.blocks.push(Rect::new(elbow.x, top, width, bottom - top + 1));
    }
    if route.blocks.is_empty() {
        route.segments.push(Segment { start, end });
        route.blocks.push(Rect::new(start.x, start.y, width, width));
    }
    route
}

/// Integer Bresenham line with one `width`-sized block per plotted point.
/// Single-width corridors get an extra block wherever the minor axis steps
/// so consecutive blocks always share an edge.
pub fn bresenham(start: Pos, end: Pos, width: i32) -> Route {
    let (mut x1, mut y1, mut x2, mut y2) = (start.x, start.y, end.x, end.y);
    let steep = (y2 - y1).abs() > (x2 - x1).abs();
    if steep {
        swap(&mut x1, &mut y1);
        swap(&mut x2, &mut y2);
    }
    if x1 > x2 {
        swap(&mut x1, &mut x2);
        swap(&mut y1, &mut y2);
    }

    let dx = x2 - x1;
    let dy = (y2 - y1).abs();
    let y_step = if y1 < y2 { 1 } else { -1 };
    let mut error = dx / 2;
    let mut y = y1;
    let mut previous_y = y;

    let plot = |major: i32, minor: i32| {
        let (x, y) = if steep { (minor, major) } else { (major, minor) };
        Rect::new(x, y, width, width)
    };

    let mut blocks = Vec::with_capacity((dx + 1) as usize);
    for x in x1..=x2 {
        blocks.push(plot(x, y));
        if y != previous_y && width == 1 {
            blocks.push(plot(x - 1, y));
        }
        previous_y = y;

        error -= dy;
        if error < 0 {
            y += y_step;
            error += dx;
        }
    }

    Route { segments: vec![Segment { start, end }], blocks }
}
