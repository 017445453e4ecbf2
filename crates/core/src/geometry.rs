//! Planar helpers for the proximity graph predicates.

use crate::types::Pos;

/// Slack for "strictly inside a circle" tests so integer centres sitting
/// exactly on a circumference are not counted as inside through rounding.
const CIRCLE_EPSILON: f64 = 1e-9;

pub fn distance(a: Pos, b: Pos) -> f64 {
    distance_xy(f64::from(a.x), f64::from(a.y), f64::from(b.x), f64::from(b.y))
}

pub fn distance_xy(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = ax - bx;
    let dy = ay - by;
    (dx * dx + dy * dy).sqrt()
}

/// Edge weight between two centres: Euclidean distance rounded half up.
pub fn rounded_distance(a: Pos, b: Pos) -> u32 {
    (distance(a, b) + 0.5) as u32
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl Circle {
    pub fn distance_to(&self, pos: Pos) -> f64 {
        distance_xy(self.center_x, self.center_y, f64::from(pos.x), f64::from(pos.y))
    }

    /// Closed disk test; the boundary counts as inside.
    pub fn contains(&self, pos: Pos) -> bool {
        self.distance_to(pos) <= self.radius + CIRCLE_EPSILON
    }

    /// Open disk test; the boundary counts as outside.
    pub fn strictly_contains(&self, pos: Pos) -> bool {
        self.distance_to(pos) < self.radius - CIRCLE_EPSILON
    }
}

/// The circle whose diameter is the segment `a`–`b`.
pub fn diametral_circle(a: Pos, b: Pos) -> Circle {
    Circle {
        center_x: f64::from(a.x + b.x) / 2.0,
        center_y: f64::from(a.y + b.y) / 2.0,
        radius: distance(a, b) / 2.0,
    }
}

pub fn is_collinear(a: Pos, b: Pos, c: Pos) -> bool {
    let cross = i64::from(b.x - a.x) * i64::from(c.y - b.y)
        - i64::from(b.y - a.y) * i64::from(c.x - b.x);
    cross == 0
}

/// Circle through three points, found by intersecting the perpendicular
/// bisectors of `ab` and `bc`. Returns `None` for collinear or repeated
/// points, which have no finite circumcircle.
pub fn circumcircle(a: Pos, b: Pos, c: Pos) -> Option<Circle> {
    if is_collinear(a, b, c) {
        return None;
    }

    let ya_delta = f64::from(b.y - a.y);
    let xa_delta = f64::from(b.x - a.x);
    let yb_delta = f64::from(c.y - b.y);
    let xb_delta = f64::from(c.x - b.x);

    let ab_mid_x = f64::from(a.x + b.x) / 2.0;
    let ab_mid_y = f64::from(a.y + b.y) / 2.0;
    let bc_mid_x = f64::from(b.x + c.x) / 2.0;
    let bc_mid_y = f64::from(b.y + c.y) / 2.0;

    // Each bisector satisfies dx * (x - mid_x) + dy * (y - mid_y) = 0. A zero
    // delta makes that bisector axis-aligned, so it pins one coordinate
    // directly and the other bisector supplies the second.
    let (center_x, center_y) = if ya_delta == 0.0 {
        let x = ab_mid_x;
        (x, bc_mid_y - xb_delta * (x - bc_mid_x) / yb_delta)
    } else if yb_delta == 0.0 {
        let x = bc_mid_x;
        (x, ab_mid_y - xa_delta * (x - ab_mid_x) / ya_delta)
    } else if xa_delta == 0.0 {
        let y = ab_mid_y;
        (bc_mid_x - yb_delta * (y - bc_mid_y) / xb_delta, y)
    } else if xb_delta == 0.0 {
        let y = bc_mid_y;
        (ab_mid_x - ya_delta * (y - ab_mid_y) / xa_delta, y)
    } else {
        let ka = xa_delta * ab_mid_x + ya_delta * ab_mid_y;
        let kb = xb_delta * bc_mid_x + yb_delta * bc_mid_y;
        let determinant = xa_delta * yb_delta - ya_delta * xb_delta;
        (
            (ka * yb_delta - ya_delta * kb) / determinant,
            (xa_delta * kb - ka * xb_delta) / determinant,
        )
    };

    if !center_x.is_finite() || !center_y.is_finite() {
        return None;
    }

    let radius = distance_xy(center_x, center_y, f64::from(a.x), f64::from(a.y));
    Some(Circle { center_x, center_y, radius })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_equidistant(circle: Circle, points: [Pos; 3]) {
        for point in points {
            let offset = (circle.distance_to(point) - circle.radius).abs();
            assert!(offset < 1e-9, "{point:?} is {offset} away from the circumference");
        }
    }

    #[test]
    fn rounded_distance_rounds_half_up() {
        assert_eq!(rounded_distance(Pos::new(0, 0), Pos::new(3, 4)), 5);
        assert_eq!(rounded_distance(Pos::new(0, 0), Pos::new(1, 1)), 1);
        assert_eq!(rounded_distance(Pos::new(0, 0), Pos::new(2, 2)), 3);
    }

    #[test]
    fn circumcircle_handles_every_bisector_orientation() {
        let cases = [
            // ab horizontal
            [Pos::new(0, 0), Pos::new(4, 0), Pos::new(1, 3)],
            // bc horizontal
            [Pos::new(1, 3), Pos::new(0, 0), Pos::new(4, 0)],
            // ab vertical
            [Pos::new(0, 0), Pos::new(0, 4), Pos::new(3, 1)],
            // bc vertical
            [Pos::new(3, 1), Pos::new(0, 0), Pos::new(0, 4)],
            // right angle corner at b
            [Pos::new(0, 4), Pos::new(0, 0), Pos::new(4, 0)],
            // general position
            [Pos::new(-2, 1), Pos::new(5, 3), Pos::new(1, -6)],
        ];
        for points in cases {
            let circle = circumcircle(points[0], points[1], points[2])
                .unwrap_or_else(|| panic!("{points:?} should have a circumcircle"));
            assert_equidistant(circle, points);
        }
    }

    #[test]
    fn collinear_and_repeated_points_have_no_circumcircle() {
        assert!(circumcircle(Pos::new(0, 0), Pos::new(2, 2), Pos::new(5, 5)).is_none());
        assert!(circumcircle(Pos::new(0, 0), Pos::new(0, 0), Pos::new(5, 1)).is_none());
    }

    #[test]
    fn boundary_points_are_inside_closed_but_not_open_disks() {
        let circle = diametral_circle(Pos::new(0, 0), Pos::new(4, 0));
        let on_boundary = Pos::new(2, 2);
        assert!(circle.contains(on_boundary));
        assert!(!circle.strictly_contains(on_boundary));
        assert!(circle.strictly_contains(Pos::new(2, 1)));
    }
}
