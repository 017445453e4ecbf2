//! Finding a free centre for a new room.

use crate::error::{GenerationError, GenerationResult};
use crate::geometry::distance;
use crate::random::DungeonRng;
use crate::types::Pos;

use super::RoomSet;

pub(super) struct PlacementSettings {
    pub start: Pos,
    pub spacing_x: f64,
    pub spacing_y: f64,
    pub max_attempts: u32,
}

pub(super) enum PlacementRequest {
    /// First room at the start point, later rooms orbit an existing one.
    Scatter,
    /// Taken as-is; overlaps are the author's responsibility.
    Fixed(Pos),
    /// Random angle at a fixed distance from `center`.
    Orbit { center: Pos, radius: f64 },
}

pub(super) fn find_center(
    rng: &mut DungeonRng,
    rooms: &RoomSet,
    radius: f64,
    request: &PlacementRequest,
    settings: &PlacementSettings,
    label: &str,
) -> GenerationResult<Pos> {
    match request {
        PlacementRequest::Fixed(center) => return Ok(*center),
        PlacementRequest::Scatter if rooms.is_empty() => return Ok(settings.start),
        PlacementRequest::Scatter | PlacementRequest::Orbit { .. } => {}
    }

    for _ in 0..settings.max_attempts {
        let candidate = match request {
            PlacementRequest::Orbit { center, radius: orbit } => {
                point_on_circle(rng, *center, *orbit, 1.0, 1.0)
            }
            _ => {
                let anchor = pick_anchor(rng, rooms);
                let Some(anchor) = rooms.by_index(anchor) else {
                    continue;
                };
                point_on_circle(
                    rng,
                    anchor.center,
                    anchor.radius + radius,
                    settings.spacing_x,
                    settings.spacing_y,
                )
            }
        };
        if is_free(rooms, candidate, radius) {
            return Ok(candidate);
        }
    }

    Err(GenerationError::PlacementExhausted {
        room: label.to_string(),
        attempts: settings.max_attempts,
    })
}

/// Index of an existing room, biased toward the most recently placed ones
/// so the layout keeps growing outward.
fn pick_anchor(rng: &mut DungeonRng, rooms: &RoomSet) -> usize {
    let last = rooms.len().saturating_sub(1);
    let bias = (1.0 - rng.gaussian(0.0, 0.5).abs()).max(0.0);
    let low = ((rooms.len() as f64 * bias) as usize).min(last);
    rng.range_inclusive(low as i32, last as i32) as usize
}

fn point_on_circle(
    rng: &mut DungeonRng,
    center: Pos,
    radius: f64,
    spacing_x: f64,
    spacing_y: f64,
) -> Pos {
    let angle = rng.angle();
    let dx = (angle.cos() * radius * spacing_x).round() as i32;
    let dy = (angle.sin() * radius * spacing_y).round() as i32;
    center.offset(dx, dy)
}

/// Circles that touch count as overlapping.
fn is_free(rooms: &RoomSet, candidate: Pos, radius: f64) -> bool {
    rooms.iter().all(|room| distance(candidate, room.center) > radius + room.radius)
}

#[cfg(test)]
mod tests {
    use crate::rooms::{RoomDraft, RoomOrigin, collision_radius, rect_around};
    use crate::types::CellKind;
    use super::*;

    fn settings() -> PlacementSettings {
        PlacementSettings {
            start: Pos::new(60, 60),
            spacing_x: 1.0,
            spacing_y: 1.0,
            max_attempts: 200,
        }
    }

    fn room_at(rooms: &mut RoomSet, center: Pos, size: i32) {
        let rect = rect_around(center, size, size);
        rooms.insert(RoomDraft {
            origin: RoomOrigin::Procedural,
            rect,
            center,
            radius: collision_radius(size, size),
            cells: vec![CellKind::Room; rect.area() as usize],
            portals: Vec::new(),
        });
    }

    #[test]
    fn first_scattered_room_lands_on_the_start_point() {
        let mut rng = DungeonRng::seeded(1);
        let center = find_center(
            &mut rng,
            &RoomSet::default(),
            2.0,
            &PlacementRequest::Scatter,
            &settings(),
            "a",
        )
        .expect("empty layout always has room");
        assert_eq!(center, Pos::new(60, 60));
    }

    #[test]
    fn scattered_rooms_never_overlap_existing_circles() {
        let mut rng = DungeonRng::seeded(21);
        let mut rooms = RoomSet::default();
        room_at(&mut rooms, Pos::new(60, 60), 4);
        let gap = 2.0_f64.hypot(2.0);
        for _ in 0..15 {
            let center =
                find_center(&mut rng, &rooms, gap, &PlacementRequest::Scatter, &settings(), "b")
                    .expect("open plane has space");
            assert!(rooms.iter().all(|room| distance(center, room.center) > room.radius + gap));
            room_at(&mut rooms, center, 4);
        }
    }

    #[test]
    fn fixed_placement_skips_the_overlap_test() {
        let mut rng = DungeonRng::seeded(1);
        let mut rooms = RoomSet::default();
        room_at(&mut rooms, Pos::new(10, 10), 4);
        let request = PlacementRequest::Fixed(Pos::new(10, 10));
        let center = find_center(&mut rng, &rooms, 3.0, &request, &settings(), "c")
            .expect("fixed placement cannot fail");
        assert_eq!(center, Pos::new(10, 10));
    }

    #[test]
    fn orbit_inside_an_occupied_disk_exhausts_attempts() {
        let mut rng = DungeonRng::seeded(1);
        let mut rooms = RoomSet::default();
        room_at(&mut rooms, Pos::new(0, 0), 10);
        let request = PlacementRequest::Orbit { center: Pos::new(0, 0), radius: 1.0 };
        let err = find_center(&mut rng, &rooms, 2.0, &request, &settings(), "stuck")
            .expect_err("orbit lies inside the existing room");
        assert_eq!(
            err,
            GenerationError::PlacementExhausted { room: "stuck".to_string(), attempts: 200 }
        );
    }
}
