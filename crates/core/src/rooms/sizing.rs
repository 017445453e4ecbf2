//! Procedural room dimensions.

use crate::config::{LimitsConfig, RoomConfig};
use crate::error::{GenerationError, GenerationResult};
use crate::random::DungeonRng;

/// Widths tried for one sampled area before drawing a new area.
const SHAPE_ATTEMPTS_PER_AREA: u32 = 32;

/// Draws an area from `mult_area * N(0, 2)`, rejecting values outside the
/// configured range, then searches for a width/height pair that honours the
/// dimension bounds and side ratio. Both searches are capped.
pub(super) fn sample_room_size(
    rng: &mut DungeonRng,
    rooms: &RoomConfig,
    limits: &LimitsConfig,
) -> GenerationResult<(i32, i32)> {
    for _ in 0..limits.max_size_attempts {
        let Some(area) = sample_area(rng, rooms) else {
            continue;
        };
        if let Some(shape) = choose_shape(rng, rooms, area) {
            return Ok(shape);
        }
    }

    Err(GenerationError::configuration(format!(
        "no room shape satisfies area {}..={}, width {}..={}, height {}..={} \
         and ratio {}..={} after {} attempts",
        rooms.min_area,
        rooms.max_area,
        rooms.min_width,
        rooms.max_width,
        rooms.min_height,
        rooms.max_height,
        rooms.min_ratio,
        rooms.max_ratio,
        limits.max_size_attempts,
    )))
}

fn sample_area(rng: &mut DungeonRng, rooms: &RoomConfig) -> Option<i32> {
    let area = (rooms.mult_area * rng.gaussian(0.0, 2.0)) as i32;
    if area < rooms.min_area || area > rooms.max_area {
        return None;
    }
    if area % 2 == 0 {
        return Some(area);
    }
    // Prefer the even neighbour below, but never leave the allowed range.
    if area - 1 >= rooms.min_area {
        Some(area - 1)
    } else if area + 1 <= rooms.max_area {
        Some(area + 1)
    } else {
        Some(area)
    }
}

fn choose_shape(rng: &mut DungeonRng, rooms: &RoomConfig, area: i32) -> Option<(i32, i32)> {
    // Areas that divide down to the minimum side (integer division, so the
    // remainder is dropped) pair it with the quotient and skip the search.
    let height = area / rooms.min_width;
    if height == rooms.min_width && fits(rooms, rooms.min_width, height) {
        return Some((rooms.min_width, height));
    }
    let width = area / rooms.min_height;
    if width == rooms.min_height && fits(rooms, width, rooms.min_height) {
        return Some((width, rooms.min_height));
    }

    let widest = rooms.max_width.min(area / rooms.min_height);
    if widest < rooms.min_width {
        return None;
    }
    for _ in 0..SHAPE_ATTEMPTS_PER_AREA {
        let width = rng.range_inclusive(rooms.min_width, widest);
        let height = area / width;
        if fits(rooms, width, height) {
            return Some((width, height));
        }
    }
    None
}

fn fits(rooms: &RoomConfig, width: i32, height: i32) -> bool {
    let area = width * height;
    (rooms.min_width..=rooms.max_width).contains(&width)
        && (rooms.min_height..=rooms.max_height).contains(&height)
        && (rooms.min_area..=rooms.max_area).contains(&area)
        && ratio_ok(rooms, width, height)
}

fn ratio_ok(rooms: &RoomConfig, width: i32, height: i32) -> bool {
    let ratio = f64::from(width.min(height)) / f64::from(width.max(height));
    ratio >= rooms.min_ratio && ratio <= rooms.max_ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampled_shapes_respect_every_bound() {
        let rooms = RoomConfig::default();
        let limits = LimitsConfig::default();
        let mut rng = DungeonRng::seeded(77);
        for _ in 0..500 {
            let (width, height) =
                sample_room_size(&mut rng, &rooms, &limits).expect("defaults are satisfiable");
            assert!(fits(&rooms, width, height), "{width}x{height} escaped the bounds");
        }
    }

    #[test]
    fn impossible_ratio_is_reported_instead_of_looping() {
        let rooms = RoomConfig {
            min_area: 6,
            max_area: 6,
            min_ratio: 1.0,
            ..RoomConfig::default()
        };
        let limits = LimitsConfig { max_size_attempts: 50, ..LimitsConfig::default() };
        let mut rng = DungeonRng::seeded(1);
        assert!(matches!(
            sample_room_size(&mut rng, &rooms, &limits),
            Err(GenerationError::Configuration { .. })
        ));
    }

    #[test]
    fn minimum_square_area_uses_the_minimum_square() {
        let rooms = RoomConfig { min_area: 4, max_area: 4, ..RoomConfig::default() };
        let mut rng = DungeonRng::seeded(2);
        assert_eq!(choose_shape(&mut rng, &rooms, 4), Some((2, 2)));
    }

    #[test]
    fn areas_dividing_down_to_the_minimum_side_drop_the_remainder() {
        let rooms = RoomConfig { min_width: 3, min_height: 3, ..RoomConfig::default() };
        let mut rng = DungeonRng::seeded(2);
        assert_eq!(choose_shape(&mut rng, &rooms, 10), Some((3, 3)));
        assert_eq!(choose_shape(&mut rng, &rooms, 11), Some((3, 3)));
    }

    #[test]
    fn minimum_height_shortcut_applies_when_width_does_not() {
        let rooms = RoomConfig { min_width: 2, min_height: 3, ..RoomConfig::default() };
        let mut rng = DungeonRng::seeded(2);
        assert_eq!(choose_shape(&mut rng, &rooms, 9), Some((3, 3)));
    }

    #[test]
    fn odd_areas_are_made_even_inside_the_range() {
        let rooms = RoomConfig { min_area: 5, max_area: 6, ..RoomConfig::default() };
        let mut rng = DungeonRng::seeded(9);
        for _ in 0..2_000 {
            if let Some(area) = sample_area(&mut rng, &rooms) {
                assert_eq!(area, 6);
            }
        }
    }
}
