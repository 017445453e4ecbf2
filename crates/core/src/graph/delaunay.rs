//! Delaunay-style graph from empty circumcircles, plus the isolated-room
//! repair pass.

use crate::error::{GenerationError, GenerationResult};
use crate::geometry::{circumcircle, distance, is_collinear};
use crate::pipeline::StageKind;
use crate::rooms::Room;

use super::Graph;

/// Fails when three or more centres all lie on one line: no triangle has a
/// finite circumcircle, so the builder would produce nothing.
pub(super) fn check_geometry(rooms: &[&Room]) -> GenerationResult<()> {
    if rooms.len() < 3 {
        return Ok(());
    }
    let origin = rooms[0].center;
    let Some(direction) = rooms.iter().map(|room| room.center).find(|&center| center != origin)
    else {
        return Err(GenerationError::DegenerateGeometry {
            stage: StageKind::ProximityGraph,
            reason: format!("all {} room centres coincide", rooms.len()),
        });
    };
    if rooms.iter().all(|room| is_collinear(origin, direction, room.center)) {
        return Err(GenerationError::DegenerateGeometry {
            stage: StageKind::ProximityGraph,
            reason: format!("all {} room centres are collinear", rooms.len()),
        });
    }
    Ok(())
}

/// Tests every triangle `(primary, secondary, k)` with `k > secondary`. A
/// triangle whose circumcircle has no other centre strictly inside adds all
/// three sides.
pub(super) fn connect_pair(rooms: &[&Room], graph: &mut Graph, primary: usize, secondary: usize) {
    let (Some(&first), Some(&second)) = (rooms.get(primary), rooms.get(secondary)) else {
        return;
    };
    for (third_index, &third) in rooms.iter().enumerate().skip(secondary + 1) {
        let Some(circle) = circumcircle(first.center, second.center, third.center) else {
            continue;
        };
        let occupied = rooms.iter().enumerate().any(|(other, room)| {
            other != primary
                && other != secondary
                && other != third_index
                && circle.strictly_contains(room.center)
        });
        if !occupied {
            graph.add_edge(first, second);
            graph.add_edge(second, third);
            graph.add_edge(first, third);
        }
    }
}

/// Links every room that ended up without neighbours to its two nearest
/// rooms. Returns how many rooms needed it.
pub(super) fn connect_isolated(rooms: &[&Room], graph: &mut Graph) -> usize {
    let mut repaired = 0;
    for &room in rooms {
        let isolated = graph
            .node_for_room(room.id)
            .and_then(|id| graph.node(id))
            .is_none_or(|node| node.proximity.is_empty());
        if !isolated {
            continue;
        }

        let mut nearest: [Option<(f64, &Room)>; 2] = [None, None];
        for &other in rooms {
            if other.id == room.id {
                continue;
            }
            let gap = distance(room.center, other.center);
            if nearest[0].is_none_or(|(best, _)| gap < best) {
                nearest[1] = nearest[0];
                nearest[0] = Some((gap, other));
            } else if nearest[1].is_none_or(|(best, _)| gap < best) {
                nearest[1] = Some((gap, other));
            }
        }

        let mut linked = false;
        for (_, other) in nearest.into_iter().flatten() {
            linked |= graph.add_edge(room, other);
        }
        if linked {
            repaired += 1;
        }
    }
    repaired
}
