//! Relative-neighbourhood graph: `i`–`j` is an edge unless some other centre
//! is strictly closer to both endpoints than they are to each other.

use crate::geometry::distance;
use crate::rooms::Room;

use super::Graph;

pub(super) fn connect_primary(rooms: &[&Room], graph: &mut Graph, primary: usize) {
    let Some(&first) = rooms.get(primary) else {
        return;
    };
    for (secondary, &second) in rooms.iter().enumerate().skip(primary + 1) {
        let span = distance(first.center, second.center);
        let in_lune = rooms.iter().enumerate().any(|(other, room)| {
            other != primary
                && other != secondary
                && distance(room.center, first.center) < span
                && distance(room.center, second.center) < span
        });
        if !in_lune {
            graph.add_edge(first, second);
        }
    }
}
