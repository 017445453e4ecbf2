//! Gabriel graph: `i`–`j` is an edge when the closed disk with that segment
//! as diameter holds no other room centre.

use crate::geometry::diametral_circle;
use crate::rooms::Room;

use super::Graph;

/// Tests every pair `(primary, j)` with `j > primary`.
pub(super) fn connect_primary(rooms: &[&Room], graph: &mut Graph, primary: usize) {
    let Some(&first) = rooms.get(primary) else {
        return;
    };
    for (secondary, &second) in rooms.iter().enumerate().skip(primary + 1) {
        let circle = diametral_circle(first.center, second.center);
        // A centre stacked on an endpoint sits on the circle itself and would
        // otherwise cut that endpoint off from everything.
        let blocked = rooms.iter().enumerate().any(|(other, room)| {
            other != primary
                && other != secondary
                && room.center != first.center
                && room.center != second.center
                && circle.contains(room.center)
        });
        if !blocked {
            graph.add_edge(first, second);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::rooms::test_support::rooms_at;
    use super::*;

    fn build(centers: &[(i32, i32)]) -> (Vec<Room>, Graph) {
        let rooms = rooms_at(centers);
        let refs: Vec<&Room> = rooms.iter().collect();
        let mut graph = Graph::default();
        for primary in 0..refs.len() {
            connect_primary(&refs, &mut graph, primary);
        }
        (rooms, graph)
    }

    fn linked(graph: &Graph, rooms: &[Room], a: usize, b: usize) -> bool {
        match (graph.node_for_room(rooms[a].id), graph.node_for_room(rooms[b].id)) {
            (Some(a), Some(b)) => graph.has_edge(a, b),
            _ => false,
        }
    }

    #[test]
    fn point_inside_the_diametral_disk_blocks_the_edge() {
        let (rooms, graph) = build(&[(0, 0), (10, 0), (5, 1)]);
        assert!(!linked(&graph, &rooms, 0, 1));
        assert!(linked(&graph, &rooms, 0, 2));
        assert!(linked(&graph, &rooms, 1, 2));
    }

    #[test]
    fn point_on_the_circle_also_blocks_the_edge() {
        let (rooms, graph) = build(&[(0, 0), (4, 0), (2, 2)]);
        assert!(!linked(&graph, &rooms, 0, 1));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn square_corners_keep_only_the_sides() {
        let (_, graph) = build(&[(0, 0), (4, 0), (4, 4), (0, 4)]);
        assert_eq!(graph.edge_count(), 4);
        assert!(graph.is_connected());
    }

    #[test]
    fn stacked_centres_stay_connected() {
        let (_, graph) = build(&[(0, 0), (0, 0), (6, 0)]);
        assert!(graph.is_connected());
    }
}
