//! Room connectivity graph shared by the proximity builders and the
//! spanning-tree simplifier.

mod builder;
mod delaunay;
mod gabriel;
mod mst;
mod relative_neighborhood;

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use crate::config::GraphAlgorithm;
use crate::geometry::rounded_distance;
use crate::rooms::Room;
use crate::types::{NodeId, Pos, RoomId};

pub use builder::ProximityStage;
pub use mst::SpanningTreeStage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbor {
    pub node: NodeId,
    pub weight: u32,
}

/// Undirected edge reported once, from the endpoint created first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub room: RoomId,
    /// Creation order within the graph.
    pub index: usize,
    pub center: Pos,
    pub proximity: Vec<Neighbor>,
    pub tree: Vec<Neighbor>,
}

impl Node {
    pub fn neighbors(&self, adjacency: Adjacency) -> &[Neighbor] {
        match adjacency {
            Adjacency::Proximity => &self.proximity,
            Adjacency::Tree => &self.tree,
        }
    }
}

/// Which adjacency list downstream stages should read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Adjacency {
    #[default]
    Proximity,
    Tree,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Simplifier {
    MinimumSpanningTree,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GraphOrigin {
    #[default]
    Unbuilt,
    Built(GraphAlgorithm),
    Simplified { from: Option<GraphAlgorithm>, by: Simplifier },
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: SlotMap<NodeId, Node>,
    order: Vec<NodeId>,
    room_nodes: SecondaryMap<RoomId, NodeId>,
    proximity_edges: usize,
    tree_edges: usize,
    authoritative: Adjacency,
    origin: GraphOrigin,
}

impl Graph {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn origin(&self) -> GraphOrigin {
        self.origin
    }

    pub fn authoritative(&self) -> Adjacency {
        self.authoritative
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().filter_map(|&id| self.nodes.get(id))
    }

    pub fn node_for_room(&self, room: RoomId) -> Option<NodeId> {
        self.room_nodes.get(room).copied()
    }

    /// Neighbours in the authoritative adjacency.
    pub fn neighbors(&self, id: NodeId) -> &[Neighbor] {
        match self.nodes.get(id) {
            Some(node) => node.neighbors(self.authoritative),
            None => &[],
        }
    }

    pub fn edge_count(&self) -> usize {
        match self.authoritative {
            Adjacency::Proximity => self.proximity_edges,
            Adjacency::Tree => self.tree_edges,
        }
    }

    pub fn proximity_edge_count(&self) -> usize {
        self.proximity_edges
    }

    pub fn tree_edge_count(&self) -> usize {
        self.tree_edges
    }

    /// Authoritative edges, each listed once, in node creation order.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for node in self.nodes() {
            for neighbor in node.neighbors(self.authoritative) {
                let Some(other) = self.nodes.get(neighbor.node) else {
                    continue;
                };
                if node.index < other.index {
                    edges.push(Edge {
                        from: self.order[node.index],
                        to: neighbor.node,
                        weight: neighbor.weight,
                    });
                }
            }
        }
        edges
    }

    pub fn total_weight(&self) -> u64 {
        self.edges().iter().map(|edge| u64::from(edge.weight)).sum()
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).iter().any(|neighbor| neighbor.node == b)
    }

    /// Every node reachable from the first one over authoritative edges.
    pub fn is_connected(&self) -> bool {
        let Some(&start) = self.order.first() else {
            return true;
        };
        let mut seen = vec![false; self.order.len()];
        let mut queue = VecDeque::from([start]);
        seen[0] = true;
        let mut reached = 1;
        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors(current) {
                let Some(next) = self.nodes.get(neighbor.node) else {
                    continue;
                };
                if !seen[next.index] {
                    seen[next.index] = true;
                    reached += 1;
                    queue.push_back(neighbor.node);
                }
            }
        }
        reached == self.order.len()
    }

    /// Node for `room`, created on first use.
    pub fn ensure_node(&mut self, room: &Room) -> NodeId {
        if let Some(id) = self.node_for_room(room.id) {
            return id;
        }
        let index = self.order.len();
        let id = self.nodes.insert(Node {
            room: room.id,
            index,
            center: room.center,
            proximity: Vec::new(),
            tree: Vec::new(),
        });
        self.order.push(id);
        self.room_nodes.insert(room.id, id);
        id
    }

    /// Symmetric proximity edge weighted by the rounded centre distance.
    /// Self-loops and repeats are ignored; returns whether an edge was added.
    pub fn add_edge(&mut self, a: &Room, b: &Room) -> bool {
        if a.id == b.id {
            return false;
        }
        let from = self.ensure_node(a);
        let to = self.ensure_node(b);
        if self.nodes[from].proximity.iter().any(|neighbor| neighbor.node == to) {
            return false;
        }
        let weight = rounded_distance(a.center, b.center);
        self.nodes[from].proximity.push(Neighbor { node: to, weight });
        self.nodes[to].proximity.push(Neighbor { node: from, weight });
        self.proximity_edges += 1;
        true
    }

    pub(crate) fn add_tree_edge(&mut self, a: NodeId, b: NodeId, weight: u32) -> bool {
        if a == b || !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
            return false;
        }
        if self.nodes[a].tree.iter().any(|neighbor| neighbor.node == b) {
            return false;
        }
        self.nodes[a].tree.push(Neighbor { node: b, weight });
        self.nodes[b].tree.push(Neighbor { node: a, weight });
        self.tree_edges += 1;
        true
    }

    pub(crate) fn mark_built(&mut self, algorithm: GraphAlgorithm) {
        self.origin = GraphOrigin::Built(algorithm);
    }

    /// Makes the tree adjacency authoritative and records the lineage.
    pub(crate) fn promote_tree(&mut self, by: Simplifier) {
        let from = match self.origin {
            GraphOrigin::Built(algorithm) => Some(algorithm),
            GraphOrigin::Simplified { from, .. } => from,
            GraphOrigin::Unbuilt => None,
        };
        self.authoritative = Adjacency::Tree;
        self.origin = GraphOrigin::Simplified { from, by };
    }
}

#[cfg(test)]
mod tests {
    use crate::rooms::test_support::rooms_at;
    use super::*;

    #[test]
    fn edges_are_symmetric_and_deduplicated() {
        let rooms = rooms_at(&[(0, 0), (3, 4)]);
        let mut graph = Graph::default();
        assert!(graph.add_edge(&rooms[0], &rooms[1]));
        assert!(!graph.add_edge(&rooms[1], &rooms[0]));
        assert!(!graph.add_edge(&rooms[0], &rooms[0]));

        assert_eq!(graph.edge_count(), 1);
        let a = graph.node_for_room(rooms[0].id).expect("node created lazily");
        let b = graph.node_for_room(rooms[1].id).expect("node created lazily");
        assert_eq!(graph.neighbors(a), &[Neighbor { node: b, weight: 5 }]);
        assert_eq!(graph.neighbors(b), &[Neighbor { node: a, weight: 5 }]);
    }

    #[test]
    fn promoting_the_tree_switches_adjacency_and_counts() {
        let rooms = rooms_at(&[(0, 0), (2, 0), (0, 2)]);
        let mut graph = Graph::default();
        graph.add_edge(&rooms[0], &rooms[1]);
        graph.add_edge(&rooms[1], &rooms[2]);
        graph.add_edge(&rooms[0], &rooms[2]);
        graph.mark_built(GraphAlgorithm::Gabriel);

        let ids = graph.node_ids().to_vec();
        graph.add_tree_edge(ids[0], ids[1], 2);
        graph.add_tree_edge(ids[0], ids[2], 2);
        graph.promote_tree(Simplifier::MinimumSpanningTree);

        assert_eq!(graph.authoritative(), Adjacency::Tree);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.proximity_edge_count(), 3);
        assert!(!graph.has_edge(ids[1], ids[2]));
        assert!(graph.is_connected());
        assert_eq!(
            graph.origin(),
            GraphOrigin::Simplified {
                from: Some(GraphAlgorithm::Gabriel),
                by: Simplifier::MinimumSpanningTree,
            }
        );
    }

    #[test]
    fn isolated_nodes_break_connectivity() {
        let rooms = rooms_at(&[(0, 0), (2, 0), (9, 9)]);
        let mut graph = Graph::default();
        graph.add_edge(&rooms[0], &rooms[1]);
        graph.ensure_node(&rooms[2]);
        assert!(!graph.is_connected());
    }
}
