//! Prim's reduction of the proximity graph to a minimum spanning tree.

use tracing::{debug, warn};

use crate::config::DungeonConfig;
use crate::error::GenerationResult;
use crate::geometry::{distance, rounded_distance};
use crate::pipeline::{GenerationContext, PipelineStage, StageCursor, StageKind, StepStatus};
use crate::types::NodeId;

use super::{Graph, Simplifier};

/// Grows the tree from the most recently created node, one edge per step.
/// Among frontier edges of equal weight the one reaching the lowest-index
/// outside node wins, then the lowest-index tree node.
#[derive(Clone, Debug, Default)]
pub struct SpanningTreeStage {
    in_tree: Vec<bool>,
    target: usize,
    repairs: usize,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    near: NodeId,
    far: NodeId,
    weight: u32,
}

impl SpanningTreeStage {
    fn cheapest_frontier_edge(&self, graph: &Graph) -> Option<Candidate> {
        let mut best: Option<((u32, usize, usize), Candidate)> = None;
        for node in graph.nodes().filter(|node| self.in_tree[node.index]) {
            for neighbor in &node.proximity {
                let Some(far) = graph.node(neighbor.node) else {
                    continue;
                };
                if self.in_tree[far.index] {
                    continue;
                }
                let key = (neighbor.weight, far.index, node.index);
                if best.is_none_or(|(best_key, _)| key < best_key) {
                    let candidate = Candidate {
                        near: graph.node_ids()[node.index],
                        far: neighbor.node,
                        weight: neighbor.weight,
                    };
                    best = Some((key, candidate));
                }
            }
        }
        best.map(|(_, candidate)| candidate)
    }

    /// Bridges a disconnected proximity graph with the geometrically closest
    /// (tree, outside) pair.
    fn closest_bridge(&self, graph: &Graph) -> Option<Candidate> {
        let mut best: Option<(f64, Candidate)> = None;
        for near in graph.nodes().filter(|node| self.in_tree[node.index]) {
            for far in graph.nodes().filter(|node| !self.in_tree[node.index]) {
                let gap = distance(near.center, far.center);
                if best.is_none_or(|(best_gap, _)| gap < best_gap) {
                    best = Some((
                        gap,
                        Candidate {
                            near: graph.node_ids()[near.index],
                            far: graph.node_ids()[far.index],
                            weight: rounded_distance(near.center, far.center),
                        },
                    ));
                }
            }
        }
        best.map(|(_, candidate)| candidate)
    }
}

impl PipelineStage for SpanningTreeStage {
    fn kind(&self) -> StageKind {
        StageKind::SpanningTree
    }

    fn clear(&mut self) {
        self.in_tree.clear();
        self.target = 0;
        self.repairs = 0;
    }

    fn load_data(&mut self, _config: &DungeonConfig) -> GenerationResult<()> {
        Ok(())
    }

    fn pre_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        ctx.tree = ctx.proximity.clone();
        // Rooms the builder never linked still need a node in the tree.
        for room in ctx.rooms.iter() {
            ctx.tree.ensure_node(room);
        }
        self.in_tree = vec![false; ctx.tree.len()];
        if let Some(last) = self.in_tree.last_mut() {
            *last = true;
        }
        self.target = ctx.tree.len().saturating_sub(1);
        self.repairs = 0;
        Ok(())
    }

    fn step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<StepStatus> {
        if ctx.tree.tree_edge_count() >= self.target {
            return Ok(StepStatus::Done);
        }

        let candidate = match self.cheapest_frontier_edge(&ctx.tree) {
            Some(candidate) => Some(candidate),
            None => {
                let bridge = self.closest_bridge(&ctx.tree);
                if bridge.is_some() {
                    self.repairs += 1;
                    warn!(
                        tree_edges = ctx.tree.tree_edge_count(),
                        "proximity graph is disconnected, bridging with the closest pair"
                    );
                }
                bridge
            }
        };
        let Some(Candidate { near, far, weight }) = candidate else {
            return Ok(StepStatus::Done);
        };

        ctx.tree.add_tree_edge(near, far, weight);
        if let Some(index) = ctx.tree.node(far).map(|node| node.index) {
            self.in_tree[index] = true;
        }

        Ok(if ctx.tree.tree_edge_count() >= self.target {
            StepStatus::Done
        } else {
            StepStatus::Continue
        })
    }

    fn post_step(&mut self, ctx: &mut GenerationContext) -> GenerationResult<()> {
        ctx.tree.promote_tree(Simplifier::MinimumSpanningTree);
        debug!(
            edges = ctx.tree.edge_count(),
            weight = ctx.tree.total_weight(),
            repairs = self.repairs,
            "spanning tree built"
        );
        Ok(())
    }

    fn cursor(&self, ctx: &GenerationContext) -> StageCursor {
        StageCursor::Tree { edges: ctx.tree.tree_edge_count(), target: self.target }
    }
}

#[cfg(test)]
mod tests {
    use crate::rooms::Room;
    use crate::rooms::test_support::rooms_at;
    use super::*;

    /// Runs the stage over `graph` directly, bypassing room generation.
    fn reduce(graph: &Graph) -> Graph {
        let mut stage = SpanningTreeStage::default();
        let mut ctx = GenerationContext::new(1);
        ctx.proximity = graph.clone();
        stage.pre_step(&mut ctx).expect("pre step");
        while stage.step(&mut ctx).expect("step") == StepStatus::Continue {}
        stage.post_step(&mut ctx).expect("post step");
        ctx.tree
    }

    fn complete_graph(rooms: &[Room]) -> Graph {
        let mut graph = Graph::default();
        for (index, first) in rooms.iter().enumerate() {
            for second in &rooms[index + 1..] {
                graph.add_edge(first, second);
            }
        }
        graph
    }

    fn root(parent: &[usize], mut at: usize) -> usize {
        while parent[at] != at {
            at = parent[at];
        }
        at
    }

    /// Brute force over every subset of `n - 1` edges.
    fn brute_force_minimum(graph: &Graph) -> u64 {
        let edges = graph.edges();
        let n = graph.len();
        let mut best = u64::MAX;
        for mask in 0_u32..(1 << edges.len()) {
            if mask.count_ones() as usize != n - 1 {
                continue;
            }
            let mut parent: Vec<usize> = (0..n).collect();
            let mut weight = 0;
            let mut acyclic = true;
            for (bit, edge) in edges.iter().enumerate() {
                if mask & (1 << bit) == 0 {
                    continue;
                }
                let a = graph.node(edge.from).map_or(0, |node| node.index);
                let b = graph.node(edge.to).map_or(0, |node| node.index);
                let (ra, rb) = (root(&parent, a), root(&parent, b));
                if ra == rb {
                    acyclic = false;
                    break;
                }
                parent[ra] = rb;
                weight += u64::from(edge.weight);
            }
            if acyclic {
                best = best.min(weight);
            }
        }
        best
    }

    #[test]
    fn tree_has_n_minus_one_edges_and_stays_connected() {
        let rooms = rooms_at(&[(0, 0), (5, 1), (9, 7), (2, 8), (14, 3), (7, 12)]);
        let tree = reduce(&complete_graph(&rooms));
        assert_eq!(tree.edge_count(), rooms.len() - 1);
        assert!(tree.is_connected());
    }

    #[test]
    fn tree_weight_matches_brute_force_minimum() {
        let rooms = rooms_at(&[(0, 0), (3, 4), (8, 1), (6, 9), (1, 7)]);
        let graph = complete_graph(&rooms);
        let tree = reduce(&graph);
        assert_eq!(tree.total_weight(), brute_force_minimum(&graph));
    }

    /// Tree adjacency only; proximity stays authoritative until `post_step`.
    fn tree_link(graph: &Graph, a: NodeId, b: NodeId) -> bool {
        graph.node(a).is_some_and(|node| node.tree.iter().any(|neighbor| neighbor.node == b))
    }

    #[test]
    fn equal_weights_grow_from_the_last_node_toward_lower_indices() {
        // Unit square 0-1-2-3-0, every edge weight 1.
        let rooms = rooms_at(&[(0, 0), (1, 0), (1, 1), (0, 1)]);
        let mut graph = Graph::default();
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            graph.add_edge(&rooms[a], &rooms[b]);
        }

        let mut stage = SpanningTreeStage::default();
        let mut ctx = GenerationContext::new(1);
        ctx.proximity = graph;
        stage.pre_step(&mut ctx).expect("pre step");
        let ids = ctx.tree.node_ids().to_vec();

        let mut grown = Vec::new();
        loop {
            let status = stage.step(&mut ctx).expect("step");
            let added = [(3, 0), (0, 1), (1, 2), (2, 3)]
                .into_iter()
                .filter(|&(a, b)| tree_link(&ctx.tree, ids[a], ids[b]) && !grown.contains(&(a, b)))
                .collect::<Vec<_>>();
            assert_eq!(added.len(), 1, "one edge per step");
            grown.extend(added);
            if status == StepStatus::Done {
                break;
            }
        }

        // Ties go to the lowest outside node, then the lowest tree node: 3 reaches 0
        // before 2, and 2 is finally joined from 1 rather than from 3.
        assert_eq!(grown, vec![(3, 0), (0, 1), (1, 2)]);
        stage.post_step(&mut ctx).expect("post step");
        assert!(!ctx.tree.has_edge(ids[2], ids[3]));
        assert_eq!(ctx.tree.total_weight(), 3);
    }

    #[test]
    fn disconnected_components_are_bridged() {
        let rooms = rooms_at(&[(0, 0), (2, 0), (30, 0), (32, 0)]);
        let mut graph = Graph::default();
        graph.add_edge(&rooms[0], &rooms[1]);
        graph.add_edge(&rooms[2], &rooms[3]);
        let tree = reduce(&graph);
        assert_eq!(tree.edge_count(), 3);
        assert!(tree.is_connected());
    }

    #[test]
    fn single_room_tree_is_trivially_complete() {
        let rooms = rooms_at(&[(4, 4)]);
        let mut graph = Graph::default();
        graph.ensure_node(&rooms[0]);
        let tree = reduce(&graph);
        assert_eq!(tree.edge_count(), 0);
        assert!(tree.is_connected());
    }
}
