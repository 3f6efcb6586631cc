use petgraph::graph::NodeIndex;
use std::collections::VecDeque;

use crate::graph::{ClassGraph, Depth};

/// Assigns each node its minimum distance from the roots
pub struct DepthAnalyzer;

impl DepthAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Breadth-first relaxation from one root. A node is lowered only when the
    /// proposed depth is strictly smaller, and only then propagates
    /// `depth + 1` to its dependencies, so several roots can seed it
    /// independently and each node ends at its minimum over all roots.
    pub fn assign(&self, graph: &mut ClassGraph, root: NodeIndex) {
        let mut queue = VecDeque::from([(root, 0u32)]);
        let mut next = Vec::new();

        while let Some((idx, depth)) = queue.pop_front() {
            let proposed = Depth::Reached(depth);
            let node = graph.node_mut(idx);
            if proposed >= node.depth {
                continue;
            }
            node.depth = proposed;

            next.clear();
            next.extend(graph.forward(idx));
            queue.extend(next.iter().map(|&child| (child, depth + 1)));
        }
    }

    pub fn assign_all(&self, graph: &mut ClassGraph, roots: &[NodeIndex]) {
        for &root in roots {
            self.assign(graph, root);
        }
    }

    /// Forget every depth
    pub fn reset(&self, graph: &mut ClassGraph) {
        let indices: Vec<_> = graph.node_indices().collect();
        for idx in indices {
            graph.node_mut(idx).depth = Depth::Unreached;
        }
    }
}

impl Default for DepthAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
