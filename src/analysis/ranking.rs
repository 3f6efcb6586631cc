use petgraph::graph::NodeIndex;
use std::cmp::Reverse;

use crate::graph::{ClassGraph, Depth, TypeNode};

/// Presentation order: shallow first, then heavier (more transitive
/// dependencies) first, then by name. Names are unique, so no two nodes of
/// one graph compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RankKey<'a> {
    pub depth: Depth,
    pub weight: Reverse<usize>,
    pub name: &'a str,
}

impl<'a> RankKey<'a> {
    pub fn of(node: &'a TypeNode) -> Self {
        Self {
            depth: node.depth,
            weight: Reverse(node.transitive_count),
            name: &node.name,
        }
    }
}

/// Every node in ranking order
pub fn ranked(graph: &ClassGraph) -> Vec<NodeIndex> {
    ranked_subset(graph, graph.node_indices())
}

/// The given nodes in ranking order
pub fn ranked_subset(graph: &ClassGraph, nodes: impl IntoIterator<Item = NodeIndex>) -> Vec<NodeIndex> {
    let mut keyed: Vec<(RankKey<'_>, NodeIndex)> = nodes
        .into_iter()
        .map(|idx| (RankKey::of(graph.node(idx)), idx))
        .collect();
    keyed.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, idx)| idx).collect()
}

/// Direct dependencies of a node, in ranking order
pub fn ranked_forward(graph: &ClassGraph, idx: NodeIndex) -> Vec<&str> {
    ranked_names(graph, graph.forward(idx))
}

/// Direct dependents of a node, in ranking order
pub fn ranked_backward(graph: &ClassGraph, idx: NodeIndex) -> Vec<&str> {
    ranked_names(graph, graph.backward(idx))
}

fn ranked_names(graph: &ClassGraph, nodes: impl IntoIterator<Item = NodeIndex>) -> Vec<&str> {
    ranked_subset(graph, nodes)
        .into_iter()
        .map(|idx| graph.node(idx).name.as_str())
        .collect()
}
