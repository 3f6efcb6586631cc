// Graph module - class-level dependency graph

mod builder;
mod ingest;
mod node;

pub use builder::GraphBuilder;
pub use ingest::{ingest_archive, ArchiveIngest, IngestError, IngestOptions, SkippedUnit};
pub use node::{Depth, TypeNode};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Directed graph of types: an edge `A -> B` means A depends on B.
///
/// Nodes live in a single arena and are never removed, so a node's
/// `NodeIndex` is its dense id, assigned in order of first discovery.
/// Forward and backward neighbours are the outgoing and incoming edges of
/// the same edge set, which keeps them mutual.
#[derive(Debug, Clone, Default)]
pub struct ClassGraph {
    inner: DiGraph<TypeNode, ()>,

    /// Map from class name to node index
    index: HashMap<String, NodeIndex>,
}

impl ClassGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// Look up a node by name, creating it if needed. Returns whether the
    /// node was created by this call.
    pub fn get_or_insert(&mut self, name: &str, defined: bool) -> (NodeIndex, bool) {
        if let Some(&idx) = self.index.get(name) {
            return (idx, false);
        }
        let id = self.inner.node_count();
        let idx = self.inner.add_node(TypeNode::new(name.to_string(), id, defined));
        debug_assert_eq!(idx.index(), id);
        self.index.insert(name.to_string(), idx);
        (idx, true)
    }

    /// Record that `from` depends on `to`. Self edges and repeated edges are
    /// ignored; returns whether an edge was added.
    pub fn add_dependency(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        if from == to || self.inner.find_edge(from, to).is_some() {
            return false;
        }
        self.inner.add_edge(from, to, ());
        true
    }

    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &TypeNode {
        &self.inner[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut TypeNode {
        &mut self.inner[idx]
    }

    pub fn get(&self, name: &str) -> Option<&TypeNode> {
        self.find(name).map(|idx| &self.inner[idx])
    }

    /// Node indices in id order
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TypeNode> + '_ {
        self.inner.node_weights()
    }

    /// Direct dependencies
    pub fn forward(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.neighbors_directed(idx, Direction::Outgoing)
    }

    /// Direct dependents
    pub fn backward(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.neighbors_directed(idx, Direction::Incoming)
    }

    pub fn direct_count(&self, idx: NodeIndex) -> usize {
        self.forward(idx).count()
    }

    /// Names of the direct dependencies, sorted
    pub fn forward_names(&self, idx: NodeIndex) -> Vec<&str> {
        self.sorted_names(self.forward(idx))
    }

    /// Names of the direct dependents, sorted
    pub fn backward_names(&self, idx: NodeIndex) -> Vec<&str> {
        self.sorted_names(self.backward(idx))
    }

    /// Names of every node in the transitive set, sorted
    pub fn transitive_names(&self, idx: NodeIndex) -> Vec<&str> {
        let ids = self.inner[idx].transitive.ones().map(NodeIndex::new);
        self.sorted_names(ids)
    }

    fn sorted_names(&self, nodes: impl Iterator<Item = NodeIndex>) -> Vec<&str> {
        let mut names: Vec<&str> = nodes.map(|n| self.inner[n].name.as_str()).collect();
        names.sort_unstable();
        names
    }
}
