//! Transitive dependency sets
//!
//! Every node starts with its direct dependencies. Nodes are then popped
//! from a pending set, lowest id first, and their set is pushed into each
//! direct dependent together with the node's own id. A dependent whose
//! cardinality grew goes back into the pending set. Cardinalities only grow
//! and are bounded by the node count, so this reaches a fixed point: each
//! set is exactly what its node reaches through one or more forward edges.

use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::graph::ClassGraph;

/// Counters from one closure run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureStats {
    /// Pending nodes processed
    pub pops: usize,

    /// Unions performed
    pub unions: usize,
}

pub struct ClosureEngine;

impl ClosureEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute every node's transitive set and cached count from scratch
    pub fn compute(&self, graph: &mut ClassGraph) -> ClosureStats {
        let n = graph.node_count();
        let mut stats = ClosureStats::default();

        let mut sets: Vec<FixedBitSet> = Vec::with_capacity(n);
        let mut dependents: Vec<Vec<usize>> = Vec::with_capacity(n);
        for idx in graph.node_indices() {
            let mut set = FixedBitSet::with_capacity(n);
            for dependency in graph.forward(idx) {
                set.insert(dependency.index());
            }
            sets.push(set);
            dependents.push(graph.backward(idx).map(NodeIndex::index).collect());
        }
        let mut counts: Vec<usize> = sets.iter().map(|set| set.count_ones(..)).collect();

        let mut pending = FixedBitSet::with_capacity(n);
        pending.insert_range(..);
        // Ids below the cursor are not pending unless re-marked
        let mut cursor = 0;

        while let Some(id) = next_pending(&pending, &mut cursor) {
            pending.set(id, false);
            stats.pops += 1;

            for &dependent in &dependents[id] {
                let (target, source) = pair_mut(&mut sets, dependent, id);
                target.union_with(source);
                target.insert(id);
                stats.unions += 1;

                let count = target.count_ones(..);
                if count > counts[dependent] {
                    counts[dependent] = count;
                    pending.insert(dependent);
                    cursor = cursor.min(dependent);
                }
            }
        }

        for (id, (set, count)) in sets.into_iter().zip(counts).enumerate() {
            let node = graph.node_mut(NodeIndex::new(id));
            node.transitive = set;
            node.transitive_count = count;
        }

        debug!("Closure over {} nodes: {} pops, {} unions", n, stats.pops, stats.unions);
        stats
    }
}

impl Default for ClosureEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowest pending id at or after `cursor`
fn next_pending(pending: &FixedBitSet, cursor: &mut usize) -> Option<usize> {
    let blocks = pending.as_slice();
    let bits = u32::BITS as usize;
    let mut block = *cursor / bits;
    while block < blocks.len() {
        let mut word = blocks[block];
        if block == *cursor / bits {
            word &= u32::MAX.checked_shl((*cursor % bits) as u32).unwrap_or(0);
        }
        if word != 0 {
            let id = block * bits + word.trailing_zeros() as usize;
            *cursor = id;
            return Some(id);
        }
        block += 1;
    }
    *cursor = pending.len();
    None
}

/// Borrow `sets[target]` mutably and `sets[source]` shared; the two differ
/// because the graph has no self edges.
fn pair_mut(sets: &mut [FixedBitSet], target: usize, source: usize) -> (&mut FixedBitSet, &FixedBitSet) {
    debug_assert_ne!(target, source);
    if target < source {
        let (left, right) = sets.split_at_mut(source);
        (&mut left[target], &right[0])
    } else {
        let (left, right) = sets.split_at_mut(target);
        (&mut right[0], &left[source])
    }
}
