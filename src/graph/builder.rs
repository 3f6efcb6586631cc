use petgraph::graph::NodeIndex;
use tracing::trace;

use super::ClassGraph;
use crate::parser::DependencyExtractor;

/// Expands roots into a class graph using the dependencies recorded by a
/// [`DependencyExtractor`]
pub struct GraphBuilder<'a> {
    extractor: &'a DependencyExtractor,

    /// The graph being built
    graph: ClassGraph,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(extractor: &'a DependencyExtractor) -> Self {
        Self {
            extractor,
            graph: ClassGraph::new(),
        }
    }

    /// Add `root` and everything transitively reachable from it.
    ///
    /// A node's dependencies are walked only when the node is first created,
    /// so cycles terminate and every edge is recorded once no matter how many
    /// roots reach it. Uses an explicit stack rather than recursion.
    pub fn expand(&mut self, root: &str) -> NodeIndex {
        let (root_idx, created) = self.graph.get_or_insert(root, self.extractor.is_defined(root));
        if !created {
            return root_idx;
        }

        let mut stack = vec![root_idx];
        while let Some(idx) = stack.pop() {
            let name = self.graph.node(idx).name.clone();
            for dependency in self.extractor.dependencies(&name) {
                let (child, created) = self
                    .graph
                    .get_or_insert(dependency, self.extractor.is_defined(dependency));
                self.graph.add_dependency(idx, child);
                if created {
                    trace!("{} -> {}", name, dependency);
                    stack.push(child);
                }
            }
        }

        root_idx
    }

    pub fn graph(&self) -> &ClassGraph {
        &self.graph
    }

    pub fn build(self) -> ClassGraph {
        self.graph
    }
}
