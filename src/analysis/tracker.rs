use petgraph::graph::NodeIndex;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::{find_dangling, ranked, ClosureEngine, DanglingReference, DepthAnalyzer};
use crate::config::NameFilter;
use crate::graph::{ClassGraph, Depth, GraphBuilder};
use crate::parser::DependencyExtractor;

/// Builds and analyses the class graph of a single project: expand the
/// roots, assign depths, close.
pub struct DependencyTracker {
    roots: NameFilter,
}

/// A fully analysed graph
#[derive(Debug, Clone)]
pub struct TrackedGraph {
    pub graph: ClassGraph,
    pub roots: Vec<NodeIndex>,
    pub dangling: Vec<DanglingReference>,
}

impl TrackedGraph {
    /// Node indices in ranking order
    pub fn ranked(&self) -> Vec<NodeIndex> {
        ranked(&self.graph)
    }

    /// Ranked nodes grouped by depth
    pub fn tiers(&self) -> BTreeMap<Depth, Vec<NodeIndex>> {
        let mut tiers: BTreeMap<Depth, Vec<NodeIndex>> = BTreeMap::new();
        for idx in self.ranked() {
            tiers.entry(self.graph.node(idx).depth).or_default().push(idx);
        }
        tiers
    }
}

impl DependencyTracker {
    /// With an empty filter every visited class is a root
    pub fn new(roots: NameFilter) -> Self {
        Self { roots }
    }

    /// Root names among the visited classes, sorted
    pub fn select_roots<'e>(&self, extractor: &'e DependencyExtractor) -> Vec<&'e str> {
        extractor
            .classes()
            .iter()
            .filter(|name| self.roots.is_empty() || self.roots.matches(name))
            .map(String::as_str)
            .collect()
    }

    pub fn track(&self, extractor: &DependencyExtractor) -> TrackedGraph {
        let root_names = self.select_roots(extractor);
        if root_names.is_empty() {
            warn!("No classes match the root prefixes");
        }
        info!("Expanding {} roots", root_names.len());

        let mut builder = GraphBuilder::new(extractor);
        let roots: Vec<NodeIndex> = root_names.iter().map(|name| builder.expand(name)).collect();
        let mut graph = builder.build();
        info!("Graph has {} nodes and {} edges", graph.node_count(), graph.edge_count());

        DepthAnalyzer::new().assign_all(&mut graph, &roots);
        ClosureEngine::new().compute(&mut graph);

        let dangling = find_dangling(&graph);
        for reference in &dangling {
            warn!("{} references {}, which no archive defines", reference.from, reference.to);
        }

        TrackedGraph { graph, roots, dangling }
    }
}
