use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

use super::ProjectDescriptor;
use crate::analysis::{ClosureEngine, DanglingReference, DepthAnalyzer};
use crate::config::NameFilter;
use crate::discovery::{ArchiveCoordinate, ArchiveSource};
use crate::graph::{ingest_archive, ArchiveIngest, ClassGraph, IngestError, IngestOptions};
use crate::parser::DependencyExtractor;

/// One archive of a project
#[derive(Debug, Clone)]
pub struct ArchiveNode {
    pub id: String,
    pub coordinate: ArchiveCoordinate,

    /// Classpath children, as positions in the project's archive list
    pub children: Vec<usize>,

    /// Classes this archive defines, in entry order
    pub classes: Vec<String>,

    /// Entries that could not be decoded
    pub skipped: usize,
}

/// Archives, their classes and the class graph over all of them.
///
/// Class edges span archives; a class defined by several archives is a
/// single node whose `containing_archives` counts them.
#[derive(Debug, Clone)]
pub struct ProjectModel {
    archives: Vec<ArchiveNode>,
    extractor: DependencyExtractor,
    graph: ClassGraph,

    /// First archive to define each class
    owners: HashMap<String, usize>,

    dangling: Vec<DanglingReference>,
    linked: bool,
}

impl ProjectModel {
    pub fn new(descriptor: ProjectDescriptor, system: NameFilter) -> Self {
        let mut archives: Vec<ArchiveNode> = descriptor
            .archives
            .into_iter()
            .map(|entry| ArchiveNode {
                id: entry.id,
                coordinate: entry.coordinate,
                children: Vec::new(),
                classes: Vec::new(),
                skipped: 0,
            })
            .collect();
        for (parent, child) in descriptor.edges {
            if !archives[parent].children.contains(&child) {
                archives[parent].children.push(child);
            }
        }

        Self {
            archives,
            extractor: DependencyExtractor::new(system),
            graph: ClassGraph::new(),
            owners: HashMap::new(),
            dangling: Vec::new(),
            linked: false,
        }
    }

    pub fn archives(&self) -> &[ArchiveNode] {
        &self.archives
    }

    pub fn archive(&self, index: usize) -> &ArchiveNode {
        &self.archives[index]
    }

    pub fn graph(&self) -> &ClassGraph {
        &self.graph
    }

    pub fn extractor(&self) -> &DependencyExtractor {
        &self.extractor
    }

    /// References to classes no archive defines, available after [`link`](Self::link)
    pub fn dangling(&self) -> &[DanglingReference] {
        &self.dangling
    }

    /// Breadth-first over classpath edges from the first archive, then any
    /// archive not reachable from it, in declaration order. Among duplicate
    /// definitions the first one ingested wins.
    pub fn ingestion_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.archives.len());
        let mut seen = vec![false; self.archives.len()];
        let mut queue = VecDeque::new();

        for start in 0..self.archives.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            queue.push_back(start);
            while let Some(index) = queue.pop_front() {
                order.push(index);
                for &child in &self.archives[index].children {
                    if !seen[child] {
                        seen[child] = true;
                        queue.push_back(child);
                    }
                }
            }
        }
        order
    }

    /// Ingest the classes of archive `index` from `source`
    pub fn ingest(
        &mut self,
        index: usize,
        source: &mut dyn ArchiveSource,
        options: IngestOptions,
    ) -> Result<ArchiveIngest, IngestError> {
        let ingest = ingest_archive(&mut self.extractor, source, options)?;
        let mut seen: HashSet<String> = self.archives[index].classes.iter().cloned().collect();

        for (name, _) in &ingest.units {
            // Multi-release archives may hold the same class more than once
            if !seen.insert(name.clone()) {
                continue;
            }
            let (idx, created) = self.graph.get_or_insert(name, true);
            if created {
                self.owners.insert(name.clone(), index);
            } else {
                self.graph.node_mut(idx).containing_archives += 1;
                if let Some(&owner) = self.owners.get(name) {
                    debug!(
                        "{} is defined in both {} and {}",
                        name, self.archives[owner].coordinate, self.archives[index].coordinate
                    );
                }
            }
            self.archives[index].classes.push(name.clone());
        }
        self.archives[index].skipped += ingest.skipped.len();

        debug!(
            "{}: {} classes ({} new)",
            self.archives[index].coordinate,
            self.archives[index].classes.len(),
            ingest.recorded()
        );
        Ok(ingest)
    }

    /// Add every recorded dependency between defined classes. References to
    /// classes no archive defines are collected instead.
    pub fn link(&mut self) {
        if self.linked {
            return;
        }
        let indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        for idx in indices {
            let name = self.graph.node(idx).name.clone();
            for dependency in self.extractor.dependencies(&name) {
                match self.graph.find(dependency) {
                    Some(target) => {
                        self.graph.add_dependency(idx, target);
                    }
                    None => self.dangling.push(DanglingReference {
                        from: name.clone(),
                        to: dependency.clone(),
                    }),
                }
            }
        }
        self.dangling.sort();
        if !self.dangling.is_empty() {
            warn!("{} references to classes no archive defines", self.dangling.len());
        }
        self.linked = true;
    }

    /// Link, then assign depths from the roots and compute closures.
    ///
    /// With an empty filter the roots are the classes of the first archive.
    pub fn analyze(&mut self, roots: &NameFilter) -> Vec<NodeIndex> {
        self.link();

        let root_nodes: Vec<NodeIndex> = if roots.is_empty() {
            self.archives
                .first()
                .map(|archive| archive.classes.iter().filter_map(|name| self.graph.find(name)).collect())
                .unwrap_or_default()
        } else {
            self.graph
                .node_indices()
                .filter(|&idx| roots.matches(&self.graph.node(idx).name))
                .collect()
        };
        info!("Analysing project from {} roots", root_nodes.len());

        let depth = DepthAnalyzer::new();
        depth.reset(&mut self.graph);
        depth.assign_all(&mut self.graph, &root_nodes);
        ClosureEngine::new().compute(&mut self.graph);
        root_nodes
    }
}
