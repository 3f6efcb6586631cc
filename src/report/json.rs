use crate::analysis::{ranked_backward, ranked_forward, ArchiveUsage, DanglingReference, TrackedGraph, VacuumReport};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report_tracked(&self, tracked: &TrackedGraph) -> Result<()> {
        self.write(&TrackedJson::from_tracked(tracked))
    }

    pub fn report_vacuum(&self, report: &VacuumReport, removable_only: bool) -> Result<()> {
        let archives = report
            .archives
            .iter()
            .filter(|usage| !removable_only || usage.removable)
            .collect();
        self.write(&VacuumJson {
            version: env!("CARGO_PKG_VERSION"),
            archives,
            dangling: &report.dangling,
        })
    }

    fn write<T: Serialize>(&self, report: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(report).into_diagnostic()?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            eprintln!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct TrackedJson<'a> {
    version: &'static str,
    total_classes: usize,
    roots: Vec<&'a str>,
    nodes: Vec<NodeJson<'a>>,
    dangling: &'a [DanglingReference],
}

#[derive(Serialize)]
struct NodeJson<'a> {
    name: &'a str,
    depth: Option<u32>,
    defined: bool,
    direct_count: usize,
    transitive_count: usize,
    dependencies: Vec<&'a str>,
    dependents: Vec<&'a str>,
}

impl<'a> TrackedJson<'a> {
    fn from_tracked(tracked: &'a TrackedGraph) -> Self {
        let graph = &tracked.graph;
        let nodes = tracked
            .ranked()
            .into_iter()
            .map(|idx| {
                let node = graph.node(idx);
                NodeJson {
                    name: &node.name,
                    depth: node.depth.value(),
                    defined: node.defined,
                    direct_count: graph.direct_count(idx),
                    transitive_count: node.transitive_count,
                    dependencies: ranked_forward(graph, idx),
                    dependents: ranked_backward(graph, idx),
                }
            })
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION"),
            total_classes: graph.node_count(),
            roots: tracked.roots.iter().map(|&idx| graph.node(idx).name.as_str()).collect(),
            nodes,
            dangling: &tracked.dangling,
        }
    }
}

#[derive(Serialize)]
struct VacuumJson<'a> {
    version: &'static str,
    archives: Vec<&'a ArchiveUsage>,
    dangling: &'a [DanglingReference],
}
