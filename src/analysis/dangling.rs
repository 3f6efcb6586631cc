use serde::Serialize;

use crate::graph::ClassGraph;

/// A dependency on a type that no ingested archive defines
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DanglingReference {
    pub from: String,
    pub to: String,
}

/// Every edge into a node that was never defined, sorted
pub fn find_dangling(graph: &ClassGraph) -> Vec<DanglingReference> {
    let mut dangling = Vec::new();
    for idx in graph.node_indices() {
        let node = graph.node(idx);
        if node.defined {
            continue;
        }
        for from in graph.backward(idx) {
            dangling.push(DanglingReference {
                from: graph.node(from).name.clone(),
                to: node.name.clone(),
            });
        }
    }
    dangling.sort();
    dangling
}
