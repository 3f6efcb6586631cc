//! Graph construction, depth, closure and ranking tests

mod support;

use std::collections::BTreeSet;

use classvacuum::analysis::{ranked, RankKey};
use classvacuum::discovery::{DirectoryArchive, MemoryArchive};
use classvacuum::graph::{ingest_archive, IngestOptions};
use classvacuum::parser::UnitDependencies;
use classvacuum::{ClassGraph, ClosureEngine, Depth, DependencyExtractor, DependencyTracker, NameFilter};
use petgraph::graph::NodeIndex;
use support::*;

fn extractor(units: &[(&str, &[&str])]) -> DependencyExtractor {
    let mut extractor = DependencyExtractor::default();
    for (name, deps) in units {
        extractor.record(UnitDependencies {
            name: name.to_string(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
        });
    }
    extractor
}

fn transitive(graph: &ClassGraph, name: &str) -> Vec<String> {
    let idx = graph.find(name).unwrap();
    graph.transitive_names(idx).into_iter().map(String::from).collect()
}

fn depth(graph: &ClassGraph, name: &str) -> Depth {
    graph.get(name).unwrap().depth
}

/// Deterministic generator for reproducible random graphs
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

fn random_units(seed: u64, nodes: usize, edges: usize) -> Vec<(String, Vec<String>)> {
    let mut rng = Lcg(seed);
    let mut units: Vec<(String, Vec<String>)> = (0..nodes).map(|i| (format!("g.C{:03}", i), Vec::new())).collect();
    for _ in 0..edges {
        let from = rng.next(nodes);
        let to = rng.next(nodes + nodes / 4);
        // Targets past the last class are never defined
        units[from].1.push(format!("g.C{:03}", to));
    }
    units
}

fn extractor_from(units: &[(String, Vec<String>)]) -> DependencyExtractor {
    let mut extractor = DependencyExtractor::default();
    for (name, deps) in units {
        extractor.record(UnitDependencies {
            name: name.clone(),
            dependencies: deps.iter().filter(|d| *d != name).cloned().collect(),
        });
    }
    extractor
}

#[test]
fn test_cycle_through_root() {
    // Root -> A, A -> B, B -> A
    let mut archive = MemoryArchive::new("cycle")
        .with_entry(entry_name("p/Root"), class_with_refs("p/Root", &["p/A"]))
        .with_entry(entry_name("p/A"), class_with_refs("p/A", &["p/B"]))
        .with_entry(entry_name("p/B"), class_with_refs("p/B", &["p/A"]));
    let mut extractor = DependencyExtractor::default();
    ingest_archive(&mut extractor, &mut archive, IngestOptions::default()).unwrap();

    let tracked = DependencyTracker::new(NameFilter::with_prefixes(["p.Root"])).track(&extractor);
    let graph = &tracked.graph;

    assert_eq!(depth(graph, "p.Root"), Depth::Reached(0));
    assert_eq!(depth(graph, "p.A"), Depth::Reached(1));
    assert_eq!(depth(graph, "p.B"), Depth::Reached(2));

    assert_eq!(transitive(graph, "p.Root"), vec!["p.A", "p.B"]);
    assert_eq!(transitive(graph, "p.A"), vec!["p.A", "p.B"]);
    assert_eq!(transitive(graph, "p.B"), vec!["p.A", "p.B"]);

    let order: Vec<&str> = tracked.ranked().into_iter().map(|idx| graph.node(idx).name.as_str()).collect();
    assert_eq!(order, vec!["p.Root", "p.A", "p.B"]);
}

#[test]
fn test_closure_matches_reachability_for_every_four_node_graph() {
    let pairs: Vec<(usize, usize)> = (0..4)
        .flat_map(|a| (0..4).filter(move |&b| b != a).map(move |b| (a, b)))
        .collect();
    assert_eq!(pairs.len(), 12);

    for mask in 0u32..(1 << pairs.len()) {
        let mut graph = ClassGraph::new();
        let nodes: Vec<NodeIndex> = (0..4).map(|i| graph.get_or_insert(&format!("n{}", i), true).0).collect();
        let mut adjacency = [[false; 4]; 4];
        for (bit, &(a, b)) in pairs.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                graph.add_dependency(nodes[a], nodes[b]);
                adjacency[a][b] = true;
            }
        }

        ClosureEngine::new().compute(&mut graph);
        let first: Vec<Vec<usize>> = nodes
            .iter()
            .map(|&idx| graph.node(idx).transitive.ones().collect())
            .collect();

        for start in 0..4 {
            // Reachable through one or more edges
            let mut reached = [false; 4];
            let mut stack: Vec<usize> = (0..4).filter(|&b| adjacency[start][b]).collect();
            while let Some(node) = stack.pop() {
                if reached[node] {
                    continue;
                }
                reached[node] = true;
                stack.extend((0..4).filter(|&b| adjacency[node][b]));
            }
            let expected: Vec<usize> = (0..4).filter(|&i| reached[i]).map(|i| nodes[i].index()).collect();

            assert_eq!(first[start], expected, "mask {:012b}, node {}", mask, start);
            assert_eq!(graph.node(nodes[start]).transitive_count, expected.len());
        }

        // A second run changes nothing
        ClosureEngine::new().compute(&mut graph);
        for (i, &idx) in nodes.iter().enumerate() {
            let again: Vec<usize> = graph.node(idx).transitive.ones().collect();
            assert_eq!(again, first[i], "closure not idempotent for mask {:012b}", mask);
        }
    }
}

#[test]
fn test_depth_is_minimal_over_edges() {
    for seed in 1..20 {
        let units = random_units(seed, 60, 150);
        let extractor = extractor_from(&units);
        let roots = NameFilter::with_prefixes(["g.C000", "g.C001", "g.C002"]);
        let tracked = DependencyTracker::new(roots).track(&extractor);
        let graph = &tracked.graph;

        for &root in &tracked.roots {
            assert_eq!(graph.node(root).depth, Depth::ROOT);
        }
        for idx in graph.node_indices() {
            let Depth::Reached(from) = graph.node(idx).depth else {
                continue;
            };
            for next in graph.forward(idx) {
                match graph.node(next).depth {
                    Depth::Reached(to) => assert!(to <= from + 1, "seed {}: depth jumps past an edge", seed),
                    Depth::Unreached => panic!("seed {}: successor of a reached node is unreached", seed),
                }
            }
        }
    }
}

#[test]
fn test_ranking_is_strict_and_deterministic() {
    let units = random_units(7, 80, 240);
    let first = DependencyTracker::new(NameFilter::with_prefixes(["g.C00"])).track(&extractor_from(&units));
    let second = DependencyTracker::new(NameFilter::with_prefixes(["g.C00"])).track(&extractor_from(&units));

    let order = first.ranked();
    assert_eq!(order.len(), first.graph.node_count());
    for pair in order.windows(2) {
        let a = RankKey::of(first.graph.node(pair[0]));
        let b = RankKey::of(first.graph.node(pair[1]));
        assert!(a < b, "{:?} does not rank before {:?}", a, b);
    }

    let names = |tracked: &classvacuum::TrackedGraph| -> Vec<String> {
        tracked
            .ranked()
            .into_iter()
            .map(|idx| tracked.graph.node(idx).name.clone())
            .collect()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(ranked(&first.graph), order);
}

#[test]
fn test_no_self_edges_and_mutual_adjacency() {
    let units = random_units(11, 40, 160);
    let tracked = DependencyTracker::new(NameFilter::default()).track(&extractor_from(&units));
    let graph = &tracked.graph;

    for idx in graph.node_indices() {
        assert!(graph.forward(idx).all(|next| next != idx));
        for next in graph.forward(idx) {
            assert!(graph.backward(next).any(|prev| prev == idx));
        }
        for prev in graph.backward(idx) {
            assert!(graph.forward(prev).any(|next| next == idx));
        }
    }
}

#[test]
fn test_every_class_is_a_root_without_prefixes() {
    let extractor = extractor(&[("a.One", &["a.Two"]), ("a.Two", &[]), ("a.Three", &["a.Missing"])]);
    let tracked = DependencyTracker::new(NameFilter::default()).track(&extractor);

    assert_eq!(tracked.roots.len(), 3);
    assert_eq!(depth(&tracked.graph, "a.Two"), Depth::ROOT);
    assert_eq!(depth(&tracked.graph, "a.Missing"), Depth::Reached(1));

    let missing = tracked.graph.get("a.Missing").unwrap();
    assert!(!missing.defined);
    assert_eq!(tracked.dangling.len(), 1);
    assert_eq!(tracked.dangling[0].from, "a.Three");
    assert_eq!(tracked.dangling[0].to, "a.Missing");
}

#[test]
fn test_unmatched_classes_stay_out_of_the_graph() {
    let extractor = extractor(&[("app.Main", &["lib.Used"]), ("lib.Used", &[]), ("lib.Unused", &[])]);
    let tracked = DependencyTracker::new(NameFilter::with_prefixes(["app."])).track(&extractor);

    assert!(tracked.graph.find("lib.Unused").is_none());
    let tiers = tracked.tiers();
    let tier_sizes: Vec<(Depth, usize)> = tiers.iter().map(|(depth, nodes)| (*depth, nodes.len())).collect();
    assert_eq!(tier_sizes, vec![(Depth::Reached(0), 1), (Depth::Reached(1), 1)]);
}

#[test]
fn test_directory_ingest_parallel_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = Vec::new();
    for i in 0..30 {
        let name = format!("d/C{:02}", i);
        let deps = [format!("d/C{:02}", (i * 7 + 3) % 30), format!("d/C{:02}", (i + 1) % 30)];
        let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
        entries.push((entry_name(&name), class_with_refs(&name, &deps)));
    }
    entries.push(("d/broken.class".to_string(), vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0]));
    write_class_dir(dir.path(), &entries);

    let run = |parallel: bool| {
        let mut extractor = DependencyExtractor::default();
        let mut source = DirectoryArchive::new(dir.path());
        let ingest = ingest_archive(&mut extractor, &mut source, IngestOptions { strict: false, parallel }).unwrap();
        let tracked = DependencyTracker::new(NameFilter::with_prefixes(["d.C00"])).track(&extractor);
        let summary: Vec<(String, Depth, usize)> = tracked
            .ranked()
            .into_iter()
            .map(|idx| {
                let node = tracked.graph.node(idx);
                (node.name.clone(), node.depth, node.transitive_count)
            })
            .collect();
        (ingest.units.len(), ingest.skipped.len(), summary)
    };

    let sequential = run(false);
    assert_eq!(sequential.0, 30);
    assert_eq!(sequential.1, 1);
    assert_eq!(sequential, run(true));
}

#[test]
fn test_strict_ingest_fails_on_bad_class() {
    let mut archive = MemoryArchive::new("bad")
        .with_entry(entry_name("p/Good"), class_with_refs("p/Good", &[]))
        .with_entry("p/Bad.class", b"not a class".to_vec());
    let mut extractor = DependencyExtractor::default();

    let result = ingest_archive(
        &mut extractor,
        &mut archive,
        IngestOptions {
            strict: true,
            parallel: false,
        },
    );
    assert!(result.is_err());
}

#[test]
fn test_transitive_sets_only_name_graph_nodes() {
    let units = random_units(3, 50, 120);
    let tracked = DependencyTracker::new(NameFilter::with_prefixes(["g.C01"])).track(&extractor_from(&units));
    let graph = &tracked.graph;
    let names: BTreeSet<&str> = graph.nodes().map(|node| node.name.as_str()).collect();

    for idx in graph.node_indices() {
        let node = graph.node(idx);
        assert_eq!(node.transitive.count_ones(..), node.transitive_count);
        for name in graph.transitive_names(idx) {
            assert!(names.contains(name));
        }
        // Direct dependencies are always part of the closure
        for next in graph.forward(idx) {
            assert!(node.transitive.contains(graph.node(next).id()));
        }
    }
}
