// Analysis module - depth, closure, ranking and the reports built on them

mod closure;
mod dangling;
mod depth;
mod ranking;
mod tracker;
mod vacuum;

pub use closure::{ClosureEngine, ClosureStats};
pub use dangling::{find_dangling, DanglingReference};
pub use depth::DepthAnalyzer;
pub use ranking::{ranked, ranked_backward, ranked_forward, ranked_subset, RankKey};
pub use tracker::{DependencyTracker, TrackedGraph};
pub use vacuum::{ArchiveUsage, VacuumAnalyzer, VacuumReport};
