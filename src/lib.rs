//! classvacuum - dependency analysis over compiled JVM classes
//!
//! This library reads class files straight from archives, builds a
//! class-level dependency graph and derives two reports from it: how far
//! each class sits from a set of roots together with everything it
//! transitively depends on, and which archives of a project are unused,
//! used or shadowed by duplicate classes.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Discovery** - Open zip archives or class directories
//! 2. **Parsing** - Decode class files and extract referenced type names
//! 3. **Graph Building** - Expand roots into a class graph
//! 4. **Analysis** - Depth from roots, transitive closure, ranking
//! 5. **Projects** - Multi-archive ingestion and the vacuum report
//! 6. **Reporting** - Output results in terminal or JSON form

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod graph;
pub mod parser;
pub mod project;
pub mod report;

pub use analysis::{ClosureEngine, DependencyTracker, DepthAnalyzer, TrackedGraph, VacuumAnalyzer, VacuumReport};
pub use config::{Config, NameFilter};
pub use discovery::{open_archive, ArchiveCoordinate, ArchiveSource, Repository};
pub use graph::{ClassGraph, Depth, GraphBuilder, IngestOptions, TypeNode};
pub use parser::{decode, extract, DecodeError, DependencyExtractor};
pub use project::{ProjectDescriptor, ProjectModel};
pub use report::{ReportFormat, Reporter};
