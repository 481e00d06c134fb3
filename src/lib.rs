//! archmap - dependency graph construction and analysis
//!
//! Scans a source tree, extracts structural facts per file (imports,
//! exports, symbols, approximate complexity), assembles a directed
//! dependency multigraph, and reports architectural issues: circular
//! dependencies, isolated files, duplicate dependency patterns, and
//! high-coupling hubs.
//!
//! # Architecture
//!
//! ```text
//! File Discovery → Fact Extraction → Resolution → Graph → Analysis → Output
//!       ↓               ↓               ↓           ↓         ↓         ↓
//!    ignore          regex per       alias +    petgraph   cycles/   serde_json
//!    crate           language       path match   DiGraph   metrics   or summary
//! ```
//!
//! Determinism is a design goal throughout: discovery sorts its results,
//! extraction preserves input order, all analysis iterates sorted
//! collections, and serialization carries no timestamps - the same tree
//! always produces byte-identical output.

pub mod config;
pub mod discovery;
pub mod extraction;
pub mod graph;
pub mod issues;
pub mod metrics;
pub mod report;
pub mod scan;
pub mod serialize;
pub mod types;

// Re-export core types
pub use types::{
    Cycle, ExportRef, FileFacts, ImportKind, ImportRef, Issue, IssueKind, Language, NodeId,
    Severity, Symbol,
};

// Re-export the pipeline surface
pub use config::ScanConfig;
pub use graph::{DependencyGraph, GraphBuilder, PathResolver};
pub use scan::{run_scan, CancelToken, ScanOutcome, ScanReport};
pub use serialize::SerializedGraph;
