//! The dependency graph: path resolution, construction, cycle detection.
//!
//! Build order inside a scan: the resolver canonicalizes import specifiers
//! against the known-file set, the builder folds `FileFacts` into a
//! petgraph `DiGraph` behind a path -> index side table, and the cycle
//! detector runs over the finished graph. The graph is rebuilt from
//! scratch every scan; nothing here mutates across scans.

pub mod builder;
pub mod cycles;
pub mod resolver;

pub use builder::{DependencyGraph, EdgeInfo, GraphBuilder, GraphNode};
pub use cycles::{find_cycles, CycleReport};
pub use resolver::{PathResolver, Resolution};
