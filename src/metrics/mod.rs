//! Per-node and per-graph metrics.
//!
//! Derives fan-in/fan-out, coupling and complexity buckets, architecture
//! layers, and hotspot rankings from the built graph. Every threshold
//! comes from `ScanConfig` - nothing here hard-codes a bucket boundary.
//!
//! Metrics live in a side table keyed by node id rather than being written
//! back into the graph: the graph stays read-only after the build phase,
//! which keeps this pass trivially parallelizable if it ever needs to be.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{ComplexityThresholds, CouplingThresholds, ScanConfig};
use crate::graph::DependencyGraph;
use crate::types::{ArchLayer, ComplexityBucket, CouplingBucket, NodeId};

/// Derived metrics for a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub fan_in: usize,
    pub fan_out: usize,
    pub coupling: CouplingBucket,
    pub complexity: ComplexityBucket,
    pub layer: ArchLayer,
}

/// Whole-graph metrics report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Per-node metrics, keyed by id. BTreeMap for deterministic iteration.
    pub per_node: BTreeMap<NodeId, NodeMetrics>,
    /// Nodes whose complexity exceeds the "high" threshold, sorted by
    /// descending complexity (ties broken by id for reproducibility).
    pub hotspots: Vec<NodeId>,
    /// How many internal files landed in each architecture layer.
    pub layer_distribution: BTreeMap<ArchLayer, usize>,
    pub total_files: usize,
    pub total_lines: u64,
    /// Distinct (from, to) dependency pairs across the graph.
    pub total_dependencies: usize,
}

/// Classify fan-out against configured coupling thresholds.
pub fn coupling_bucket(fan_out: usize, thresholds: &CouplingThresholds) -> CouplingBucket {
    if fan_out <= thresholds.loose {
        CouplingBucket::Loose
    } else if fan_out <= thresholds.moderate {
        CouplingBucket::Moderate
    } else if fan_out <= thresholds.tight {
        CouplingBucket::Tight
    } else {
        CouplingBucket::VeryTight
    }
}

/// Classify file complexity against configured thresholds.
pub fn complexity_bucket(complexity: u32, thresholds: &ComplexityThresholds) -> ComplexityBucket {
    if complexity <= thresholds.low {
        ComplexityBucket::Low
    } else if complexity <= thresholds.medium {
        ComplexityBucket::Medium
    } else if complexity <= thresholds.high {
        ComplexityBucket::High
    } else {
        ComplexityBucket::Critical
    }
}

/// Directory-name heuristics for layer classification.
///
/// Best-effort: a node whose path matches no heuristic is Infrastructure.
/// Matching is per path segment, substring, case-insensitive - "Components"
/// and "page-components" both read as presentation.
pub fn classify_layer(id: &str) -> ArchLayer {
    const PRESENTATION: &[&str] = &["component", "page", "view", "screen", "ui", "widget", "layout"];
    const BUSINESS: &[&str] = &["service", "controller", "handler", "usecase", "domain", "logic", "api"];
    const DATA: &[&str] = &["model", "entity", "repository", "repositories", "schema", "store", "db", "dao", "migration"];
    const SHARED: &[&str] = &["util", "helper", "common", "shared", "lib", "constant"];

    for segment in id.split('/') {
        let segment = segment.to_ascii_lowercase();
        if PRESENTATION.iter().any(|k| segment.contains(k)) {
            return ArchLayer::Presentation;
        }
        if BUSINESS.iter().any(|k| segment.contains(k)) {
            return ArchLayer::Business;
        }
        if DATA.iter().any(|k| segment.contains(k)) {
            return ArchLayer::Data;
        }
        if SHARED.iter().any(|k| segment.contains(k)) {
            return ArchLayer::Shared;
        }
    }
    ArchLayer::Infrastructure
}

/// Compute the full metrics report for a built graph.
pub fn compute_metrics(graph: &DependencyGraph, config: &ScanConfig) -> MetricsReport {
    let mut per_node = BTreeMap::new();
    let mut layer_distribution: BTreeMap<ArchLayer, usize> = BTreeMap::new();
    let mut total_files = 0usize;
    let mut total_lines = 0u64;
    let mut total_dependencies = 0usize;

    for idx in graph.node_indices() {
        let node = match graph.node(idx) {
            Some(node) => node,
            None => continue,
        };

        let fan_out = graph.fan_out(idx);
        let fan_in = graph.fan_in(idx);
        total_dependencies += fan_out;

        let layer = if node.is_external() {
            // External packages sit outside the app's layering.
            ArchLayer::Infrastructure
        } else {
            classify_layer(&node.id)
        };

        if node.scanned {
            total_files += 1;
            total_lines += u64::from(node.lines);
            *layer_distribution.entry(layer).or_insert(0) += 1;
        }

        per_node.insert(
            node.id.clone(),
            NodeMetrics {
                fan_in,
                fan_out,
                coupling: coupling_bucket(fan_out, &config.coupling),
                complexity: complexity_bucket(node.complexity, &config.complexity),
                layer,
            },
        );
    }

    // Hotspots: complexity strictly above the "high" boundary.
    let mut hotspots: Vec<(u32, NodeId)> = graph
        .nodes()
        .filter(|n| n.scanned && n.complexity > config.complexity.high)
        .map(|n| (n.complexity, n.id.clone()))
        .collect();
    hotspots.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    MetricsReport {
        per_node,
        hotspots: hotspots.into_iter().map(|(_, id)| id).collect(),
        layer_distribution,
        total_files,
        total_lines,
        total_dependencies,
    }
}
