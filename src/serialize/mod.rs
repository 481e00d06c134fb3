//! Graph serialization - the transport form consumed by storage and
//! visualization.
//!
//! Nodes and edges are flattened into plain serde structs with derived
//! metrics merged in, plus a metadata block of scan-level aggregates.
//! Output is deterministic: nodes sort by id, edges by (from, to,
//! specifier), and nothing carries a timestamp - two scans of the same
//! tree serialize byte-identically.

use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::graph::DependencyGraph;
use crate::metrics::MetricsReport;
use crate::types::{
    ArchLayer, ComplexityBucket, CouplingBucket, ImportKind, Issue, IssueKind, Language, NodeId,
};

/// One node in the transport graph: file attributes + derived metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub id: NodeId,
    pub is_external: bool,
    /// False for placeholder nodes that only exist as edge targets.
    pub scanned: bool,
    pub language: Option<Language>,
    pub lines: u32,
    pub size: u64,
    pub complexity: u32,
    pub functions: usize,
    pub variables: usize,
    pub exports: usize,
    pub fan_in: usize,
    pub fan_out: usize,
    pub coupling: CouplingBucket,
    pub complexity_bucket: ComplexityBucket,
    pub layer: ArchLayer,
}

/// One dependency edge in the transport graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: ImportKind,
    pub specifier: String,
    pub is_dynamic: bool,
    pub low_confidence: bool,
}

/// Scan-level aggregates for dashboards and quick triage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub total_files: usize,
    pub total_lines: u64,
    pub total_dependencies: usize,
    /// Total issue count across all kinds.
    pub conflicts: usize,
    pub circular_dependencies: usize,
    pub isolated_files: usize,
    pub highly_connected_files: usize,
    pub complexity_hotspots: usize,
}

/// The complete serialized scan result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedGraph {
    pub nodes: Vec<SerializedNode>,
    pub edges: Vec<SerializedEdge>,
    pub metadata: GraphMetadata,
    pub issues: Vec<Issue>,
    /// True when cycle enumeration hit its budget and the circular
    /// dependency list may be incomplete.
    pub cycles_truncated: bool,
}

/// Flatten graph + metrics + issues into the transport form.
pub fn serialize_graph(
    graph: &DependencyGraph,
    metrics: &MetricsReport,
    issues: &[Issue],
    cycles_truncated: bool,
) -> SerializedGraph {
    let mut nodes: Vec<SerializedNode> = graph
        .nodes()
        .map(|node| {
            let m = metrics.per_node.get(&node.id);
            SerializedNode {
                id: node.id.clone(),
                is_external: node.is_external(),
                scanned: node.scanned,
                language: node.language,
                lines: node.lines,
                size: node.size,
                complexity: node.complexity,
                functions: node.function_count,
                variables: node.variable_count,
                exports: node.export_count,
                fan_in: m.map(|m| m.fan_in).unwrap_or(0),
                fan_out: m.map(|m| m.fan_out).unwrap_or(0),
                coupling: m.map(|m| m.coupling).unwrap_or(CouplingBucket::Loose),
                complexity_bucket: m.map(|m| m.complexity).unwrap_or(ComplexityBucket::Low),
                layer: m.map(|m| m.layer).unwrap_or(ArchLayer::Infrastructure),
            }
        })
        .collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let inner = graph.inner();
    let mut edges: Vec<SerializedEdge> = inner
        .edge_references()
        .filter_map(|e| {
            let from = inner.node_weight(e.source())?;
            let to = inner.node_weight(e.target())?;
            let info = e.weight();
            Some(SerializedEdge {
                from: from.id.clone(),
                to: to.id.clone(),
                kind: info.kind,
                specifier: info.specifier.clone(),
                is_dynamic: info.is_dynamic,
                low_confidence: info.low_confidence,
            })
        })
        .collect();
    edges.sort_by(|a, b| {
        a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)).then_with(|| a.specifier.cmp(&b.specifier))
    });

    let count = |kind: IssueKind| issues.iter().filter(|i| i.kind == kind).count();
    let metadata = GraphMetadata {
        total_files: metrics.total_files,
        total_lines: metrics.total_lines,
        total_dependencies: metrics.total_dependencies,
        conflicts: issues.len(),
        circular_dependencies: count(IssueKind::CircularDependency),
        isolated_files: count(IssueKind::IsolatedFile),
        highly_connected_files: count(IssueKind::HighCouplingHub),
        complexity_hotspots: metrics.hotspots.len(),
    };

    SerializedGraph {
        nodes,
        edges,
        metadata,
        issues: issues.to_vec(),
        cycles_truncated,
    }
}
