//! Issue detection - classify graph anomalies into a uniform issue list.
//!
//! Four detectors over the built graph, cycles, and metrics:
//! - every cycle is a `circular_dependency` (error)
//! - internal files with no edges at all are `isolated_file` (warning)
//! - files sharing an identical dependency set form one
//!   `duplicate_dependency_pattern` per group (warning)
//! - fan-out above the very-tight coupling boundary is a
//!   `high_coupling_hub` (warning)
//!
//! Emission order is not semantically meaningful but must be stable:
//! everything is sorted so snapshot tests and reruns see identical output.

use std::collections::BTreeMap;

use crate::config::ScanConfig;
use crate::graph::DependencyGraph;
use crate::metrics::MetricsReport;
use crate::types::{Cycle, Issue, IssueKind, NodeId, Severity};

/// Run all detectors and return the combined, deterministically ordered
/// issue list.
pub fn detect_issues(
    graph: &DependencyGraph,
    cycles: &[Cycle],
    metrics: &MetricsReport,
    config: &ScanConfig,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    issues.extend(circular_dependency_issues(cycles));
    issues.extend(isolated_file_issues(metrics, graph));
    issues.extend(duplicate_pattern_issues(graph));
    issues.extend(high_coupling_issues(metrics, graph, config));
    issues
}

/// One issue per cycle, message listing the chain in traversal order.
fn circular_dependency_issues(cycles: &[Cycle]) -> Vec<Issue> {
    cycles
        .iter()
        .map(|cycle| {
            let mut chain = cycle.nodes.join(" -> ");
            // Close the loop visually: a -> b -> a
            if let Some(first) = cycle.nodes.first() {
                chain.push_str(" -> ");
                chain.push_str(first);
            }
            Issue {
                kind: IssueKind::CircularDependency,
                severity: Severity::Error,
                message: format!("Circular dependency: {chain}"),
                node_ids: cycle.nodes.clone(),
            }
        })
        .collect()
}

/// Internal files with zero fan-in and zero fan-out.
///
/// External nodes are excluded as subjects, and because external deps
/// count toward fan-out, a file that only imports `react` has fan-out 1
/// and is never reported isolated.
fn isolated_file_issues(metrics: &MetricsReport, graph: &DependencyGraph) -> Vec<Issue> {
    let mut issues: Vec<Issue> = metrics
        .per_node
        .iter()
        .filter(|(id, m)| {
            m.fan_in == 0
                && m.fan_out == 0
                && graph.node_by_id(id).map(|n| n.scanned && !n.is_external()).unwrap_or(false)
        })
        .map(|(id, _)| Issue {
            kind: IssueKind::IsolatedFile,
            severity: Severity::Warning,
            message: format!("{id} has no dependencies and no dependents"),
            node_ids: vec![id.clone()],
        })
        .collect();
    // per_node is a BTreeMap, so this is already sorted by id; keep the
    // sort anyway as the stability contract.
    issues.sort_by(|a, b| a.node_ids.cmp(&b.node_ids));
    issues
}

/// Groups of scanned files whose sorted distinct-target sets are identical.
///
/// Only dependency sets with more than one target qualify - single-import
/// overlap is ubiquitous and signals nothing.
fn duplicate_pattern_issues(graph: &DependencyGraph) -> Vec<Issue> {
    let mut groups: BTreeMap<Vec<NodeId>, Vec<NodeId>> = BTreeMap::new();

    for idx in graph.node_indices() {
        let node = match graph.node(idx) {
            Some(n) if n.scanned && !n.is_external() => n,
            _ => continue,
        };
        let targets: Vec<NodeId> =
            graph.distinct_targets(idx).into_iter().map(String::from).collect();
        if targets.len() > 1 {
            groups.entry(targets).or_default().push(node.id.clone());
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(targets, mut members)| {
            members.sort();
            Issue {
                kind: IssueKind::DuplicateDependencyPattern,
                severity: Severity::Warning,
                message: format!(
                    "{} share an identical dependency set ({} targets)",
                    members.join(", "),
                    targets.len()
                ),
                node_ids: members,
            }
        })
        .collect()
}

/// Fan-out beyond the very-tight boundary (`> coupling.tight`).
fn high_coupling_issues(
    metrics: &MetricsReport,
    graph: &DependencyGraph,
    config: &ScanConfig,
) -> Vec<Issue> {
    let mut issues: Vec<Issue> = metrics
        .per_node
        .iter()
        .filter(|(id, m)| {
            m.fan_out > config.coupling.tight
                && graph.node_by_id(id).map(|n| !n.is_external()).unwrap_or(false)
        })
        .map(|(id, m)| Issue {
            kind: IssueKind::HighCouplingHub,
            severity: Severity::Warning,
            message: format!(
                "{id} depends on {} modules (very tight coupling threshold is {})",
                m.fan_out, config.coupling.tight
            ),
            node_ids: vec![id.clone()],
        })
        .collect();
    issues.sort_by(|a, b| a.node_ids.cmp(&b.node_ids));
    issues
}
