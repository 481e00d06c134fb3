//! Circular dependency enumeration.
//!
//! Depth-first search from every unvisited node with an explicit stack
//! (graphs with thousands of files would overflow the call stack). The
//! recursion stack and current path are tracked separately: revisiting a
//! node that is on the path closes a cycle, and the emitted chain is the
//! sub-path from that node's first occurrence to the current node.
//!
//! Only internal edges participate - external nodes have no outgoing
//! edges, so they can never close a cycle. A self-import is a cycle of
//! length 1 and is reported like any other.
//!
//! Exhaustive cycle enumeration is exponential in pathological graphs, so
//! the walk carries a visit budget: when it is exceeded the detector
//! returns what it found with `truncated = true` instead of failing the
//! scan.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;

use crate::graph::builder::DependencyGraph;
use crate::types::{Cycle, NodeId};

/// Result of cycle enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycles: Vec<Cycle>,
    /// True when the visit budget ran out and the list may be incomplete.
    pub truncated: bool,
}

/// Enumerate circular dependency chains.
///
/// Deterministic: roots are taken in sorted node-id order and adjacency
/// lists are sorted, so the same graph yields the same cycles in the same
/// order. Identical cycles reached from different roots are deduplicated
/// by their sorted node-id tuple.
pub fn find_cycles(graph: &DependencyGraph, budget: usize) -> CycleReport {
    // Roots in sorted id order for reproducible traversal.
    let mut roots: Vec<NodeIndex> = graph.node_indices().collect();
    roots.sort_by(|a, b| {
        let ia = graph.node(*a).map(|n| n.id.as_str()).unwrap_or("");
        let ib = graph.node(*b).map(|n| n.id.as_str()).unwrap_or("");
        ia.cmp(ib)
    });

    // Sorted distinct-internal adjacency, resolved back to indices once.
    let adjacency: HashMap<NodeIndex, Vec<NodeIndex>> = roots
        .iter()
        .map(|&idx| {
            let targets: Vec<NodeIndex> = graph
                .distinct_internal_targets(idx)
                .into_iter()
                .filter_map(|id| graph.node_index(id))
                .collect();
            (idx, targets)
        })
        .collect();

    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut on_path: HashSet<NodeIndex> = HashSet::new();
    let mut seen_keys: HashSet<Vec<NodeId>> = HashSet::new();
    let mut cycles = Vec::new();
    let mut visits: usize = 0;
    let mut truncated = false;

    // One DFS frame per node on the current path: the node plus a cursor
    // into its adjacency list.
    struct Frame {
        node: NodeIndex,
        next: usize,
    }

    'roots: for &root in &roots {
        if visited.contains(&root) {
            continue;
        }

        visited.insert(root);
        on_path.insert(root);
        let mut path: Vec<NodeIndex> = vec![root];
        let mut stack: Vec<Frame> = vec![Frame { node: root, next: 0 }];

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            let neighbors = &adjacency[&node];

            if frame.next < neighbors.len() {
                let target = neighbors[frame.next];
                frame.next += 1;

                visits += 1;
                if visits > budget {
                    truncated = true;
                    break 'roots;
                }

                if !visited.contains(&target) {
                    visited.insert(target);
                    on_path.insert(target);
                    path.push(target);
                    stack.push(Frame { node: target, next: 0 });
                } else if on_path.contains(&target) {
                    // Back edge: the path from target's first occurrence to
                    // the current node is a closed chain.
                    let pos = path
                        .iter()
                        .position(|&n| n == target)
                        .expect("on_path nodes are on the path");
                    let chain: Vec<NodeId> = path[pos..]
                        .iter()
                        .filter_map(|&idx| graph.node(idx).map(|n| n.id.clone()))
                        .collect();
                    let cycle = canonical_rotation(chain);
                    if seen_keys.insert(cycle.sorted_key()) {
                        cycles.push(cycle);
                    }
                }
            } else {
                stack.pop();
                on_path.remove(&node);
                path.pop();
            }
        }
    }

    CycleReport { cycles, truncated }
}

/// Rotate a closed chain so the lexicographically smallest node comes
/// first. The same cycle discovered from different roots then renders
/// identically.
fn canonical_rotation(nodes: Vec<NodeId>) -> Cycle {
    if nodes.is_empty() {
        return Cycle { nodes };
    }
    let min_pos = nodes
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated = Vec::with_capacity(nodes.len());
    rotated.extend_from_slice(&nodes[min_pos..]);
    rotated.extend_from_slice(&nodes[..min_pos]);
    Cycle { nodes: rotated }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{EdgeInfo, GraphBuilder};
    use crate::types::ImportKind;

    fn edge(kind: ImportKind, specifier: &str) -> EdgeInfo {
        EdgeInfo {
            kind,
            specifier: specifier.to_string(),
            is_dynamic: false,
            low_confidence: false,
        }
    }

    fn relative(specifier: &str) -> EdgeInfo {
        edge(ImportKind::Relative, specifier)
    }

    #[test]
    fn test_three_node_cycle() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("a.js", "b.js", relative("./b"));
        builder.add_edge("b.js", "c.js", relative("./c"));
        builder.add_edge("c.js", "a.js", relative("./a"));
        let graph = builder.build();

        let report = find_cycles(&graph, 1_000);
        assert!(!report.truncated);
        assert_eq!(report.cycles.len(), 1);
        assert_eq!(report.cycles[0].nodes, vec!["a.js", "b.js", "c.js"]);
    }

    #[test]
    fn test_self_loop_is_length_one_cycle() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("a.js", "a.js", edge(ImportKind::Alias, "@/a"));
        let graph = builder.build();

        let report = find_cycles(&graph, 1_000);
        assert_eq!(report.cycles.len(), 1);
        assert_eq!(report.cycles[0].nodes, vec!["a.js"]);
        assert_eq!(report.cycles[0].len(), 1);
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("a.js", "b.js", relative("./b"));
        builder.add_edge("b.js", "c.js", relative("./c"));
        builder.add_edge("a.js", "c.js", relative("./c"));
        let graph = builder.build();

        let report = find_cycles(&graph, 1_000);
        assert!(report.cycles.is_empty());
        assert!(!report.truncated);
    }

    #[test]
    fn test_external_edges_never_form_cycles() {
        // a -> external:react; external nodes have no outgoing edges, and
        // external-kind edges are skipped outright.
        let mut builder = GraphBuilder::new();
        builder.add_edge("a.js", "external:react", edge(ImportKind::External, "react"));
        let graph = builder.build();

        let report = find_cycles(&graph, 1_000);
        assert!(report.cycles.is_empty());
    }

    #[test]
    fn test_two_independent_cycles() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("a.js", "b.js", relative("./b"));
        builder.add_edge("b.js", "a.js", relative("./a"));
        builder.add_edge("x.js", "y.js", relative("./y"));
        builder.add_edge("y.js", "x.js", relative("./x"));
        let graph = builder.build();

        let report = find_cycles(&graph, 1_000);
        assert_eq!(report.cycles.len(), 2);
        assert_eq!(report.cycles[0].nodes, vec!["a.js", "b.js"]);
        assert_eq!(report.cycles[1].nodes, vec!["x.js", "y.js"]);
    }

    #[test]
    fn test_duplicate_cycle_reported_once() {
        // a <-> b discovered from both orientations must collapse to one.
        let mut builder = GraphBuilder::new();
        builder.add_edge("a.js", "b.js", relative("./b"));
        builder.add_edge("b.js", "a.js", relative("./a"));
        let graph = builder.build();

        let report = find_cycles(&graph, 1_000);
        assert_eq!(report.cycles.len(), 1);
        assert_eq!(report.cycles[0].nodes, vec!["a.js", "b.js"]);
    }

    #[test]
    fn test_budget_truncation() {
        let mut builder = GraphBuilder::new();
        // Dense-ish graph: a ring plus chords.
        let names: Vec<String> = (0..20).map(|i| format!("n{i:02}.js")).collect();
        for i in 0..20 {
            let next = &names[(i + 1) % 20];
            builder.add_edge(&names[i], next, relative(next));
            let chord = &names[(i + 5) % 20];
            builder.add_edge(&names[i], chord, relative(chord));
        }
        let graph = builder.build();

        let full = find_cycles(&graph, 1_000_000);
        assert!(!full.truncated);
        assert!(!full.cycles.is_empty());

        let capped = find_cycles(&graph, 3);
        assert!(capped.truncated, "tiny budget must truncate");
        assert!(capped.cycles.len() <= full.cycles.len());
    }

    #[test]
    fn test_deterministic_ordering() {
        let mut first = GraphBuilder::new();
        let mut second = GraphBuilder::new();
        for builder in [&mut first, &mut second] {
            builder.add_edge("m.js", "n.js", relative("./n"));
            builder.add_edge("n.js", "m.js", relative("./m"));
            builder.add_edge("c.js", "d.js", relative("./d"));
            builder.add_edge("d.js", "c.js", relative("./c"));
        }
        let a = find_cycles(&first.build(), 1_000);
        let b = find_cycles(&second.build(), 1_000);
        assert_eq!(a.cycles, b.cycles);
    }
}
