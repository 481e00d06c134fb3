//! Dependency graph construction.
//!
//! An arena-style graph: petgraph `DiGraph` holds the nodes, a
//! `HashMap<NodeId, NodeIndex>` side table maps canonical paths to indices.
//! This keeps the structure pointer-free and makes the read-only analysis
//! passes (cycles, metrics) cheap.
//!
//! The builder is single-writer by construction: it consumes `FileFacts`
//! sequentially, so attribute-replace semantics observe a total order and
//! two runs over the same sorted input produce the same graph.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::types::{is_external, FileFacts, ImportKind, Language, NodeId};

/// Node payload: identity plus attributes merged from `FileFacts`.
///
/// Nodes referenced only as edge targets (external packages, files outside
/// the scan) exist with default attributes and `scanned = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub language: Option<Language>,
    pub lines: u32,
    pub size: u64,
    pub complexity: u32,
    pub import_count: usize,
    pub export_count: usize,
    pub function_count: usize,
    pub variable_count: usize,
    /// True when facts for this file were actually extracted this scan.
    pub scanned: bool,
}

impl GraphNode {
    fn placeholder(id: NodeId) -> Self {
        Self {
            id,
            language: None,
            lines: 0,
            size: 0,
            complexity: 0,
            import_count: 0,
            export_count: 0,
            function_count: 0,
            variable_count: 0,
            scanned: false,
        }
    }

    pub fn is_external(&self) -> bool {
        is_external(&self.id)
    }
}

/// Edge payload. The graph is a multigraph: the same (from, to) pair can
/// carry several edges with different specifiers. Algorithms that need
/// distinct pairs dedupe via [`DependencyGraph::distinct_targets`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeInfo {
    pub kind: ImportKind,
    pub specifier: String,
    pub is_dynamic: bool,
    pub low_confidence: bool,
}

/// The finished, immutable-per-scan dependency graph.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, EdgeInfo>,
    index: HashMap<NodeId, NodeIndex>,
}

impl DependencyGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(idx)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&GraphNode> {
        self.node_index(id).and_then(|idx| self.node(idx))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Distinct outgoing target ids, sorted. This is the adjacency view
    /// every algorithm uses - parallel edges collapse to one entry.
    pub fn distinct_targets(&self, idx: NodeIndex) -> BTreeSet<&str> {
        self.graph
            .edges(idx)
            .filter_map(|e| self.graph.node_weight(e.target()).map(|n| n.id.as_str()))
            .collect()
    }

    /// Distinct internal (non-external-kind) targets, sorted. The edge set
    /// cycle detection walks.
    pub fn distinct_internal_targets(&self, idx: NodeIndex) -> BTreeSet<&str> {
        self.graph
            .edges(idx)
            .filter(|e| e.weight().kind.is_internal())
            .filter_map(|e| self.graph.node_weight(e.target()).map(|n| n.id.as_str()))
            .collect()
    }

    /// Distinct incoming source ids, sorted.
    pub fn distinct_sources(&self, idx: NodeIndex) -> BTreeSet<&str> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|e| self.graph.node_weight(e.source()).map(|n| n.id.as_str()))
            .collect()
    }

    /// Fan-out: number of distinct nodes this node depends on.
    pub fn fan_out(&self, idx: NodeIndex) -> usize {
        self.distinct_targets(idx).len()
    }

    /// Fan-in: number of distinct *other* nodes depending on this node.
    /// A self-import does not make a node its own dependent, so self-loops
    /// are excluded here (they still count toward fan-out and still form
    /// length-1 cycles).
    pub fn fan_in(&self, idx: NodeIndex) -> usize {
        let own = self.node(idx).map(|n| n.id.as_str());
        self.distinct_sources(idx)
            .into_iter()
            .filter(|id| Some(*id) != own)
            .count()
    }

    /// Access the underlying petgraph for read-only passes.
    pub fn inner(&self) -> &DiGraph<GraphNode, EdgeInfo> {
        &self.graph
    }
}

/// Accumulates `FileFacts` into a `DependencyGraph`.
pub struct GraphBuilder {
    graph: DiGraph<GraphNode, EdgeInfo>,
    index: HashMap<NodeId, NodeIndex>,
    /// Edge identity for idempotent re-adds: (from, to, specifier).
    edge_set: HashSet<(NodeIndex, NodeIndex, String)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            edge_set: HashSet::new(),
        }
    }

    /// Get-or-create a node, lazily, with placeholder attributes.
    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode::placeholder(id.to_string()));
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Fold one file's facts into the graph.
    ///
    /// Calling this twice for the same id replaces the node's attributes
    /// (no duplicate nodes); edges are set-deduplicated, so replaying the
    /// same imports is a no-op.
    ///
    /// Imports must already be resolved (see `PathResolver::resolve_facts`);
    /// external imports become edges to their synthetic `external:` node so
    /// fan-out stays complete.
    pub fn add_facts(&mut self, facts: &FileFacts) {
        let idx = self.ensure_node(&facts.id);
        // Replace, never merge: last write wins, deterministically, because
        // the scan feeds facts in sorted file order.
        self.graph[idx] = GraphNode {
            id: facts.id.clone(),
            language: Some(facts.language),
            lines: facts.lines,
            size: facts.size,
            complexity: facts.complexity,
            import_count: facts.imports.len(),
            export_count: facts.exports.len(),
            function_count: facts.functions.len(),
            variable_count: facts.variables.len(),
            scanned: true,
        };

        for import in &facts.imports {
            let target = match (&import.resolved_target, import.kind) {
                (Some(target), _) => target.clone(),
                // External imports carry no resolved target but still edge
                // to the synthetic package node.
                (None, ImportKind::External) => {
                    crate::types::external_node_id(&import.raw_specifier)
                }
                (None, _) => continue,
            };
            self.add_edge(
                &facts.id,
                &target,
                EdgeInfo {
                    kind: import.kind,
                    specifier: import.raw_specifier.clone(),
                    is_dynamic: import.is_dynamic,
                    low_confidence: import.low_confidence,
                },
            );
        }
    }

    /// Add one dependency edge; both endpoints are created on demand.
    /// Re-adding an edge with the same (from, to, specifier) is a no-op.
    pub fn add_edge(&mut self, from: &str, to: &str, info: EdgeInfo) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        let key = (from_idx, to_idx, info.specifier.clone());
        if self.edge_set.insert(key) {
            self.graph.add_edge(from_idx, to_idx, info);
        }
    }

    /// Finish the build phase. After this the graph is read-only.
    pub fn build(self) -> DependencyGraph {
        DependencyGraph { graph: self.graph, index: self.index }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImportRef, Language};

    fn facts(id: &str, imports: Vec<ImportRef>) -> FileFacts {
        FileFacts {
            id: id.to_string(),
            language: Language::JavaScript,
            lines: 10,
            size: 100,
            complexity: 1,
            imports,
            exports: vec![],
            functions: vec![],
            variables: vec![],
        }
    }

    fn internal_import(specifier: &str, target: &str) -> ImportRef {
        ImportRef {
            raw_specifier: specifier.to_string(),
            resolved_target: Some(target.to_string()),
            kind: ImportKind::Relative,
            is_dynamic: false,
            low_confidence: false,
        }
    }

    #[test]
    fn test_lazy_node_creation() {
        let mut builder = GraphBuilder::new();
        builder.add_facts(&facts("a.js", vec![internal_import("./b", "b.js")]));
        let graph = builder.build();

        // b.js exists as a placeholder even though it was never scanned
        assert_eq!(graph.node_count(), 2);
        let b = graph.node_by_id("b.js").expect("placeholder node exists");
        assert!(!b.scanned);
        let a = graph.node_by_id("a.js").expect("scanned node exists");
        assert!(a.scanned);
    }

    #[test]
    fn test_add_facts_replaces_attributes() {
        let mut builder = GraphBuilder::new();
        let mut first = facts("a.js", vec![]);
        first.lines = 10;
        let mut second = facts("a.js", vec![]);
        second.lines = 99;

        builder.add_facts(&first);
        builder.add_facts(&second);
        let graph = builder.build();

        assert_eq!(graph.node_count(), 1, "re-add must not duplicate the node");
        assert_eq!(graph.node_by_id("a.js").unwrap().lines, 99, "second call's attributes win");
    }

    #[test]
    fn test_edge_dedup_same_specifier() {
        let mut builder = GraphBuilder::new();
        let f = facts("a.js", vec![internal_import("./b", "b.js")]);
        builder.add_facts(&f);
        builder.add_facts(&f);
        let graph = builder.build();

        assert_eq!(graph.edge_count(), 1, "re-adding an existing edge is a no-op");
    }

    #[test]
    fn test_multigraph_distinct_specifiers_collapse_for_algorithms() {
        let mut builder = GraphBuilder::new();
        builder.add_facts(&facts(
            "a.js",
            vec![internal_import("./b", "b.js"), internal_import("./b.js", "b.js")],
        ));
        let graph = builder.build();

        // Two parallel edges survive in the multigraph...
        assert_eq!(graph.edge_count(), 2);
        // ...but the algorithmic adjacency view sees one distinct pair.
        let a = graph.node_index("a.js").unwrap();
        assert_eq!(graph.fan_out(a), 1);
        let b = graph.node_index("b.js").unwrap();
        assert_eq!(graph.fan_in(b), 1);
    }

    #[test]
    fn test_self_loop_excluded_from_fan_in() {
        let mut builder = GraphBuilder::new();
        builder.add_facts(&facts("a.js", vec![internal_import("./a", "a.js")]));
        builder.add_facts(&facts("b.js", vec![internal_import("./a", "a.js")]));
        let graph = builder.build();
        let a = graph.node_index("a.js").unwrap();

        // Only b.js counts as a dependent; the self-import does not.
        assert_eq!(graph.fan_in(a), 1);
        // The self-loop still counts as a dependency of a.js.
        assert_eq!(graph.fan_out(a), 1);
    }

    #[test]
    fn test_external_import_becomes_synthetic_node() {
        let mut builder = GraphBuilder::new();
        builder.add_facts(&facts("a.js", vec![ImportRef::raw("react", false)]));
        let graph = builder.build();

        let react = graph.node_by_id("external:react").expect("external node exists");
        assert!(react.is_external());
        let a = graph.node_index("a.js").unwrap();
        assert_eq!(graph.fan_out(a), 1, "external deps count toward fan-out");
    }

    #[test]
    fn test_internal_targets_exclude_external_edges() {
        let mut builder = GraphBuilder::new();
        builder.add_facts(&facts(
            "a.js",
            vec![internal_import("./b", "b.js"), ImportRef::raw("react", false)],
        ));
        let graph = builder.build();
        let a = graph.node_index("a.js").unwrap();

        assert_eq!(graph.distinct_targets(a).len(), 2);
        let internal = graph.distinct_internal_targets(a);
        assert_eq!(internal.into_iter().collect::<Vec<_>>(), vec!["b.js"]);
    }
}
