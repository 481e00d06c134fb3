//! Core types for archmap - the dependency graph cartographer.
//!
//! Everything that flows between pipeline phases lives here. Key design
//! decisions:
//! - Records are frozen after creation: the extractor produces `FileFacts`
//!   once per file per scan and nothing downstream mutates them.
//! - All transport types derive serde so the serialized graph is just
//!   "the same structs, through serde_json".
//! - External packages are first-class nodes (`external:<pkg>`) so fan-out
//!   accounting stays complete even for dependencies outside the scan root.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Canonical node identity: the normalized project-relative file path,
/// or `external:<package>` for third-party dependencies.
pub type NodeId = String;

/// Prefix marking synthetic nodes for packages outside the scanned tree.
pub const EXTERNAL_PREFIX: &str = "external:";

/// Check whether a node id names an external package rather than a file.
pub fn is_external(id: &str) -> bool {
    id.starts_with(EXTERNAL_PREFIX)
}

/// Build the synthetic node id for an external package specifier.
///
/// Only the top-level package name is kept: `lodash/fp` -> `external:lodash`.
/// Scoped packages keep scope + name as one token: `@org/ui/button` ->
/// `external:@org/ui`.
pub fn external_node_id(specifier: &str) -> NodeId {
    let package = if let Some(rest) = specifier.strip_prefix('@') {
        // Scoped package: "@scope/name" is one token, anything after the
        // second '/' is a subpath.
        match rest.find('/').and_then(|first| {
            rest[first + 1..].find('/').map(|second| first + 1 + second)
        }) {
            Some(idx) => &specifier[..idx + 1],
            None => specifier,
        }
    } else {
        match specifier.find('/') {
            Some(idx) => &specifier[..idx],
            None => specifier,
        }
    };
    format!("{EXTERNAL_PREFIX}{package}")
}

/// Source language of a scanned file.
///
/// JavaScript/TypeScript are the primary languages (full import/export
/// extraction); the rest go through the generic lexical analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Rust,
    Go,
    Java,
    Ruby,
    Unknown,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Language {
        match path.extension().and_then(|e| e.to_str()) {
            Some("js" | "jsx" | "mjs" | "cjs") => Language::JavaScript,
            Some("ts" | "tsx" | "mts" | "cts") => Language::TypeScript,
            Some("py") => Language::Python,
            Some("rs") => Language::Rust,
            Some("go") => Language::Go,
            Some("java") => Language::Java,
            Some("rb") => Language::Ruby,
            _ => Language::Unknown,
        }
    }

    /// Primary languages get the full structural analyzer; everything else
    /// gets the simpler lexical pass.
    pub fn is_primary(self) -> bool {
        matches!(self, Language::JavaScript | Language::TypeScript)
    }
}

/// Classification of an import specifier.
///
/// Decided syntactically by the resolver: `./x` and `../x` are relative,
/// a leading `/` is absolute (against the scan root), a configured prefix
/// is an alias, anything else is an external package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Relative,
    Absolute,
    Alias,
    External,
}

impl ImportKind {
    /// Internal edges point at files inside the scanned tree. Resolved
    /// aliases land on project paths, so they count as internal; only
    /// external edges are excluded from cycle detection (external nodes
    /// have no outgoing edges, so they cannot close a cycle anyway).
    pub fn is_internal(self) -> bool {
        !matches!(self, ImportKind::External)
    }
}

/// One import statement as seen in a source file, plus its resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRef {
    /// The specifier exactly as written: "./utils", "@/api/client", "react".
    pub raw_specifier: String,
    /// Canonical target for internal imports. `None` for external packages;
    /// those still become edges to a synthetic `external:<pkg>` node.
    pub resolved_target: Option<NodeId>,
    pub kind: ImportKind,
    /// `import(...)` / `require(...)` with a literal argument is still
    /// tracked, just flagged as dynamic.
    pub is_dynamic: bool,
    /// Set when the resolver matched by path-suffix (extension-less import)
    /// rather than exact path equality. First match wins; a same-basename
    /// file elsewhere in the tree could have been the real target.
    pub low_confidence: bool,
}

impl ImportRef {
    /// An unresolved import fresh out of the extractor.
    pub fn raw(specifier: impl Into<String>, is_dynamic: bool) -> Self {
        Self {
            raw_specifier: specifier.into(),
            resolved_target: None,
            kind: ImportKind::External,
            is_dynamic,
            low_confidence: false,
        }
    }
}

/// One exported binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRef {
    pub name: String,
    pub line: u32,
}

/// A declared symbol (function or variable) with its location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub line: u32,
}

/// Per-file structural facts - the unit the graph is assembled from.
///
/// Produced once per file per scan by the extraction phase; immutable
/// afterwards. A file that fails to parse simply contributes no facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFacts {
    /// Canonical node id (project-relative path).
    pub id: NodeId,
    pub language: Language,
    pub lines: u32,
    /// Size in bytes.
    pub size: u64,
    /// Approximate cyclomatic complexity: 1 + branching constructs.
    pub complexity: u32,
    pub imports: Vec<ImportRef>,
    pub exports: Vec<ExportRef>,
    pub functions: Vec<Symbol>,
    pub variables: Vec<Symbol>,
}

/// A circular dependency chain.
///
/// `nodes` is the closed path in traversal order: the last node's edge
/// target is the first node. A self-import is a cycle of length 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub nodes: Vec<NodeId>,
}

impl Cycle {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Canonical form for de-duplication: the same rotation of nodes can be
    /// discovered from different DFS roots, so identity is the sorted tuple.
    pub fn sorted_key(&self) -> Vec<NodeId> {
        let mut key = self.nodes.clone();
        key.sort();
        key
    }
}

/// Architectural anomaly classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    CircularDependency,
    IsolatedFile,
    DuplicateDependencyPattern,
    HighCouplingHub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One detected architectural problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    pub node_ids: Vec<NodeId>,
}

/// Coupling classification by fan-out, against configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingBucket {
    Loose,
    Moderate,
    Tight,
    VeryTight,
}

/// Complexity classification, against configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityBucket {
    Low,
    Medium,
    High,
    Critical,
}

/// Coarse architecture layer assigned by directory-name heuristics.
///
/// Best-effort only: a path matching no heuristic defaults to
/// Infrastructure. This is a classification aid, not a guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchLayer {
    Presentation,
    Business,
    Data,
    Shared,
    Infrastructure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_node_id_plain_package() {
        assert_eq!(external_node_id("react"), "external:react");
        assert_eq!(external_node_id("lodash/fp"), "external:lodash");
    }

    #[test]
    fn test_external_node_id_scoped_package() {
        // Scope + name is one token; deeper subpaths are trimmed.
        assert_eq!(external_node_id("@org/ui"), "external:@org/ui");
        assert_eq!(external_node_id("@org/ui/button"), "external:@org/ui");
    }

    #[test]
    fn test_is_external() {
        assert!(is_external("external:react"));
        assert!(!is_external("src/app.js"));
    }

    #[test]
    fn test_language_detection() {
        assert_eq!(Language::from_path(Path::new("a.tsx")), Language::TypeScript);
        assert_eq!(Language::from_path(Path::new("a.mjs")), Language::JavaScript);
        assert_eq!(Language::from_path(Path::new("a.py")), Language::Python);
        assert_eq!(Language::from_path(Path::new("README")), Language::Unknown);
        assert!(Language::TypeScript.is_primary());
        assert!(!Language::Rust.is_primary());
    }

    #[test]
    fn test_cycle_sorted_key_rotation_invariant() {
        let a = Cycle { nodes: vec!["a".into(), "b".into(), "c".into()] };
        let b = Cycle { nodes: vec!["b".into(), "c".into(), "a".into()] };
        assert_eq!(a.sorted_key(), b.sorted_key());
    }

    #[test]
    fn test_import_kind_internal() {
        assert!(ImportKind::Relative.is_internal());
        assert!(ImportKind::Absolute.is_internal());
        assert!(ImportKind::Alias.is_internal());
        assert!(!ImportKind::External.is_internal());
    }
}
