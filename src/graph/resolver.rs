//! Import specifier resolution.
//!
//! Turns a raw specifier ("./utils", "/src/db", "@/api/client", "react")
//! into a canonical node id comparable across files. Resolution is pure
//! string work - it never touches the filesystem. A specifier that matches
//! no known node still resolves to a path (the builder creates the node on
//! demand), trading a hard existence guarantee for complete fan-out
//! accounting.
//!
//! Extension-less imports are the norm in JavaScript, so exact path
//! equality is backed by two heuristic tiers over the known-node set:
//! extension-stripped equality, then path-suffix equality. When more than
//! one node matches, the first in sorted order wins and the resolution is
//! flagged low-confidence - a same-basename file elsewhere could have been
//! the real target.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::types::{external_node_id, FileFacts, ImportKind, ImportRef, NodeId};

/// Outcome of resolving one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical target node id (project path or `external:<pkg>`).
    pub target: NodeId,
    pub kind: ImportKind,
    /// True when several known nodes matched and first-match-wins applied.
    pub low_confidence: bool,
}

/// Resolver for one scan: alias table + the set of scanned file ids.
pub struct PathResolver {
    /// Alias prefix -> project-relative directory, e.g. "@" -> "src".
    aliases: BTreeMap<String, String>,
    /// All scanned file ids, sorted (BTreeSet) so first-match-wins is
    /// deterministic.
    known: BTreeSet<NodeId>,
    /// Extension-stripped path -> nodes sharing that stem, in sorted order.
    by_stem: HashMap<String, Vec<NodeId>>,
}

impl PathResolver {
    pub fn new(
        aliases: BTreeMap<String, String>,
        known_nodes: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        let known: BTreeSet<NodeId> = known_nodes.into_iter().collect();
        let mut by_stem: HashMap<String, Vec<NodeId>> = HashMap::new();
        for node in &known {
            by_stem.entry(strip_extension(node).to_string()).or_default().push(node.clone());
        }
        Self { aliases, known, by_stem }
    }

    /// Resolve a specifier relative to the importing file.
    ///
    /// `from_file` is the canonical id of the file containing the import.
    pub fn resolve(&self, specifier: &str, from_file: &str) -> Resolution {
        // Relative: against dirname(from_file)
        if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".." {
            let base = dirname(from_file);
            let joined = if base.is_empty() {
                specifier.to_string()
            } else {
                format!("{base}/{specifier}")
            };
            let path = normalize_path(&joined);
            return self.match_internal(path, ImportKind::Relative);
        }

        // Absolute: against the scan root
        if let Some(rest) = specifier.strip_prefix('/') {
            let path = normalize_path(rest);
            return self.match_internal(path, ImportKind::Absolute);
        }

        // Alias: longest configured prefix wins; the prefix substitutes to a
        // project directory and the remainder resolves as absolute.
        let mut alias_hit: Option<(&String, &String)> = None;
        for (prefix, mapped) in &self.aliases {
            let applies = specifier == prefix || specifier.starts_with(&format!("{prefix}/"));
            if applies {
                match alias_hit {
                    Some((best, _)) if best.len() >= prefix.len() => {}
                    _ => alias_hit = Some((prefix, mapped)),
                }
            }
        }
        if let Some((prefix, mapped)) = alias_hit {
            let rest = specifier[prefix.len()..].trim_start_matches('/');
            let joined = if rest.is_empty() { mapped.clone() } else { format!("{mapped}/{rest}") };
            let path = normalize_path(&joined);
            return self.match_internal(path, ImportKind::Alias);
        }

        // Everything else is an external package. Unknown aliases land here
        // too: a prefix we have no mapping for cannot name a project file.
        Resolution {
            target: external_node_id(specifier),
            kind: ImportKind::External,
            low_confidence: false,
        }
    }

    /// Re-resolve all imports of a facts record, producing the resolved copy
    /// the graph builder consumes. The input record stays untouched.
    pub fn resolve_facts(&self, facts: &FileFacts) -> FileFacts {
        let imports = facts
            .imports
            .iter()
            .map(|import| {
                let resolution = self.resolve(&import.raw_specifier, &facts.id);
                ImportRef {
                    raw_specifier: import.raw_specifier.clone(),
                    resolved_target: match resolution.kind {
                        ImportKind::External => None,
                        _ => Some(resolution.target),
                    },
                    kind: resolution.kind,
                    is_dynamic: import.is_dynamic,
                    low_confidence: resolution.low_confidence,
                }
            })
            .collect();
        FileFacts { imports, ..facts.clone() }
    }

    /// Match a computed internal path against the known-node set.
    ///
    /// Tiers: exact path equality, extension-stripped equality, then
    /// path-suffix equality. Multiple candidates -> first in sorted order,
    /// flagged low-confidence. Zero candidates -> keep the computed path
    /// (node created on demand by the builder).
    fn match_internal(&self, path: String, kind: ImportKind) -> Resolution {
        if self.known.contains(&path) {
            return Resolution { target: path, kind, low_confidence: false };
        }

        if let Some(candidates) = self.by_stem.get(&path) {
            return Resolution {
                target: candidates[0].clone(),
                kind,
                low_confidence: candidates.len() > 1,
            };
        }

        // Suffix tier: "components/Button" matching "src/components/Button.tsx".
        // Full scan over known nodes, but only reached when both exact tiers
        // missed - the uncommon case.
        let suffix = format!("/{path}");
        let matches: Vec<&NodeId> = self
            .known
            .iter()
            .filter(|node| {
                node.ends_with(&suffix) || strip_extension(node).ends_with(&suffix)
            })
            .collect();
        if let Some(first) = matches.first() {
            return Resolution {
                target: (*first).clone(),
                kind,
                low_confidence: matches.len() > 1,
            };
        }

        Resolution { target: path, kind, low_confidence: false }
    }
}

/// Directory part of a canonical id ("src/pages/home.js" -> "src/pages").
fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Drop the final extension ("src/app.test.ts" -> "src/app.test").
fn strip_extension(path: &str) -> &str {
    let basename_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[basename_start..].rfind('.') {
        // A leading dot is a hidden file, not an extension
        Some(0) | None => path,
        Some(idx) => &path[..basename_start + idx],
    }
}

/// Collapse `.` and `..` segments without filesystem access.
/// Leading `..` that cannot be popped is preserved.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(&s) if s != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
