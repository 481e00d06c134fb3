//! Scan orchestration: discovery -> extraction -> resolution -> graph ->
//! analysis -> serialization.
//!
//! Extraction is the only parallel phase (rayon over the discovered files);
//! everything downstream is sequential over sorted input so the serialized
//! result is byte-identical across runs.
//!
//! Cancellation is cooperative: the token is checked between phases and
//! once per file during extraction. A cancelled scan produces no partial
//! graph - callers get `ScanOutcome::Cancelled` and nothing else.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::config::ScanConfig;
use crate::discovery::find_source_files;
use crate::extraction::extract_facts;
use crate::graph::cycles::find_cycles;
use crate::graph::{GraphBuilder, PathResolver};
use crate::issues::detect_issues;
use crate::metrics::compute_metrics;
use crate::serialize::{serialize_graph, SerializedGraph};
use crate::types::{FileFacts, Language, NodeId};

/// Cooperative cancellation flag, cloneable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Counters from one scan run, for the --stats footer.
#[derive(Debug, Clone)]
pub struct ScanStats {
    /// Files that survived discovery filtering.
    pub files_discovered: usize,
    /// Files an analyzer produced facts for. The difference from
    /// `files_discovered` is unreadable files (I/O errors mid-scan).
    pub files_parsed: usize,
    pub elapsed: Duration,
}

/// Everything a completed scan produces.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub graph: SerializedGraph,
    pub stats: ScanStats,
}

/// A scan either runs to completion or observes cancellation.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Completed(Box<ScanReport>),
    Cancelled,
}

/// Run the full pipeline over `root`.
///
/// `root` may be a directory or a single source file. Node ids are
/// root-relative paths with forward slashes on every platform, so graphs
/// for the same tree compare equal regardless of where it is checked out.
pub fn run_scan(root: &Path, config: &ScanConfig, cancel: &CancelToken) -> Result<ScanOutcome> {
    let started = Instant::now();

    if cancel.is_cancelled() {
        return Ok(ScanOutcome::Cancelled);
    }

    let files = find_source_files(root, config)
        .with_context(|| format!("discovery failed under {}", root.display()))?;

    if cancel.is_cancelled() {
        return Ok(ScanOutcome::Cancelled);
    }

    // Parallel fact extraction. par_iter + collect preserves input order,
    // so the facts vector is still sorted by path.
    let extract_all = |files: &[std::path::PathBuf]| -> Vec<Option<FileFacts>> {
        files
            .par_iter()
            .map(|path| {
                if cancel.is_cancelled() {
                    return None;
                }
                // Unreadable files (deleted mid-scan, permission changes)
                // drop out of the graph rather than failing the run.
                let content = std::fs::read_to_string(path).ok()?;
                let id = node_id_for(root, path);
                let language = Language::from_path(path);
                extract_facts(&id, &content, language, content.len() as u64)
            })
            .collect()
    };

    let extracted = if config.concurrency > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .build()
            .context("failed to build extraction thread pool")?;
        pool.install(|| extract_all(&files))
    } else {
        extract_all(&files)
    };

    if cancel.is_cancelled() {
        return Ok(ScanOutcome::Cancelled);
    }

    let facts: Vec<FileFacts> = extracted.into_iter().flatten().collect();
    let files_parsed = facts.len();

    // Resolution needs the complete id set before any import is resolved,
    // so this is a second pass over the extracted facts.
    let known: Vec<NodeId> = facts.iter().map(|f| f.id.clone()).collect();
    let resolver = PathResolver::new(config.aliases.clone(), known);

    let mut builder = GraphBuilder::new();
    for file_facts in &facts {
        builder.add_facts(&resolver.resolve_facts(file_facts));
    }
    let graph = builder.build();

    let serialized = match analyze(&graph, config, cancel) {
        Some(serialized) => serialized,
        None => return Ok(ScanOutcome::Cancelled),
    };

    Ok(ScanOutcome::Completed(Box::new(ScanReport {
        graph: serialized,
        stats: ScanStats {
            files_discovered: files.len(),
            files_parsed,
            elapsed: started.elapsed(),
        },
    })))
}

/// Run the analysis phases over the built graph.
///
/// The token is checked at the start of every phase, not just once up
/// front: cycle enumeration can grind through its whole visit budget on
/// a pathological graph, and a token cancelled during that grind must
/// still stop metrics and issue detection from running. `None` means
/// cancellation was observed.
fn analyze(
    graph: &crate::graph::DependencyGraph,
    config: &ScanConfig,
    cancel: &CancelToken,
) -> Option<SerializedGraph> {
    if cancel.is_cancelled() {
        return None;
    }
    let cycle_report = find_cycles(graph, config.cycle_budget);

    if cancel.is_cancelled() {
        return None;
    }
    let metrics = compute_metrics(graph, config);

    if cancel.is_cancelled() {
        return None;
    }
    let issues = detect_issues(graph, &cycle_report.cycles, &metrics, config);
    Some(serialize_graph(graph, &metrics, &issues, cycle_report.truncated))
}

/// Root-relative node id with forward slashes.
fn node_id_for(root: &Path, path: &Path) -> NodeId {
    match path.strip_prefix(root) {
        // Scanning a single file strips to an empty path; fall through to
        // the file name.
        Ok(rel) if !rel.as_os_str().is_empty() => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        _ => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IssueKind;
    use std::fs;

    fn completed(outcome: ScanOutcome) -> ScanReport {
        match outcome {
            ScanOutcome::Completed(report) => *report,
            ScanOutcome::Cancelled => panic!("scan was cancelled"),
        }
    }

    fn write_project(dir: &Path) {
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(
            dir.join("src/app.js"),
            "import { helper } from './utils';\nimport React from 'react';\nexport function main() { if (helper()) { return 1; } }\n",
        )
        .unwrap();
        fs::write(
            dir.join("src/utils.js"),
            "export function helper() { return true; }\n",
        )
        .unwrap();
        fs::write(dir.join("src/orphan.js"), "export const alone = 1;\n").unwrap();
    }

    #[test]
    fn test_end_to_end_scan() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());

        let config = ScanConfig::default();
        let report = completed(run_scan(dir.path(), &config, &CancelToken::new()).unwrap());

        assert_eq!(report.stats.files_discovered, 3);
        assert_eq!(report.stats.files_parsed, 3);

        let ids: Vec<_> = report.graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["external:react", "src/app.js", "src/orphan.js", "src/utils.js"]
        );

        let edge_pairs: Vec<_> = report
            .graph
            .edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        assert_eq!(
            edge_pairs,
            vec![
                ("src/app.js", "external:react"),
                ("src/app.js", "src/utils.js"),
            ]
        );

        let isolated: Vec<_> = report
            .graph
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::IsolatedFile)
            .collect();
        assert_eq!(isolated.len(), 1);
        assert_eq!(isolated[0].node_ids, vec!["src/orphan.js"]);
    }

    #[test]
    fn test_scan_detects_cycles_across_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "import { b } from './b';\nexport const a = 1;\n")
            .unwrap();
        fs::write(dir.path().join("b.js"), "import { a } from './a';\nexport const b = 2;\n")
            .unwrap();

        let config = ScanConfig::default();
        let report = completed(run_scan(dir.path(), &config, &CancelToken::new()).unwrap());

        let circular: Vec<_> = report
            .graph
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::CircularDependency)
            .collect();
        assert_eq!(circular.len(), 1);
        assert_eq!(circular[0].node_ids, vec!["a.js", "b.js"]);
        assert_eq!(report.graph.metadata.circular_dependencies, 1);
    }

    #[test]
    fn test_alias_imports_resolve_through_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("main.js"), "import { x } from '@/lib';\n").unwrap();
        fs::write(dir.path().join("src/lib.js"), "export const x = 1;\n").unwrap();

        let config = ScanConfig::default();
        let report = completed(run_scan(dir.path(), &config, &CancelToken::new()).unwrap());

        let edge = report
            .graph
            .edges
            .iter()
            .find(|e| e.from == "main.js")
            .expect("alias edge exists");
        assert_eq!(edge.to, "src/lib.js");
    }

    #[test]
    fn test_deterministic_output() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());

        let config = ScanConfig::default();
        let first = completed(run_scan(dir.path(), &config, &CancelToken::new()).unwrap());
        let second = completed(run_scan(dir.path(), &config, &CancelToken::new()).unwrap());

        let a = serde_json::to_string(&first.graph).unwrap();
        let b = serde_json::to_string(&second.graph).unwrap();
        assert_eq!(a, b, "same tree must serialize byte-identically");
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());

        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = run_scan(dir.path(), &ScanConfig::default(), &cancel).unwrap();
        assert!(matches!(outcome, ScanOutcome::Cancelled));
    }

    #[test]
    fn test_cancel_during_analysis_stops_remaining_phases() {
        use crate::graph::GraphBuilder;
        use crate::types::{FileFacts, ImportKind, ImportRef, Language};

        let mut builder = GraphBuilder::new();
        builder.add_facts(&FileFacts {
            id: "a.js".to_string(),
            language: Language::JavaScript,
            lines: 1,
            size: 10,
            complexity: 1,
            imports: vec![ImportRef {
                raw_specifier: "./b".to_string(),
                resolved_target: Some("b.js".to_string()),
                kind: ImportKind::Relative,
                is_dynamic: false,
                low_confidence: false,
            }],
            exports: vec![],
            functions: vec![],
            variables: vec![],
        });
        let graph = builder.build();
        let config = ScanConfig::default();

        // A token cancelled after extraction (before any analysis phase)
        // must stop the pipeline; a live one must let it finish.
        let cancelled = CancelToken::new();
        cancelled.cancel();
        assert!(analyze(&graph, &config, &cancelled).is_none());
        assert!(analyze(&graph, &config, &CancelToken::new()).is_some());
    }

    #[test]
    fn test_single_file_scan_uses_file_name_id() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("solo.js");
        fs::write(&file, "export const solo = 1;\n").unwrap();

        let config = ScanConfig::default();
        let report = completed(run_scan(&file, &config, &CancelToken::new()).unwrap());

        assert_eq!(report.graph.nodes.len(), 1);
        assert_eq!(report.graph.nodes[0].id, "solo.js");
    }

    #[test]
    fn test_explicit_concurrency() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());

        let config = ScanConfig { concurrency: 2, ..Default::default() };
        let report = completed(run_scan(dir.path(), &config, &CancelToken::new()).unwrap());
        assert_eq!(report.stats.files_parsed, 3);
    }
}
