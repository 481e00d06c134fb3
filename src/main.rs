//! archmap CLI - dependency graph construction and analysis
//!
//! Command-line entry point. Orchestrates the full pipeline:
//!
//! 1. File Discovery: Find source files respecting .gitignore
//! 2. Fact Extraction: Parse imports, exports, symbols, complexity
//! 3. Resolution: Map import specifiers to files (relative, alias, external)
//! 4. Graph Building: Assemble the directed dependency multigraph
//! 5. Analysis: Cycles, metrics, issue detection
//! 6. Output: JSON for machines, colored summary for humans
//!
//! Design philosophy:
//! - Deterministic output (same tree, same bytes)
//! - Fail fast with clear error messages
//! - Every threshold configurable, nothing baked in
//! - Sane defaults (scan ., colored summary)

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use archmap::config::ScanConfig;
use archmap::report::{render_stats, render_summary};
use archmap::scan::{run_scan, CancelToken, ScanOutcome};

/// Dependency graph construction and analysis
///
/// archmap scans a source tree, builds its import graph, and reports
/// architectural issues: circular dependencies, isolated files, duplicate
/// dependency patterns, and high-coupling hubs.
///
/// Examples:
///   archmap .                          # Scan the current project
///   archmap src --json                 # Machine-readable graph
///   archmap . --alias "@=src" --stats  # Custom alias + timing footer
#[derive(Parser, Debug)]
#[command(name = "archmap")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Directory or single file to scan
    ///
    /// Defaults to the current directory. A single file produces a
    /// one-node graph, useful for spot checks.
    #[arg(value_name = "PATH", default_value = ".")]
    pub root: PathBuf,

    /// Emit the serialized graph as JSON on stdout
    ///
    /// The JSON carries nodes, edges, a metadata block, and the issue
    /// list. Output is deterministic: scanning the same tree twice
    /// yields byte-identical JSON.
    #[arg(long)]
    pub json: bool,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Import alias mapping, repeatable
    ///
    /// Format is PREFIX=DIR, e.g. --alias "@=src" --alias "~=app".
    /// CLI aliases replace the table from archmap.toml.
    #[arg(long, value_name = "PREFIX=DIR")]
    pub alias: Vec<String>,

    /// Per-file size cutoff in bytes
    ///
    /// Files larger than this are skipped at discovery. Default is
    /// 1 MiB; bigger files are almost always generated bundles.
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<u64>,

    /// Visit budget for cycle enumeration
    ///
    /// Exhaustive cycle search is exponential in pathological graphs.
    /// When the budget runs out the scan still completes and the output
    /// is flagged as truncated.
    #[arg(long, value_name = "N")]
    pub cycle_budget: Option<usize>,

    /// Worker threads for fact extraction (0 = auto-detect)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Print a timing and file-count footer after the summary
    #[arg(long)]
    pub stats: bool,

    /// Show configuration and progress on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    ///
    /// Useful when piping the summary to files or tools that don't
    /// handle ANSI escape codes.
    #[arg(long)]
    pub no_color: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ScanConfig::load(&cli.root);
    apply_overrides(&mut config, &cli)?;

    if cli.verbose {
        eprintln!("Scanning: {}", cli.root.display());
        eprintln!("{}", config.display_summary());
    }

    let cancel = CancelToken::new();
    let report = match run_scan(&cli.root, &config, &cancel)? {
        ScanOutcome::Completed(report) => *report,
        ScanOutcome::Cancelled => {
            eprintln!("scan cancelled");
            return Ok(());
        }
    };

    let use_color = !cli.no_color && cli.output.is_none();
    let rendered = if cli.json {
        let mut json = serde_json::to_string_pretty(&report.graph)
            .context("failed to serialize graph")?;
        json.push('\n');
        json
    } else {
        render_summary(&report, use_color)
    };

    match &cli.output {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            file.write_all(rendered.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => print!("{rendered}"),
    }

    if cli.stats {
        eprint!("{}", render_stats(&report, use_color));
    }

    Ok(())
}

/// Fold CLI flags into the loaded config. CLI wins over archmap.toml.
fn apply_overrides(config: &mut ScanConfig, cli: &Cli) -> Result<()> {
    if !cli.alias.is_empty() {
        let mut aliases = BTreeMap::new();
        for pair in &cli.alias {
            let (prefix, dir) = pair
                .split_once('=')
                .with_context(|| format!("invalid alias '{pair}', expected PREFIX=DIR"))?;
            aliases.insert(prefix.to_string(), dir.to_string());
        }
        config.aliases = aliases;
    }
    if let Some(max) = cli.max_file_size {
        config.max_file_size = max;
    }
    if let Some(budget) = cli.cycle_budget {
        config.cycle_budget = budget;
    }
    if let Some(jobs) = cli.jobs {
        config.concurrency = jobs;
    }
    Ok(())
}
