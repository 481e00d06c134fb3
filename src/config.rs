//! Scan configuration loading from archmap.toml.
//!
//! Follows conventions from ruff, black, mypy for familiarity:
//! - Standalone archmap.toml in the scan root
//! - Walk up parent directories as fallback (monorepo subtree scans)
//! - Defaults that work with zero configuration
//!
//! ## Example
//!
//! ```toml
//! max-file-size = 1048576
//! exclude = ["**/generated/**"]
//! concurrency = 8
//!
//! [aliases]
//! "@" = "src"
//! "~" = "app"
//!
//! [coupling]
//! loose = 2
//! moderate = 10
//! tight = 20
//!
//! [complexity]
//! low = 5
//! medium = 15
//! high = 30
//! ```
//!
//! Every threshold is a parameter, never a constant baked into an
//! algorithm - issue detection and metrics read them from here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default exclude patterns (common non-source directories).
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/.git/**",
    "**/dist/**",
    "**/build/**",
    "**/out/**",
    "**/coverage/**",
    "**/target/**",
    "**/__pycache__/**",
    "**/.venv/**",
    "**/vendor/**",
    "**/.next/**",
    "**/.nuxt/**",
];

/// Default per-file size cutoff: 1 MiB. Bigger files are almost always
/// generated bundles or vendored blobs that would drown the graph.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Coupling thresholds by fan-out. Buckets are inclusive upper bounds:
/// `<= loose` is loose, `<= moderate` is moderate, `<= tight` is tight,
/// anything above is very tight (hub territory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CouplingThresholds {
    pub loose: usize,
    pub moderate: usize,
    pub tight: usize,
}

impl Default for CouplingThresholds {
    fn default() -> Self {
        Self { loose: 2, moderate: 10, tight: 20 }
    }
}

/// Complexity thresholds. Inclusive upper bounds per bucket; above `high`
/// is critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ComplexityThresholds {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self { low: 5, medium: 15, high: 30 }
    }
}

/// Archmap scan configuration.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,

    /// Per-file size cutoff in bytes; larger files are skipped at discovery.
    pub max_file_size: u64,

    /// Additional glob patterns to exclude (extends defaults).
    pub exclude: Vec<String>,

    /// Import alias table: prefix -> project-relative directory.
    /// BTreeMap so longer/deterministic prefix iteration order is stable.
    pub aliases: BTreeMap<String, String>,

    pub coupling: CouplingThresholds,
    pub complexity: ComplexityThresholds,

    /// Worker count for parallel fact extraction. 0 = auto-detect.
    pub concurrency: usize,

    /// DFS visit budget for cycle enumeration before truncating.
    pub cycle_budget: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("@".to_string(), "src".to_string());
        Self {
            source: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            exclude: Vec::new(),
            aliases,
            coupling: CouplingThresholds::default(),
            complexity: ComplexityThresholds::default(),
            concurrency: 0,
            cycle_budget: 250_000,
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    max_file_size: Option<u64>,
    exclude: Option<Vec<String>>,
    aliases: Option<BTreeMap<String, String>>,
    coupling: Option<CouplingThresholds>,
    complexity: Option<ComplexityThresholds>,
    concurrency: Option<usize>,
    cycle_budget: Option<usize>,
}

impl ScanConfig {
    /// Load configuration for the given directory.
    ///
    /// Search order:
    /// 1. archmap.toml in directory
    /// 2. Walk up to find archmap.toml (like ruff's pyproject search)
    /// 3. Default config if nothing found
    pub fn load(directory: &Path) -> Self {
        let candidate = directory.join("archmap.toml");
        if candidate.exists() {
            if let Some(config) = Self::load_toml(&candidate) {
                return config;
            }
        }

        let mut current = directory.to_path_buf();
        while let Some(parent) = current.parent() {
            let candidate = parent.join("archmap.toml");
            if candidate.exists() {
                if let Some(config) = Self::load_toml(&candidate) {
                    return config;
                }
            }
            current = parent.to_path_buf();
        }

        Self::default()
    }

    fn load_toml(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<RawConfig>(&content) {
            Ok(raw) => Some(Self::from_raw(raw, path.to_path_buf())),
            Err(err) => {
                // A typo'd config must not vanish without a trace; the
                // search still falls through to parents or defaults.
                eprintln!("warning: ignoring malformed {}: {err}", path.display());
                None
            }
        }
    }

    fn from_raw(raw: RawConfig, source: PathBuf) -> Self {
        let defaults = Self::default();
        Self {
            source: Some(source),
            max_file_size: raw.max_file_size.unwrap_or(defaults.max_file_size),
            exclude: raw.exclude.unwrap_or_default(),
            aliases: raw.aliases.unwrap_or(defaults.aliases),
            coupling: raw.coupling.unwrap_or_default(),
            complexity: raw.complexity.unwrap_or_default(),
            concurrency: raw.concurrency.unwrap_or(0),
            cycle_budget: raw.cycle_budget.unwrap_or(defaults.cycle_budget),
        }
    }

    /// Get effective exclude patterns (defaults + configured extras).
    pub fn effective_excludes(&self) -> Vec<String> {
        let mut patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        patterns.extend(self.exclude.clone());
        patterns
    }

    /// Check if a path matches any exclude pattern.
    pub fn matches_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.effective_excludes()
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, &path_str))
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        if let Some(ref source) = self.source {
            lines.push(format!("   Config: {}", source.display()));
        } else {
            lines.push("   Config: (defaults)".to_string());
        }

        if !self.aliases.is_empty() {
            let pairs: Vec<_> = self
                .aliases
                .iter()
                .map(|(k, v)| format!("{} -> {}", k, v))
                .collect();
            lines.push(format!("   Aliases: {}", pairs.join(", ")));
        }

        lines.push(format!(
            "   Coupling: loose<={} moderate<={} tight<={}",
            self.coupling.loose, self.coupling.moderate, self.coupling.tight
        ));
        lines.push(format!(
            "   Complexity: low<={} medium<={} high<={}",
            self.complexity.low, self.complexity.medium, self.complexity.high
        ));

        lines.join("\n")
    }
}
