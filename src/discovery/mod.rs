//! File discovery - find the source files a scan should analyze.
//!
//! Thin wrapper over the `ignore` crate: .gitignore-aware, parallel,
//! deterministic output.

mod files;

pub use files::find_source_files;
