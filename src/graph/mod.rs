//! Stylesheet import graph.
//!
//! This module provides:
//! - Stylesheet discovery under a root directory
//! - Import directive parsing and resolution
//! - The dependency graph with forward and reverse indices
//! - Ancestor queries used to decide what to recompile

mod ancestors;
mod builder;
mod filter;
mod imports;
mod resolver;
mod scanner;

use std::path::{Path, PathBuf};

pub use ancestors::ancestors_of;
pub use builder::{build_graph, DependencyGraph, GraphOptions, StylesheetFile, UnresolvedImport};
pub use filter::{FileFilter, Syntax};
pub use imports::parse_imports;
pub use resolver::ImportResolver;
pub use scanner::{scan_directory, ScanResult, ScanStatsSnapshot};

/// Absolute, symlink-free form of `path`.
///
/// Paths that no longer exist (e.g. a just-deleted file) are resolved
/// through their parent directory so they still match graph keys.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => parent
            .canonicalize()
            .map_or_else(|_| path.to_path_buf(), |dir| dir.join(name)),
        _ => path.to_path_buf(),
    }
}
