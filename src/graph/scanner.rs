//! Directory scanner for stylesheet discovery.
//!
//! Walks the scan root and collects every `*.scss` and `*.sass` file, either
//! across all subdirectories or the root level only. Ignore files, hidden
//! entries and vendored directories are not filtered: any stylesheet under
//! the root can be an entry point.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use ignore::WalkBuilder;

use super::filter::FileFilter;
use crate::error::GraphError;

/// Scan statistics.
#[derive(Debug, Default)]
pub struct ScanStats {
    pub files_found: AtomicU64,
    pub files_matched: AtomicU64,
    pub files_skipped: AtomicU64,
    pub errors: AtomicU64,
}

impl ScanStats {
    /// Create new stats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> ScanStatsSnapshot {
        ScanStatsSnapshot {
            files_found: self.files_found.load(Ordering::Relaxed),
            files_matched: self.files_matched.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of scan stats.
#[derive(Debug, Clone, Copy)]
pub struct ScanStatsSnapshot {
    pub files_found: u64,
    pub files_matched: u64,
    pub files_skipped: u64,
    pub errors: u64,
}

/// Files discovered by a scan, sorted by path.
#[derive(Debug)]
pub struct ScanResult {
    pub files: Vec<PathBuf>,
    pub stats: ScanStatsSnapshot,
}

/// Scan a directory for stylesheets.
///
/// # Errors
///
/// Returns an error if `root` is missing or cannot be listed. Failures on
/// individual entries below the root are counted and logged only.
pub fn scan_directory(root: &Path, recursive: bool) -> Result<ScanResult, GraphError> {
    if !root.exists() {
        return Err(GraphError::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    std::fs::read_dir(root).map_err(|e| GraphError::unreadable(root, &e))?;

    let stats = ScanStats::new();
    tracing::debug!(path = %root.display(), recursive, "Starting stylesheet scan");

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .max_depth(if recursive { None } else { Some(1) })
        .build();

    let mut files = Vec::new();

    for entry in walker {
        match entry {
            Ok(entry) => {
                let entry_path = entry.path();

                if entry.file_type().map_or(true, |t| t.is_dir()) {
                    continue;
                }

                stats.files_found.fetch_add(1, Ordering::Relaxed);

                if !FileFilter::is_stylesheet(entry_path) {
                    stats.files_skipped.fetch_add(1, Ordering::Relaxed);
                    continue;
                }

                files.push(entry_path.to_path_buf());
                stats.files_matched.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error walking directory");
                stats.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    files.sort();

    let snapshot = stats.snapshot();
    tracing::debug!(
        path = %root.display(),
        found = snapshot.files_found,
        matched = snapshot.files_matched,
        skipped = snapshot.files_skipped,
        errors = snapshot.errors,
        "Stylesheet scan complete"
    );

    Ok(ScanResult {
        files,
        stats: snapshot,
    })
}
