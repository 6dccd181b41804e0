//! Custom importer capability.
//!
//! Importers are supplied as already-constructed objects; nothing here
//! loads code from disk.

use std::path::{Path, PathBuf};

/// Resolves import targets the built-in search rules cannot.
pub trait Importer: Send + Sync + std::fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Resolve `target` as written in `importer`, or `None` to defer to the
    /// next search root.
    fn resolve(&self, target: &str, importer: &Path) -> Option<PathBuf>;
}

/// Importer that maps a `prefix/` in import targets onto a directory, e.g.
/// `~bootstrap/scss/grid` onto `node_modules/bootstrap/scss/grid`.
#[derive(Debug, Clone)]
pub struct PrefixImporter {
    prefix: String,
    dir: PathBuf,
}

impl PrefixImporter {
    /// Create an importer mapping `prefix` onto `dir`.
    pub fn new(prefix: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            dir: dir.into(),
        }
    }
}

impl Importer for PrefixImporter {
    fn name(&self) -> &str {
        &self.prefix
    }

    fn resolve(&self, target: &str, _importer: &Path) -> Option<PathBuf> {
        target
            .strip_prefix(self.prefix.as_str())
            .map(|rest| self.dir.join(rest.trim_start_matches('/')))
    }
}
