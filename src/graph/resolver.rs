//! Import target resolution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::filter::FileFilter;
use super::normalize_path;
use crate::render::Importer;

/// Resolves import targets to files on disk.
///
/// Search order: the importing file's directory, then each custom importer,
/// then each include path. The first existing candidate wins.
#[derive(Debug, Clone, Default)]
pub struct ImportResolver {
    include_paths: Vec<PathBuf>,
    importers: Vec<Arc<dyn Importer>>,
}

impl ImportResolver {
    /// Create a resolver over the given search roots.
    #[must_use]
    pub fn new(include_paths: Vec<PathBuf>, importers: Vec<Arc<dyn Importer>>) -> Self {
        Self {
            include_paths,
            importers,
        }
    }

    /// Resolve `target` as written in `importer`.
    #[must_use]
    pub fn resolve(&self, target: &str, importer: &Path) -> Option<PathBuf> {
        if let Some(dir) = importer.parent() {
            if let Some(found) = find_in(dir, target) {
                return Some(found);
            }
        }

        for custom in &self.importers {
            if let Some(base) = custom.resolve(target, importer) {
                if let Some(found) = find_candidate(&base) {
                    tracing::trace!(
                        importer = custom.name(),
                        import = target,
                        "Resolved by custom importer"
                    );
                    return Some(found);
                }
            }
        }

        self.include_paths
            .iter()
            .find_map(|dir| find_in(dir, target))
    }
}

fn find_in(dir: &Path, target: &str) -> Option<PathBuf> {
    find_candidate(&dir.join(target))
}

/// First existing file among the Sass candidates for `base`.
fn find_candidate(base: &Path) -> Option<PathBuf> {
    candidates(base)
        .into_iter()
        .find(|p| p.is_file())
        .map(|p| normalize_path(&p))
}

/// Candidate files for an import of `base`, in preference order.
///
/// `dir/name` tries `dir/name.scss`, `dir/_name.scss`, `dir/name.sass`,
/// `dir/_name.sass`, then `dir/name/_index.*` and `dir/name/index.*`.
/// A target that already carries a stylesheet extension tries itself and
/// its partial form only.
fn candidates(base: &Path) -> Vec<PathBuf> {
    let Some(name) = base.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    let parent = base.parent().unwrap_or_else(|| Path::new(""));
    let partial = |file: &str| {
        if file.starts_with('_') {
            None
        } else {
            Some(parent.join(format!("_{file}")))
        }
    };

    if FileFilter::is_stylesheet(base) {
        return std::iter::once(base.to_path_buf())
            .chain(partial(name))
            .collect();
    }

    let mut out = Vec::new();
    for ext in FileFilter::extensions() {
        let file = format!("{name}.{ext}");
        out.push(parent.join(&file));
        out.extend(partial(file.as_str()));
    }
    for index in ["_index", "index"] {
        for ext in FileFilter::extensions() {
            out.push(base.join(format!("{index}.{ext}")));
        }
    }
    out
}
