//! Dependency graph construction.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::filter::{FileFilter, Syntax};
use super::imports::parse_imports;
use super::resolver::ImportResolver;
use super::scanner::scan_directory;
use super::normalize_path;
use crate::error::GraphError;
use crate::render::Importer;

/// Graph construction options.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Extra import search roots, in priority order.
    pub include_paths: Vec<PathBuf>,
    /// Scan subdirectories of the root.
    pub recursive: bool,
    /// Custom importers, consulted before the include paths.
    pub importers: Vec<Arc<dyn Importer>>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            include_paths: Vec::new(),
            recursive: true,
            importers: Vec::new(),
        }
    }
}

/// One stylesheet participating in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetFile {
    /// Absolute, normalized path. Unique within a graph.
    pub path: PathBuf,
    /// Name starts with `_`; never compiled on its own.
    pub is_partial: bool,
}

impl StylesheetFile {
    fn new(path: PathBuf) -> Self {
        let is_partial = FileFilter::is_partial(&path);
        Self { path, is_partial }
    }
}

/// An import that matched no file. The edge is omitted from the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedImport {
    pub importer: PathBuf,
    pub target: String,
}

impl std::fmt::Display for UnresolvedImport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unresolved import \"{}\" in {}",
            self.target,
            self.importer.display()
        )
    }
}

#[derive(Debug)]
struct Node {
    file: StylesheetFile,
    imports: Vec<PathBuf>,
    importers: Vec<PathBuf>,
}

/// Import graph for one watch session.
///
/// Forward (`imports_of`) and reverse (`importers_of`) indices are updated
/// together, so every edge appears in both. The graph is read-only once
/// built and can be shared across tasks behind an `Arc`.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    root_dir: PathBuf,
    nodes: HashMap<PathBuf, Node>,
    order: Vec<PathBuf>,
    warnings: Vec<UnresolvedImport>,
}

impl DependencyGraph {
    /// Directory the graph was scanned from.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the graph has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check if `path` is a node.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    /// Look up a file.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&StylesheetFile> {
        self.nodes.get(path).map(|n| &n.file)
    }

    /// All files in discovery order.
    pub fn files(&self) -> impl Iterator<Item = &StylesheetFile> {
        self.order.iter().filter_map(|p| self.get(p))
    }

    /// All node paths in discovery order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.order
    }

    /// Files `path` imports directly.
    #[must_use]
    pub fn imports_of(&self, path: &Path) -> &[PathBuf] {
        self.nodes.get(path).map_or(&[], |n| n.imports.as_slice())
    }

    /// Files that import `path` directly.
    #[must_use]
    pub fn importers_of(&self, path: &Path) -> &[PathBuf] {
        self.nodes.get(path).map_or(&[], |n| n.importers.as_slice())
    }

    /// Imports that could not be resolved during construction.
    #[must_use]
    pub fn warnings(&self) -> &[UnresolvedImport] {
        &self.warnings
    }

    /// Check that the forward and reverse indices mirror each other.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.nodes.iter().all(|(path, node)| {
            node.imports
                .iter()
                .all(|target| self.importers_of(target).contains(path))
                && node
                    .importers
                    .iter()
                    .all(|source| self.imports_of(source).contains(path))
        })
    }

    /// Add a file. Returns false if it was already present.
    pub(crate) fn add_file(&mut self, path: PathBuf) -> bool {
        if self.nodes.contains_key(&path) {
            return false;
        }
        self.order.push(path.clone());
        self.nodes.insert(
            path.clone(),
            Node {
                file: StylesheetFile::new(path),
                imports: Vec::new(),
                importers: Vec::new(),
            },
        );
        true
    }

    /// Record `importer -> imported`, adding either file if missing.
    pub(crate) fn add_edge(&mut self, importer: &Path, imported: &Path) {
        self.add_file(importer.to_path_buf());
        self.add_file(imported.to_path_buf());

        if let Some(node) = self.nodes.get_mut(importer) {
            if node.imports.iter().any(|p| p == imported) {
                return;
            }
            node.imports.push(imported.to_path_buf());
        }
        if let Some(node) = self.nodes.get_mut(imported) {
            node.importers.push(importer.to_path_buf());
        }
    }
}

/// Build the import graph for `root`.
///
/// A file root is scanned through its containing directory. Every discovered
/// stylesheet is parsed, and files reached through imports (for example in
/// include paths) are added and parsed in turn.
///
/// # Errors
///
/// Returns an error if `root` does not exist or cannot be read. Unresolved
/// imports and unreadable non-root files only produce warnings.
pub fn build_graph(root: &Path, options: &GraphOptions) -> Result<DependencyGraph, GraphError> {
    if !root.exists() {
        return Err(GraphError::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    let root = root
        .canonicalize()
        .map_err(|e| GraphError::unreadable(root, &e))?;

    let scan_root = if root.is_file() {
        root.parent()
            .map_or_else(|| root.clone(), Path::to_path_buf)
    } else {
        root.clone()
    };

    let scan = scan_directory(&scan_root, options.recursive)?;
    let resolver = ImportResolver::new(options.include_paths.clone(), options.importers.clone());

    let mut graph = DependencyGraph {
        root_dir: scan_root.clone(),
        ..Default::default()
    };

    let mut queue: VecDeque<PathBuf> = scan.files.iter().map(|p| normalize_path(p)).collect();
    if root.is_file() && !queue.contains(&root) {
        queue.push_front(root.clone());
    }
    for path in &queue {
        graph.add_file(path.clone());
    }

    let mut parsed = HashSet::new();
    while let Some(path) = queue.pop_front() {
        if !parsed.insert(path.clone()) {
            continue;
        }

        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read stylesheet");
                continue;
            }
        };
        let syntax = FileFilter::detect_syntax(&path).unwrap_or(Syntax::Scss);

        for target in parse_imports(&source, syntax) {
            let Some(resolved) = resolver.resolve(&target, &path) else {
                let warning = UnresolvedImport {
                    importer: path.clone(),
                    target,
                };
                tracing::warn!("{warning}");
                graph.warnings.push(warning);
                continue;
            };

            if !graph.contains(&resolved) {
                queue.push_back(resolved.clone());
            }
            graph.add_edge(&path, &resolved);
        }
    }

    tracing::info!(
        root = %scan_root.display(),
        files = graph.len(),
        unresolved = graph.warnings.len(),
        "Import graph built"
    );

    Ok(graph)
}
