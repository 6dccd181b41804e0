//! Ancestor queries over the reverse import index.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use super::builder::DependencyGraph;

/// Every file whose output can change when `path` changes.
///
/// The first element is always `path` itself, followed by its transitive
/// importers in breadth-first order. Each file appears once, and import
/// cycles terminate.
#[must_use]
pub fn ancestors_of(graph: &DependencyGraph, path: &Path) -> Vec<PathBuf> {
    let mut visited: HashSet<&Path> = HashSet::new();
    let mut queue: VecDeque<&Path> = VecDeque::new();
    let mut out = vec![path.to_path_buf()];

    visited.insert(path);
    queue.push_back(path);

    while let Some(current) = queue.pop_front() {
        for importer in graph.importers_of(current) {
            if visited.insert(importer.as_path()) {
                out.push(importer.clone());
                queue.push_back(importer.as_path());
            }
        }
    }

    out
}
