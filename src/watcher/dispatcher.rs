//! Rebuild dispatch for change events.
//!
//! Each change runs one `resolving -> dispatching(n) -> idle` cycle: the
//! changed file's ancestors are resolved, partials are dropped, and one
//! render task is spawned per remaining entry point. Cycles for different
//! changes overlap freely. Renders of the same destination are not
//! serialized, so the last render to finish determines the output.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::emitter::Notifier;
use crate::graph::{ancestors_of, normalize_path, DependencyGraph, FileFilter};
use crate::observability::spans;
use crate::render::{OptionsTemplate, Render};

/// Statistics for rebuild dispatch.
#[derive(Debug, Default)]
pub struct DispatchStats {
    pub changes_seen: AtomicU64,
    pub partials_skipped: AtomicU64,
    pub renders_dispatched: AtomicU64,
    pub renders_completed: AtomicU64,
    pub render_failures: AtomicU64,
}

impl DispatchStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            changes_seen: self.changes_seen.load(Ordering::Relaxed),
            partials_skipped: self.partials_skipped.load(Ordering::Relaxed),
            renders_dispatched: self.renders_dispatched.load(Ordering::Relaxed),
            renders_completed: self.renders_completed.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStatsSnapshot {
    pub changes_seen: u64,
    pub partials_skipped: u64,
    pub renders_dispatched: u64,
    pub renders_completed: u64,
    pub render_failures: u64,
}

/// Turns change notifications into render invocations.
#[derive(Clone)]
pub struct Dispatcher {
    graph: Arc<DependencyGraph>,
    template: Arc<OptionsTemplate>,
    renderer: Arc<dyn Render>,
    notifier: Notifier,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    /// Create a dispatcher over a built graph.
    #[must_use]
    pub fn new(
        graph: Arc<DependencyGraph>,
        template: Arc<OptionsTemplate>,
        renderer: Arc<dyn Render>,
        notifier: Notifier,
    ) -> Self {
        Self {
            graph,
            template,
            renderer,
            notifier,
            stats: DispatchStats::new(),
        }
    }

    /// Entry points to recompile when `path` changes.
    ///
    /// This is the ancestor set of `path` with partials removed.
    #[must_use]
    pub fn targets_for(&self, path: &Path) -> Vec<PathBuf> {
        self.resolve_targets(path).0
    }

    /// Targets for `path` and the number of partial ancestors dropped.
    fn resolve_targets(&self, path: &Path) -> (Vec<PathBuf>, u64) {
        let path = normalize_path(path);
        let ancestors = ancestors_of(&self.graph, &path);
        let total = ancestors.len();

        let targets: Vec<PathBuf> = ancestors
            .into_iter()
            .filter(|p| !self.is_partial(p))
            .collect();

        let skipped = (total - targets.len()) as u64;
        (targets, skipped)
    }

    fn record_change(&self, skipped: u64) {
        self.stats.changes_seen.fetch_add(1, Ordering::Relaxed);
        self.stats
            .partials_skipped
            .fetch_add(skipped, Ordering::Relaxed);
    }

    /// React to a modified file.
    ///
    /// Spawns one render per affected entry point and returns their handles.
    /// Dropping the handles leaves the renders running.
    pub fn on_change(&self, changed: &Path) -> Vec<JoinHandle<()>> {
        let span = spans::change_span(changed);
        let _guard = span.enter();

        tracing::debug!("Resolving ancestors");
        let (targets, skipped) = self.resolve_targets(changed);
        self.record_change(skipped);

        tracing::debug!(renders = targets.len(), "Dispatching renders");
        targets.into_iter().map(|src| self.spawn_render(src)).collect()
    }

    /// React to a deleted file.
    ///
    /// The graph keeps the file; its importers are recompiled so they
    /// report the now-missing import.
    pub fn on_remove(&self, removed: &Path) -> Vec<JoinHandle<()>> {
        let removed = normalize_path(removed);
        let (targets, skipped) = self.resolve_targets(&removed);
        self.record_change(skipped);
        self.notifier
            .warn(format!("=> removed: {}", removed.display()));

        targets
            .into_iter()
            .filter(|p| p != &removed)
            .map(|src| self.spawn_render(src))
            .collect()
    }

    /// Get current stats.
    #[must_use]
    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    fn is_partial(&self, path: &Path) -> bool {
        self.graph
            .get(path)
            .map_or_else(|| FileFilter::is_partial(path), |f| f.is_partial)
    }

    fn spawn_render(&self, src: PathBuf) -> JoinHandle<()> {
        let options = self.template.derive(&src);
        let renderer = Arc::clone(&self.renderer);
        let notifier = self.notifier.clone();
        let stats = Arc::clone(&self.stats);

        notifier.warn(format!("=> changed: {}", src.display()));
        stats.renders_dispatched.fetch_add(1, Ordering::Relaxed);

        let span = spans::render_span(&src);
        tokio::spawn(
            async move {
                match renderer.render(&options, &notifier).await {
                    Ok(()) => {
                        stats.renders_completed.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(dest = %options.dest.display(), "Render finished");
                    }
                    Err(e) => {
                        stats.render_failures.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(error = %e, "Render failed");
                        notifier.error(e.to_string());
                    }
                }
            }
            .instrument(span),
        )
    }
}
