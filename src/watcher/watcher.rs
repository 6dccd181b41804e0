//! File system watcher using notify-rs.
//!
//! Watches a fixed set of files. Each file's parent directory is watched
//! non-recursively so editors that save by rename keep being observed, and
//! events for anything outside the set are dropped before they leave the
//! watcher.

#![allow(clippy::used_underscore_binding)]

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};
use tokio::sync::mpsc;

use super::events::{ChangeEvent, EventBatch};
use crate::error::WatcherError;
use crate::graph::normalize_path;
use crate::Result;

/// Default debounce duration for file events.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Capacity of the event channel between the backend thread and the session.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// File watcher over an explicit set of paths.
pub struct FileWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    event_rx: mpsc::Receiver<ChangeEvent>,
    watched: Arc<HashSet<PathBuf>>,
    dirs: Vec<PathBuf>,
}

impl FileWatcher {
    /// Start watching `paths`.
    ///
    /// A directory that cannot be watched is reported as a
    /// [`ChangeEvent::Error`] on the event stream; the other paths are still
    /// watched.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch backend cannot be created.
    pub fn new(paths: &[PathBuf], debounce: Duration) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let watched: Arc<HashSet<PathBuf>> =
            Arc::new(paths.iter().map(|p| normalize_path(p)).collect());
        let watched_clone = Arc::clone(&watched);
        let backend_tx = event_tx.clone();

        let mut debouncer = new_debouncer(
            debounce,
            move |result: std::result::Result<
                Vec<notify_debouncer_mini::DebouncedEvent>,
                notify::Error,
            >| {
                let mut batch = EventBatch::new();
                match result {
                    Ok(events) => {
                        for event in events {
                            if !matches!(
                                event.kind,
                                DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
                            ) {
                                continue;
                            }
                            if event.path.exists() {
                                batch.add(ChangeEvent::Changed(event.path));
                            } else {
                                batch.add(ChangeEvent::Removed(event.path));
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Watch error: {:?}", e);
                        batch.add(ChangeEvent::Error {
                            path: e.paths.first().cloned(),
                            message: e.to_string(),
                        });
                    }
                }

                batch.retain_paths(|p| is_watched(&watched_clone, p));
                for event in batch.into_events() {
                    if backend_tx.blocking_send(event).is_err() {
                        tracing::debug!("Event channel closed, dropping file events");
                        break;
                    }
                }
            },
        )
        .map_err(|e| WatcherError::WatchFailed {
            path: "init".to_string(),
            reason: e.to_string(),
        })?;

        let dirs: BTreeSet<PathBuf> = watched
            .iter()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();

        let mut watching = Vec::with_capacity(dirs.len());
        for dir in dirs {
            match debouncer.watcher().watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    tracing::debug!(path = %dir.display(), "Watching directory");
                    watching.push(dir);
                }
                Err(e) => {
                    let err = WatcherError::WatchFailed {
                        path: dir.display().to_string(),
                        reason: e.to_string(),
                    };
                    tracing::warn!(error = %err, "Directory not watched");
                    let event = ChangeEvent::Error {
                        path: Some(dir),
                        message: err.to_string(),
                    };
                    if let Err(e) = event_tx.try_send(event) {
                        tracing::warn!(error = %e, "Cannot queue watch failure");
                    }
                }
            }
        }

        tracing::info!(
            files = watched.len(),
            dirs = watching.len(),
            "File watcher started"
        );

        Ok(Self {
            _debouncer: debouncer,
            event_rx,
            watched,
            dirs: watching,
        })
    }

    /// Receive the next change event.
    ///
    /// Returns `None` if the watcher backend has shut down.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.event_rx.recv().await
    }

    /// Files this watcher reports on, sorted.
    #[must_use]
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.watched.iter().cloned().collect();
        paths.sort();
        paths
    }

    /// Directories registered with the backend.
    #[must_use]
    pub fn watched_dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

/// Check if an event path belongs to the watched set.
fn is_watched(watched: &HashSet<PathBuf>, path: &Path) -> bool {
    watched.contains(path) || watched.contains(&normalize_path(path))
}
