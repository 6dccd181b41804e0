//! Change event types and batching.

#![allow(clippy::missing_const_for_fn)]

use std::path::{Path, PathBuf};

/// A logical change reported by the filesystem watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A watched file was created or modified.
    Changed(PathBuf),
    /// A watched file no longer exists.
    Removed(PathBuf),
    /// The watch backend failed. The session keeps running.
    Error {
        path: Option<PathBuf>,
        message: String,
    },
}

impl ChangeEvent {
    /// Get the path associated with this event, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Changed(p) | Self::Removed(p) => Some(p),
            Self::Error { path, .. } => path.as_deref(),
        }
    }

    /// Short name of the event kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Changed(_) => "changed",
            Self::Removed(_) => "removed",
            Self::Error { .. } => "error",
        }
    }
}

/// Events observed during one debounce window.
///
/// Repeated changes to the same path collapse to one entry, and the last
/// observation for a path wins between `changed` and `removed`.
#[derive(Debug, Default)]
pub struct EventBatch {
    /// Files that exist and were modified.
    pub changed: Vec<PathBuf>,
    /// Files that were deleted.
    pub removed: Vec<PathBuf>,
    /// Backend failures.
    pub errors: Vec<ChangeEvent>,
}

impl EventBatch {
    /// Create a new empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event to the batch.
    pub fn add(&mut self, event: ChangeEvent) {
        match event {
            ChangeEvent::Changed(path) => {
                self.removed.retain(|p| p != &path);
                if !self.changed.contains(&path) {
                    self.changed.push(path);
                }
            }
            ChangeEvent::Removed(path) => {
                self.changed.retain(|p| p != &path);
                if !self.removed.contains(&path) {
                    self.removed.push(path);
                }
            }
            error @ ChangeEvent::Error { .. } => self.errors.push(error),
        }
    }

    /// Keep only file events whose path satisfies `keep`.
    pub fn retain_paths(&mut self, mut keep: impl FnMut(&Path) -> bool) {
        self.changed.retain(|p| keep(p));
        self.removed.retain(|p| keep(p));
    }

    /// Check if batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty() && self.errors.is_empty()
    }

    /// Get total number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changed.len() + self.removed.len() + self.errors.len()
    }

    /// Flatten into individual events: errors first, then changes, then removals.
    #[must_use]
    pub fn into_events(self) -> Vec<ChangeEvent> {
        let mut events = self.errors;
        events.extend(self.changed.into_iter().map(ChangeEvent::Changed));
        events.extend(self.removed.into_iter().map(ChangeEvent::Removed));
        events
    }
}
