//! Error types and Result aliases for sasswatch.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.
//!
//! Only graph construction failures are fatal to a watch session; watcher
//! and render errors are reported through the notification channel and the
//! session keeps running.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using sasswatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sasswatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Dependency graph construction error.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Render collaborator error.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors raised while building the import graph.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The root path does not exist.
    #[error("root path '{}' does not exist", .path.display())]
    RootNotFound { path: PathBuf },

    /// The root path exists but cannot be read.
    #[error("cannot read '{}': {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// Failure reported by the notification backend.
    #[error("watch backend error: {0}")]
    Backend(String),
}

/// Errors from the render collaborator.
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    /// The compiler process could not be started.
    #[error("failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// The compiler ran and reported a failure.
    #[error("failed to compile '{}' ({status}): {stderr}", .src.display())]
    Failed {
        src: PathBuf,
        status: String,
        stderr: String,
    },

    /// Output could not be written.
    #[error("cannot write '{}': {reason}", .path.display())]
    Io { path: PathBuf, reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl GraphError {
    /// Create an unreadable-path error from an I/O failure.
    pub fn unreadable(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

impl RenderError {
    /// Create an output write error.
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
