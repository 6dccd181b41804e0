//! File system watching and rebuild dispatch.
//!
//! This module provides:
//! - Change events and per-window coalescing
//! - A watcher over an explicit set of files using notify-rs
//! - The dispatcher that turns changes into renders

mod dispatcher;
mod events;
#[allow(clippy::module_inception)]
mod watcher;

pub use dispatcher::{DispatchStats, DispatchStatsSnapshot, Dispatcher};
pub use events::{ChangeEvent, EventBatch};
pub use watcher::{FileWatcher, DEFAULT_DEBOUNCE};
