//! sasswatch library
//!
//! Incremental watch-mode front end for Sass/SCSS compilation: builds an
//! import graph over a stylesheet tree, watches every file in it, and
//! recompiles exactly the entry points affected by each change.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod emitter;
pub mod error;
pub mod graph;
pub mod observability;
pub mod render;
pub mod session;
pub mod watcher;

pub use config::Config;
pub use emitter::{Notification, Notifier};
pub use error::{Error, Result};
pub use session::{compile_once, WatchSession};
