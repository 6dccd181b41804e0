//! Render collaborator interface.
//!
//! The stylesheet compiler itself lives outside this crate. The watch engine
//! only builds [`RenderOptions`] and hands them to a [`Render`]
//! implementation, which reports `log`/`done` notifications itself and
//! returns an error on failure.

mod command;
mod extension;
mod options;

use futures::future::BoxFuture;

pub use command::CommandRenderer;
pub use extension::{Importer, PrefixImporter};
pub use options::{OptionsTemplate, OutputStyle, RenderOptions};

use crate::emitter::Notifier;
use crate::error::RenderError;

/// A stylesheet compiler.
pub trait Render: Send + Sync {
    /// Compile `options.src` into `options.dest`.
    ///
    /// Implementations emit `done` on success. Failures are returned, not
    /// emitted; the caller decides whether they are fatal.
    fn render<'a>(
        &'a self,
        options: &'a RenderOptions,
        notifier: &'a Notifier,
    ) -> BoxFuture<'a, Result<(), RenderError>>;
}
