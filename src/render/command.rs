//! Renderer backed by an external Sass compiler executable.

use std::process::Stdio;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::process::Command;

use super::{Render, RenderOptions};
use crate::emitter::Notifier;
use crate::error::RenderError;

/// Runs a command-line Sass compiler (`sass` by default) once per render.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
}

impl CommandRenderer {
    /// Create a renderer invoking `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments passed to the compiler for `options`.
    #[must_use]
    pub fn args(options: &RenderOptions) -> Vec<String> {
        let mut args = vec![format!("--style={}", options.output_style)];

        for dir in &options.include_paths {
            args.push(format!("--load-path={}", dir.display()));
        }

        if options.source_map.is_some() {
            args.push("--source-map".to_string());
        } else {
            args.push("--no-source-map".to_string());
        }

        args.push(options.src.display().to_string());
        args.push(options.dest.display().to_string());
        args
    }

    async fn run(&self, options: &RenderOptions, notifier: &Notifier) -> Result<(), RenderError> {
        if let Some(parent) = options.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RenderError::io(parent, &e))?;
        }

        if !options.importers.is_empty() {
            tracing::debug!(
                count = options.importers.len(),
                "Custom importers are not forwarded to an external compiler"
            );
        }

        let output = Command::new(&self.program)
            .args(Self::args(options))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| RenderError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(RenderError::Failed {
                src: options.src.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        // Deprecation and @warn output arrives on stderr of a successful run.
        if !stderr.is_empty() {
            notifier.warn(stderr);
        }

        notifier.done(&options.src, &options.dest);
        Ok(())
    }
}

impl Default for CommandRenderer {
    fn default() -> Self {
        Self::new("sass")
    }
}

impl Render for CommandRenderer {
    fn render<'a>(
        &'a self,
        options: &'a RenderOptions,
        notifier: &'a Notifier,
    ) -> BoxFuture<'a, Result<(), RenderError>> {
        self.run(options, notifier).boxed()
    }
}
