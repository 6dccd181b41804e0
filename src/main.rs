//! sasswatch - compile Sass/SCSS and keep output in sync with its imports
//!
//! Entry point for the command-line tool.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sasswatch::observability::{init_tracing, TracingConfig};
use sasswatch::render::{CommandRenderer, OptionsTemplate, OutputStyle};
use sasswatch::{compile_once, Config, Notification, Notifier, Result, WatchSession};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Compile Sass/SCSS stylesheets, optionally watching for changes
#[derive(Parser, Debug)]
#[command(name = "sasswatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Stylesheet file or directory to compile
    root: PathBuf,

    /// Directory to write compiled CSS to (default: next to each source)
    #[arg(short, long, env = "SASSWATCH_OUTPUT")]
    output: Option<PathBuf>,

    /// Directories searched when resolving imports
    #[arg(
        short = 'I',
        long = "include-path",
        env = "SASSWATCH_INCLUDE_PATHS",
        value_delimiter = ','
    )]
    include_paths: Vec<PathBuf>,

    /// Only compile files at the top level of a directory root
    #[arg(long)]
    no_recursive: bool,

    /// Watch the import graph and recompile on change
    #[arg(short, long)]
    watch: bool,

    /// CSS output style (expanded, compressed)
    #[arg(long, env = "SASSWATCH_OUTPUT_STYLE", default_value = "expanded")]
    output_style: OutputStyle,

    /// Emit a source map next to each output file
    #[arg(long)]
    source_map: bool,

    /// Sass compiler executable
    #[arg(long, env = "SASSWATCH_COMPILER", default_value = "sass")]
    compiler: String,

    /// Debounce window for file events, in milliseconds
    #[arg(long, env = "SASSWATCH_DEBOUNCE_MS", default_value = "100")]
    debounce_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SASSWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs and notifications as JSON lines
    #[arg(long, env = "SASSWATCH_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    let config = Config {
        root: cli.root,
        output_dir: cli.output,
        include_paths: cli.include_paths,
        recursive: !cli.no_recursive,
        watch: cli.watch,
        output_style: cli.output_style,
        source_map: cli.source_map,
        compiler: cli.compiler,
        debounce: Duration::from_millis(cli.debounce_ms),
        log_level: cli.log_level,
    };

    tracing::debug!(?config, "Configuration loaded");
    config.validate()?;

    let (notifier, rx) = Notifier::channel();
    let printer = spawn_printer(rx, cli.log_json);

    let renderer = Arc::new(CommandRenderer::new(config.compiler.clone()));
    let watch = config.watch;
    let template = OptionsTemplate::new(config);

    let result = if watch {
        match WatchSession::start(template, renderer, notifier.clone()).await {
            Ok(session) => session.run().await,
            Err(e) => {
                notifier.error(e.to_string());
                Err(e)
            }
        }
    } else {
        compile_once(&template, renderer.as_ref(), &notifier)
            .await
            .map(|count| tracing::info!(files = count, "Compilation finished"))
    };

    // Flush everything emitted so far before exiting.
    drop(notifier);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "Notification printer failed");
    }

    result
}

/// Drain notifications to stderr until every notifier is dropped.
fn spawn_printer(mut rx: mpsc::UnboundedReceiver<Notification>, json: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            tracing::debug!(kind = notification.kind(), "Notification");
            if json {
                match serde_json::to_string(&notification) {
                    Ok(line) => eprintln!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "Cannot serialize notification"),
                }
            } else {
                eprintln!("{notification}");
            }
        }
    })
}
