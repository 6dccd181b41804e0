//! Compile and watch sessions.
//!
//! A watch session builds the import graph once, watches every file in it,
//! and dispatches renders for each change until shut down. The graph is not
//! updated while the session runs: deleted files stay in it and files
//! created later are not watched until the session is restarted.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::emitter::Notifier;
use crate::error::{GraphError, WatcherError};
use crate::graph::{
    build_graph, normalize_path, scan_directory, DependencyGraph, FileFilter, GraphOptions,
};
use crate::render::{OptionsTemplate, Render};
use crate::watcher::{ChangeEvent, Dispatcher, FileWatcher};
use crate::{Error, Result};

/// A running watch session.
pub struct WatchSession {
    template: Arc<OptionsTemplate>,
    graph: Arc<DependencyGraph>,
    dispatcher: Dispatcher,
    notifier: Notifier,
}

impl WatchSession {
    /// Build the import graph and prepare the dispatcher.
    ///
    /// Unresolved imports are reported as `warn` notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the root path is missing or unreadable.
    pub async fn start(
        template: OptionsTemplate,
        renderer: Arc<dyn Render>,
        notifier: Notifier,
    ) -> Result<Self> {
        let config = template.config();
        let root = config.root.clone();
        let options = GraphOptions {
            include_paths: config.include_paths.clone(),
            recursive: config.recursive,
            importers: template.importers().to_vec(),
        };

        let graph = tokio::task::spawn_blocking(move || build_graph(&root, &options))
            .await
            .map_err(|e| Error::internal(format!("graph build task failed: {e}")))??;

        for warning in graph.warnings() {
            notifier.warn(warning.to_string());
        }
        notifier.log(format!(
            "Watching {} stylesheets under {}",
            graph.len(),
            graph.root_dir().display()
        ));

        let graph = Arc::new(graph);
        let template = Arc::new(template);
        let dispatcher = Dispatcher::new(
            Arc::clone(&graph),
            Arc::clone(&template),
            renderer,
            notifier.clone(),
        );

        Ok(Self {
            template,
            graph,
            dispatcher,
            notifier,
        })
    }

    /// The session's import graph.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The session's dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one change event, returning the spawned render tasks.
    pub fn handle_event(&self, event: ChangeEvent) -> Vec<JoinHandle<()>> {
        tracing::debug!(kind = event.kind(), path = ?event.path(), "Change event");
        match event {
            ChangeEvent::Changed(path) => self.dispatcher.on_change(&path),
            ChangeEvent::Removed(path) => self.dispatcher.on_remove(&path),
            ChangeEvent::Error { message, .. } => {
                self.notifier.error(message);
                Vec::new()
            }
        }
    }

    /// Watch until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be started or its event
    /// stream ends unexpectedly.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Watch until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be started or its event
    /// stream ends unexpectedly.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let watcher = FileWatcher::new(self.graph.paths(), self.template.config().debounce);
        self.watch(watcher, shutdown).await
    }

    /// Drive the event loop over a freshly started watcher.
    ///
    /// A watcher that failed to start ends the session with an `error`
    /// notification.
    async fn watch(
        self,
        watcher: Result<FileWatcher>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        let mut watcher = match watcher {
            Ok(watcher) => watcher,
            Err(e) => {
                tracing::error!(error = %e, "File watcher failed to start");
                self.notifier.error(e.to_string());
                return Err(e);
            }
        };
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                event = watcher.recv() => {
                    if let Some(event) = event {
                        // Renders run detached; overlapping renders are allowed.
                        drop(self.handle_event(event));
                    } else {
                        let err = WatcherError::Backend("event stream closed".to_string());
                        self.notifier.error(err.to_string());
                        break Err(err.into());
                    }
                }
                () = &mut shutdown => {
                    self.notifier.log("Stopped watching");
                    break Ok(());
                }
            }
        };

        let stats = self.dispatcher.stats().snapshot();
        tracing::info!(
            changes = stats.changes_seen,
            renders = stats.renders_dispatched,
            failures = stats.render_failures,
            "Watch session finished"
        );

        result
    }
}

/// Compile once without watching.
///
/// A file root is rendered as-is; a directory root renders every non-partial
/// stylesheet found under it. The first failure is reported as an `error`
/// notification and returned.
///
/// # Errors
///
/// Returns an error if the root is missing or any render fails.
pub async fn compile_once(
    template: &OptionsTemplate,
    renderer: &dyn Render,
    notifier: &Notifier,
) -> Result<usize> {
    let config = template.config();
    let root = &config.root;

    if !root.exists() {
        let err = GraphError::RootNotFound { path: root.clone() };
        notifier.error(err.to_string());
        return Err(err.into());
    }

    let targets: Vec<PathBuf> = if root.is_file() {
        vec![normalize_path(root)]
    } else {
        let scan = scan_directory(root, config.recursive).map_err(|e| {
            notifier.error(e.to_string());
            e
        })?;
        scan.files
            .iter()
            .filter(|p| !FileFilter::is_partial(p))
            .map(|p| normalize_path(p))
            .collect()
    };

    for src in &targets {
        let options = template.derive(src);
        if let Err(e) = renderer.render(&options, notifier).await {
            tracing::error!(src = %src.display(), error = %e, "Render failed");
            notifier.error(e.to_string());
            return Err(e.into());
        }
    }

    Ok(targets.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::emitter::{drain, Notification};
    use crate::error::RenderError;
    use crate::render::RenderOptions;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use tempfile::TempDir;

    struct Noop;

    impl Render for Noop {
        fn render<'a>(
            &'a self,
            options: &'a RenderOptions,
            notifier: &'a Notifier,
        ) -> BoxFuture<'a, std::result::Result<(), RenderError>> {
            async move {
                notifier.done(&options.src, &options.dest);
                Ok(())
            }
            .boxed()
        }
    }

    async fn session(
        root: &std::path::Path,
    ) -> (WatchSession, tokio::sync::mpsc::UnboundedReceiver<Notification>) {
        let (notifier, rx) = Notifier::channel();
        let template = OptionsTemplate::new(Config {
            root: root.to_path_buf(),
            ..Default::default()
        });
        let session = WatchSession::start(template, Arc::new(Noop), notifier)
            .await
            .unwrap();
        (session, rx)
    }

    #[tokio::test]
    async fn test_watcher_start_failure_is_reported() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("main.scss"), "").unwrap();
        let (session, mut rx) = session(tmp.path()).await;

        let failed = Err(WatcherError::Backend("inotify unavailable".to_string()).into());
        let result = session.watch(failed, std::future::pending()).await;

        assert!(matches!(result, Err(Error::Watcher(_))));
        let notes = drain(&mut rx);
        assert!(matches!(notes.first(), Some(Notification::Log { .. })));
        assert_eq!(
            notes.last(),
            Some(&Notification::Error {
                message: "watch backend error: inotify unavailable".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_shutdown_ends_with_log() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("main.scss"), "").unwrap();
        let (session, mut rx) = session(tmp.path()).await;

        session.run_until(async {}).await.unwrap();

        assert_eq!(
            drain(&mut rx).last(),
            Some(&Notification::Log {
                message: "Stopped watching".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_compile_once_file_root() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("app.scss");
        std::fs::write(&file, "").unwrap();
        std::fs::write(tmp.path().join("other.scss"), "").unwrap();
        let (notifier, mut rx) = Notifier::channel();
        let template = OptionsTemplate::new(Config {
            root: file.clone(),
            ..Default::default()
        });

        let count = compile_once(&template, &Noop, &notifier).await.unwrap();

        assert_eq!(count, 1);
        let done: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|n| n.kind() == "done")
            .collect();
        assert_eq!(done.len(), 1);
    }
}
