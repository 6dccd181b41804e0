//! Integration tests for graph-driven watch sessions.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use sasswatch::emitter::drain;
use sasswatch::error::RenderError;
use sasswatch::graph::{ancestors_of, normalize_path};
use sasswatch::render::{OptionsTemplate, Render, RenderOptions};
use sasswatch::watcher::ChangeEvent;
use sasswatch::{compile_once, Config, Error, Notification, Notifier, WatchSession};
use tempfile::TempDir;

/// Render collaborator that records every invocation.
#[derive(Default)]
struct RecordingRenderer {
    calls: Mutex<Vec<RenderOptions>>,
    fail_on: Option<String>,
}

impl RecordingRenderer {
    fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn sources(&self) -> Vec<PathBuf> {
        let mut srcs: Vec<_> = self.calls.lock().iter().map(|o| o.src.clone()).collect();
        srcs.sort();
        srcs
    }
}

impl Render for RecordingRenderer {
    fn render<'a>(
        &'a self,
        options: &'a RenderOptions,
        notifier: &'a Notifier,
    ) -> BoxFuture<'a, Result<(), RenderError>> {
        async move {
            self.calls.lock().push(options.clone());
            let name = options.src.file_name().and_then(|n| n.to_str());
            if name.is_some() && name == self.fail_on.as_deref() {
                return Err(RenderError::Failed {
                    src: options.src.clone(),
                    status: "exit status: 65".to_string(),
                    stderr: "Undefined variable: $missing".to_string(),
                });
            }
            notifier.done(&options.src, &options.dest);
            Ok(())
        }
        .boxed()
    }
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    normalize_path(&path)
}

fn template(root: &Path) -> OptionsTemplate {
    OptionsTemplate::new(Config {
        root: root.to_path_buf(),
        output_dir: Some(root.join("css")),
        debounce: Duration::from_millis(50),
        ..Default::default()
    })
}

async fn start(
    root: &Path,
    renderer: &Arc<RecordingRenderer>,
) -> (
    WatchSession,
    tokio::sync::mpsc::UnboundedReceiver<Notification>,
) {
    let (notifier, rx) = Notifier::channel();
    let session = WatchSession::start(template(root), renderer.clone(), notifier)
        .await
        .unwrap();
    (session, rx)
}

async fn join(handles: Vec<tokio::task::JoinHandle<()>>) {
    for h in handles {
        h.await.unwrap();
    }
}

/// Changing a shared partial recompiles both of its importers.
#[tokio::test]
async fn test_shared_partial_rebuilds_both_importers() {
    let tmp = TempDir::new().unwrap();
    let vars = write(tmp.path(), "_vars.scss", "$primary: #333;");
    let main = write(tmp.path(), "main.scss", "@import 'vars';\nbody { color: $primary; }");
    let other = write(tmp.path(), "other.scss", "@import 'vars';\na { color: $primary; }");

    let renderer = Arc::new(RecordingRenderer::default());
    let (session, mut rx) = start(tmp.path(), &renderer).await;

    let mut ancestors = ancestors_of(session.graph(), &vars);
    assert_eq!(ancestors[0], vars);
    ancestors.sort();
    let mut expected = vec![vars.clone(), main.clone(), other.clone()];
    expected.sort();
    assert_eq!(ancestors, expected);

    join(session.handle_event(ChangeEvent::Changed(vars))).await;

    assert_eq!(renderer.sources(), vec![main.clone(), other]);
    let notes = drain(&mut rx);
    assert!(notes.contains(&Notification::Warn {
        message: format!("=> changed: {}", main.display())
    }));
    assert_eq!(notes.iter().filter(|n| n.kind() == "done").count(), 2);
}

/// Render options are derived per file with the destination recomputed.
#[tokio::test]
async fn test_render_options_derived_per_file() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "_vars.scss", "");
    write(tmp.path(), "main.scss", "@import 'vars';");
    write(tmp.path(), "pages/home.scss", "@import '../vars';");

    let renderer = Arc::new(RecordingRenderer::default());
    let (session, _rx) = start(tmp.path(), &renderer).await;

    join(session.handle_event(ChangeEvent::Changed(tmp.path().join("_vars.scss")))).await;

    let mut dests: Vec<_> = renderer
        .calls
        .lock()
        .iter()
        .map(|o| o.dest.strip_prefix(tmp.path()).unwrap().to_path_buf())
        .collect();
    dests.sort();
    assert_eq!(
        dests,
        vec![PathBuf::from("css/main.css"), PathBuf::from("css/pages/home.css")]
    );
}

/// A leaf with N entry-point ancestors triggers exactly N renders.
#[tokio::test]
async fn test_leaf_change_renders_each_entry_point_once() {
    let tmp = TempDir::new().unwrap();
    let leaf = write(tmp.path(), "_colors.scss", "");
    write(tmp.path(), "_theme.scss", "@import 'colors';");
    write(tmp.path(), "_layout.scss", "@import 'colors';");
    write(tmp.path(), "app.scss", "@import 'theme', 'layout';");
    write(tmp.path(), "admin.scss", "@use 'theme';");
    write(tmp.path(), "print.scss", "@import 'layout';");
    write(tmp.path(), "unrelated.scss", "a { b: c }");

    let renderer = Arc::new(RecordingRenderer::default());
    let (session, _rx) = start(tmp.path(), &renderer).await;

    join(session.handle_event(ChangeEvent::Changed(leaf))).await;

    let names: Vec<_> = renderer
        .sources()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["admin.scss", "app.scss", "print.scss"]);

    let stats = session.dispatcher().stats().snapshot();
    assert_eq!(stats.renders_dispatched, 3);
    assert_eq!(stats.partials_skipped, 3);
}

/// A partial nothing imports triggers no render.
#[tokio::test]
async fn test_orphan_partial_renders_nothing() {
    let tmp = TempDir::new().unwrap();
    let orphan = write(tmp.path(), "_orphan.scss", "");
    write(tmp.path(), "main.scss", "");

    let renderer = Arc::new(RecordingRenderer::default());
    let (session, _rx) = start(tmp.path(), &renderer).await;

    assert!(session.handle_event(ChangeEvent::Changed(orphan)).is_empty());
    assert!(renderer.sources().is_empty());
}

/// Import cycles terminate and each file renders once.
#[tokio::test]
async fn test_cyclic_imports_terminate() {
    let tmp = TempDir::new().unwrap();
    let a = write(tmp.path(), "a.scss", "@import 'b';");
    let b = write(tmp.path(), "b.scss", "@import 'a';");

    let renderer = Arc::new(RecordingRenderer::default());
    let (session, _rx) = start(tmp.path(), &renderer).await;

    let ancestors = ancestors_of(session.graph(), &a);
    assert_eq!(ancestors, vec![a.clone(), b.clone()]);

    join(session.handle_event(ChangeEvent::Changed(a.clone()))).await;
    assert_eq!(renderer.sources(), vec![a, b]);
}

/// An unresolvable import is a warning; the file keeps its other imports.
#[tokio::test]
async fn test_unresolved_import_warns_and_keeps_file() {
    let tmp = TempDir::new().unwrap();
    let mixins = write(tmp.path(), "_mixins.scss", "");
    let a = write(tmp.path(), "a.scss", "@import 'missing';\n@import 'mixins';");

    let renderer = Arc::new(RecordingRenderer::default());
    let (session, mut rx) = start(tmp.path(), &renderer).await;

    assert!(session.graph().contains(&a));
    assert_eq!(session.graph().imports_of(&a), &[mixins.clone()]);
    assert!(session.graph().is_consistent());

    let notes = drain(&mut rx);
    assert!(notes
        .iter()
        .any(|n| n.kind() == "warn" && n.to_string().contains("\"missing\"")));

    join(session.handle_event(ChangeEvent::Changed(mixins))).await;
    assert_eq!(renderer.sources(), vec![a]);
}

/// A watcher error is reported and later changes still render.
#[tokio::test]
async fn test_watcher_error_does_not_end_session() {
    let tmp = TempDir::new().unwrap();
    let main = write(tmp.path(), "main.scss", "");
    write(tmp.path(), "other.scss", "");

    let renderer = Arc::new(RecordingRenderer::default());
    let (session, mut rx) = start(tmp.path(), &renderer).await;
    drain(&mut rx);

    let handles = session.handle_event(ChangeEvent::Error {
        path: None,
        message: "inotify watch limit reached".to_string(),
    });
    assert!(handles.is_empty());

    join(session.handle_event(ChangeEvent::Changed(main.clone()))).await;

    assert_eq!(renderer.sources(), vec![main]);
    let notes = drain(&mut rx);
    assert_eq!(
        notes[0],
        Notification::Error {
            message: "inotify watch limit reached".to_string()
        }
    );
}

/// A failing render is reported and the other renders still happen.
#[tokio::test]
async fn test_render_failure_is_not_fatal_in_watch_mode() {
    let tmp = TempDir::new().unwrap();
    let vars = write(tmp.path(), "_vars.scss", "");
    write(tmp.path(), "broken.scss", "@import 'vars';");
    write(tmp.path(), "fine.scss", "@import 'vars';");

    let renderer = Arc::new(RecordingRenderer::failing_on("broken.scss"));
    let (session, mut rx) = start(tmp.path(), &renderer).await;

    join(session.handle_event(ChangeEvent::Changed(vars))).await;

    assert_eq!(renderer.sources().len(), 2);
    let notes = drain(&mut rx);
    assert_eq!(notes.iter().filter(|n| n.kind() == "error").count(), 1);
    assert_eq!(notes.iter().filter(|n| n.kind() == "done").count(), 1);
}

/// A missing root aborts startup.
#[tokio::test]
async fn test_missing_root_fails_startup() {
    let renderer: Arc<dyn Render> = Arc::new(RecordingRenderer::default());
    let (notifier, _rx) = Notifier::channel();

    let result = WatchSession::start(
        template(Path::new("/nonexistent/sasswatch/styles")),
        renderer,
        notifier,
    )
    .await;

    assert!(matches!(result, Err(Error::Graph(_))));
}

/// One-shot mode renders every entry point and skips partials.
#[tokio::test]
async fn test_compile_once_directory() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "_vars.scss", "");
    let main = write(tmp.path(), "main.scss", "@import 'vars';");
    let home = write(tmp.path(), "pages/home.sass", "@import ../vars\n");

    let renderer = RecordingRenderer::default();
    let (notifier, mut rx) = Notifier::channel();

    let count = compile_once(&template(tmp.path()), &renderer, &notifier)
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(renderer.sources(), vec![main, home]);
    assert_eq!(
        drain(&mut rx).iter().filter(|n| n.kind() == "done").count(),
        2
    );
}

/// One-shot mode stops at the first render failure.
#[tokio::test]
async fn test_compile_once_failure_is_fatal() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.scss", "");
    write(tmp.path(), "b.scss", "");

    let renderer = RecordingRenderer::failing_on("a.scss");
    let (notifier, mut rx) = Notifier::channel();

    let result = compile_once(&template(tmp.path()), &renderer, &notifier).await;

    assert!(matches!(result, Err(Error::Render(_))));
    assert_eq!(renderer.calls.lock().len(), 1);
    assert!(drain(&mut rx).iter().any(|n| n.kind() == "error"));
}

/// End to end: a real edit on disk reaches the renderer through the watcher.
#[tokio::test]
async fn test_file_edit_triggers_render() {
    let tmp = TempDir::new().unwrap();
    let vars = write(tmp.path(), "_vars.scss", "$c: red;");
    let main = write(tmp.path(), "main.scss", "@import 'vars';");

    let renderer = Arc::new(RecordingRenderer::default());
    let (session, _rx) = start(tmp.path(), &renderer).await;

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let run = tokio::spawn(session.run_until(async move {
        let _ = stop_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::write(&vars, "$c: blue;").unwrap();

    let mut rendered = false;
    for _ in 0..100 {
        if renderer.sources().contains(&main) {
            rendered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    stop_tx.send(()).unwrap();
    run.await.unwrap().unwrap();

    assert!(rendered, "editing a partial should re-render its importer");
    assert!(!renderer.sources().contains(&vars));
}
