//! Process-wide notification channel.
//!
//! Every component that reports progress or failure receives a [`Notifier`]
//! explicitly. Notifiers are cheap to clone and safe to use from many
//! in-flight render tasks at once: each notification is a single message on
//! an unbounded tokio channel, so messages are never interleaved or lost
//! while the receiver is alive.

use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::mpsc;

/// A notification emitted to the surrounding process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Notification {
    /// Fatal in one-shot mode, reported and survived in watch mode.
    Error { message: String },
    /// Diagnostics and progress such as `=> changed: <path>`.
    Warn { message: String },
    /// Informational text.
    Log { message: String },
    /// A render attempt completed.
    Done { src: PathBuf, dest: PathBuf },
}

impl Notification {
    /// Short name of the notification kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Error { .. } => "error",
            Self::Warn { .. } => "warn",
            Self::Log { .. } => "log",
            Self::Done { .. } => "done",
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error { message } | Self::Warn { message } | Self::Log { message } => {
                f.write_str(message)
            }
            Self::Done { src, dest } => {
                write!(f, "=> rendered {} -> {}", src.display(), dest.display())
            }
        }
    }
}

/// Sending half of the notification channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Create a notifier and the receiver that drains it.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit a notification.
    ///
    /// A closed receiver only means nobody is listening any more, so the
    /// notification is dropped with a debug log.
    pub fn emit(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            tracing::debug!(kind = e.0.kind(), "Notification channel closed");
        }
    }

    /// Emit an `error` notification.
    pub fn error(&self, message: impl Into<String>) {
        self.emit(Notification::Error {
            message: message.into(),
        });
    }

    /// Emit a `warn` notification.
    pub fn warn(&self, message: impl Into<String>) {
        self.emit(Notification::Warn {
            message: message.into(),
        });
    }

    /// Emit a `log` notification.
    pub fn log(&self, message: impl Into<String>) {
        self.emit(Notification::Log {
            message: message.into(),
        });
    }

    /// Emit a `done` notification.
    pub fn done(&self, src: impl Into<PathBuf>, dest: impl Into<PathBuf>) {
        self.emit(Notification::Done {
            src: src.into(),
            dest: dest.into(),
        });
    }
}

/// Collect everything currently buffered on a receiver.
#[must_use]
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}
