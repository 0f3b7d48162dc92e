use std::io;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use jdex_core::Notice;
use tokio::process::Command;
use tokio::runtime::Handle;

const NOTIFY_SEND: &str = "notify-send";
const APP_NAME: &str = "JDex";

/// Best-effort delivery of advisory notices. Failures are never reported
/// back to the engine.
pub trait Notifier: Send + Sync + 'static {
    fn notify_user(&self, notice: &Notice);
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn notify_user(&self, notice: &Notice) {
        (**self).notify_user(notice);
    }
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify_user(&self, notice: &Notice) {
        (**self).notify_user(notice);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_user(&self, notice: &Notice) {
        tracing::info!(target: "jdexd::notice", "{notice}");
    }
}

/// Desktop popups through `notify-send`.
///
/// The helper is spawned on the current tokio runtime and reaped by a
/// background task. Outside a runtime, or when the helper cannot be
/// started, the notice goes to the log instead.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: String,
    fallback: LogNotifier,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::with_program(NOTIFY_SEND)
    }
}

impl DesktopNotifier {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            fallback: LogNotifier,
        }
    }

    fn deliver(&self, message: &str) -> io::Result<()> {
        let handle = Handle::try_current()
            .map_err(|err| io::Error::new(io::ErrorKind::Unsupported, err))?;
        let mut child = Command::new(&self.program)
            .arg("--app-name")
            .arg(APP_NAME)
            .arg(APP_NAME)
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        handle.spawn(async move {
            if let Err(err) = child.wait().await {
                tracing::debug!(error = %err, "failed to reap notify-send");
            }
        });
        Ok(())
    }
}

impl Notifier for DesktopNotifier {
    fn notify_user(&self, notice: &Notice) {
        if let Err(err) = self.deliver(&notice.to_string()) {
            tracing::debug!(program = %self.program, error = %err, "desktop notification unavailable");
            self.fallback.notify_user(notice);
        }
    }
}

/// Keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .expect("notifier lock poisoned")
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_user(&self, notice: &Notice) {
        self.notices
            .lock()
            .expect("notifier lock poisoned")
            .push(notice.clone());
    }
}
