// In-app notification channel. All failure reporting and user-facing status
// flows through one (title, message, severity) shape; the UI decides how to
// draw it.

use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

/// Handle for emitting notices. Clones share the enabled flag, so muting
/// notifications in one component mutes them everywhere.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
    enabled: Arc<AtomicBool>,
}

impl Notifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Notifier {
                tx,
                enabled: Arc::new(AtomicBool::new(true)),
            },
            rx,
        )
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn toggle(&self) -> bool {
        let now_enabled = !self.enabled();
        self.enabled.store(now_enabled, Ordering::Relaxed);
        now_enabled
    }

    /// Emit a notice regardless of the enabled flag. Used for direct feedback
    /// to a user action (errors, confirmations).
    pub fn notify(&self, title: &str, message: &str, severity: Severity) {
        let notice = Notice {
            title: title.to_string(),
            message: message.to_string(),
            severity,
        };
        // The receiver only disappears during shutdown.
        if self.tx.send(notice).is_err() {
            debug!("Notice dropped, UI channel closed");
        }
    }

    pub fn info(&self, title: &str, message: &str) {
        self.notify(title, message, Severity::Info);
    }

    pub fn success(&self, title: &str, message: &str) {
        self.notify(title, message, Severity::Success);
    }

    pub fn error(&self, title: &str, message: &str) {
        self.notify(title, message, Severity::Error);
    }

    /// Emit a notice only when notifications are enabled. This is the gate
    /// used for unsolicited events like incoming messages.
    pub fn push(&self, title: &str, message: &str) -> bool {
        if !self.enabled() {
            debug!("Notifications disabled, suppressing push from {}", title);
            return false;
        }
        self.info(title, message);
        true
    }
}
