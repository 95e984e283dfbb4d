//! User-facing notifications.
//!
//! The CRUD layer reports the outcome of every mutation here. Notices go out
//! over a broadcast channel so any number of listeners (an SSE endpoint, a
//! test) can observe them; every notice is also logged.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// The action succeeded
    Success,
    /// The action failed; `message` says why
    Error,
}

/// A single notification, the backend counterpart of a UI toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Short headline, e.g. "Owner created"
    pub title: String,
    /// Detail shown under the headline
    pub message: String,
}

/// Publishes notices to all current subscribers.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notice>,
}

impl Notifier {
    /// Creates a notifier that buffers up to `capacity` notices per slow subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns a receiver for notices published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    /// Publishes a notice. Having no subscribers is not an error.
    pub fn publish(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(title = %notice.title, "{}", notice.message),
            NoticeLevel::Error => warn!(title = %notice.title, "{}", notice.message),
        }
        let _ = self.sender.send(notice);
    }

    /// Publishes a success notice.
    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) {
        self.publish(Notice {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        });
    }

    /// Publishes an error notice.
    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) {
        self.publish(Notice {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}
