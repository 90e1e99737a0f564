//! User-facing notifications for knowledge-base operations
//!
//! The client only reports what happened; showing it (toasts, status bars,
//! log lines) is up to the [`Notifier`] the application installs. The
//! streaming path never notifies.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info};

/// Identifies a long-lived notice so it can be dismissed later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoticeId(pub u64);

/// Notification surface
pub trait Notifier: Send + Sync {
    /// Show an informational notice that stays until dismissed
    fn info(&self, message: &str) -> NoticeId;

    /// Show a short-lived success notice
    fn success(&self, message: &str);

    /// Show a short-lived error notice
    fn error(&self, message: &str);

    /// Remove a notice created by [`Notifier::info`]
    fn dismiss(&self, _notice: NoticeId) {}
}

/// Notifier that writes notices to the `tracing` log
#[derive(Debug, Default)]
pub struct TracingNotifier {
    next_id: AtomicU64,
}

impl TracingNotifier {
    /// Create a notifier whose notice ids start at zero
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for TracingNotifier {
    fn info(&self, message: &str) -> NoticeId {
        let id = NoticeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        info!(notice = id.0, "{}", message);
        id
    }

    fn success(&self, message: &str) {
        info!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}

/// Notifier that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn info(&self, _message: &str) -> NoticeId {
        NoticeId(0)
    }

    fn success(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}
