//! # Notifications
//!
//! Success and error notices raised by the workflows. What a notice looks
//! like on screen is up to the front end; the workflows only say what to
//! show and for how long.
//!
//! ```text
//! workflow ──► Notifier::notify(Notice) ──┬──► TracingNotifier   (CLI, logs)
//!                                         └──► RecordingNotifier (tests)
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// One message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// `None` keeps the notice until the operator dismisses it.
    pub dismiss_after: Option<Duration>,
}

impl Notice {
    pub fn success(message: impl Into<String>, dismiss_after: Duration) -> Self {
        Notice {
            level: NoticeLevel::Success,
            message: message.into(),
            dismiss_after: Some(dismiss_after),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
            dismiss_after: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Sink for notices.
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(notice = %notice.message, "Success"),
            NoticeLevel::Error => error!(notice = %notice.message, "Error"),
        }
    }
}

/// Keeps every notice in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices().pop()
    }

    pub fn errors(&self) -> Vec<Notice> {
        self.notices().into_iter().filter(Notice::is_error).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
