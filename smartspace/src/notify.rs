//! Transient user-facing notices (toasts)

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A short message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Presents notices to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!("{}", notice),
            NoticeLevel::Warning => warn!("{}", notice),
            NoticeLevel::Info | NoticeLevel::Success => info!("{}", notice),
        }
    }
}

/// Notifier that keeps the most recent notices in memory
#[derive(Debug)]
pub struct NoticeBuffer {
    capacity: usize,
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            notices: Mutex::new(Vec::new()),
        }
    }

    /// Notices currently held, oldest first
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Remove and return all held notices
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Default for NoticeBuffer {
    fn default() -> Self {
        Self::new(32)
    }
}

impl Notifier for NoticeBuffer {
    fn notify(&self, notice: Notice) {
        LogNotifier.notify(notice.clone());
        let mut notices = self.notices.lock().unwrap_or_else(|e| e.into_inner());
        notices.push(notice);
        if notices.len() > self.capacity {
            let overflow = notices.len() - self.capacity;
            notices.drain(..overflow);
        }
    }
}
