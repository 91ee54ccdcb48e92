//! User-facing notifications (the "toasts" of the front end).

use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: Option<String>,
    /// Stays visible until dismissed (configuration problems).
    pub persistent: bool,
}

impl Notification {
    pub fn success<S: Into<String>>(title: S) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            description: None,
            persistent: false,
        }
    }

    pub fn info<S: Into<String>>(title: S) -> Self {
        Self {
            level: NotificationLevel::Info,
            ..Self::success(title)
        }
    }

    pub fn error<S: Into<String>>(title: S) -> Self {
        Self {
            level: NotificationLevel::Error,
            ..Self::success(title)
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }
}

/// Fire-and-forget sink. Implementations must not block.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Prints notifications to stderr so they do not mix with translated output.
#[derive(Debug, Default, Clone)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let marker = match notification.level {
            NotificationLevel::Success => "✓",
            NotificationLevel::Info => "•",
            NotificationLevel::Error => "✗",
        };
        match notification.description {
            Some(description) => eprintln!("{} {}: {}", marker, notification.title, description),
            None => eprintln!("{} {}", marker, notification.title),
        }
    }
}
