use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Category of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// One user-visible progress or outcome message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub detail: String,
}

/// Capability for emitting user-visible notifications.
///
/// Injected into the orchestrator rather than reached through a process-wide
/// singleton, so tests can substitute a recording stub.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn info(&self, title: &str, detail: &str) {
        self.notify(Notification {
            kind: NotificationKind::Info,
            title: title.to_string(),
            detail: detail.to_string(),
        });
    }

    fn success(&self, title: &str, detail: &str) {
        self.notify(Notification {
            kind: NotificationKind::Success,
            title: title.to_string(),
            detail: detail.to_string(),
        });
    }

    fn error(&self, title: &str, detail: &str) {
        self.notify(Notification {
            kind: NotificationKind::Error,
            title: title.to_string(),
            detail: detail.to_string(),
        });
    }
}

/// Capability for the terminal navigation side effect on success.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Notifier that accumulates notifications in memory.
///
/// The HTTP service drains it into the response side channel; tests assert on
/// its contents directly.
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    /// Drain all accumulated notifications.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

/// Navigator that records every navigation target.
#[derive(Default)]
pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    pub fn last_path(&self) -> Option<String> {
        self.paths.lock().unwrap().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}
