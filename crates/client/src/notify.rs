//! Transient user-facing notifications

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// How long a notification stays visible by default
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A message that dismisses itself once `ttl` has elapsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    shown_at: Instant,
    ttl: Duration,
}

impl Notification {
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) < self.ttl
    }
}

/// Holds the latest notification; a newer one replaces it
#[derive(Debug)]
pub struct Notifier {
    current: Mutex<Option<Notification>>,
    ttl: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: Mutex::new(None),
            ttl,
        }
    }

    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        *self.current.lock() = Some(Notification {
            kind,
            message: message.into(),
            shown_at: Instant::now(),
            ttl: self.ttl,
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(NotificationKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NotificationKind::Error, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NotificationKind::Info, message);
    }

    /// The visible notification, if it has not expired
    pub fn current(&self) -> Option<Notification> {
        let now = Instant::now();
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|n| !n.is_visible_at(now)) {
            *current = None;
        }
        current.clone()
    }

    /// The latest notification regardless of expiry
    pub fn last(&self) -> Option<Notification> {
        self.current.lock().clone()
    }

    pub fn dismiss(&self) {
        *self.current.lock() = None;
    }
}
