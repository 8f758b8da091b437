//! Best-effort, self-expiring notification queue. Stores push remote
//! failures here instead of propagating them to the presentation layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Default time-to-live for a notification.
pub const DEFAULT_TTL: std::time::Duration = std::time::Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    /// At most one live notification per non-null key.
    pub dedup_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ttl: std::time::Duration,
}

/// What callers hand to [`NotificationChannel::push`]; id and creation time
/// are assigned at insertion.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub message: String,
    pub kind: NotificationKind,
    pub dedup_key: Option<String>,
    pub ttl: Option<std::time::Duration>,
}

impl NotificationDraft {
    pub fn error(message: impl Into<String>, dedup_key: impl Into<String>) -> Self {
        NotificationDraft {
            message: message.into(),
            kind: NotificationKind::Error,
            dedup_key: Some(dedup_key.into()),
            ttl: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        NotificationDraft {
            message: message.into(),
            kind: NotificationKind::Info,
            dedup_key: None,
            ttl: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct NotificationChannel {
    queue: Arc<Mutex<Vec<Notification>>>,
}

/// Shared notification channel type
pub type SharedNotifications = Arc<NotificationChannel>;

pub fn create_shared_notifications() -> SharedNotifications {
    Arc::new(NotificationChannel::default())
}

impl NotificationChannel {
    /// Insert a notification and schedule its removal after the TTL. A dedup
    /// key evicts any live notification carrying the same key first. Expiry
    /// timers are independent per notification; only `dismiss` is cancelable
    /// in the sense of removing earlier.
    pub fn push(&self, draft: NotificationDraft) -> Uuid {
        let id = Uuid::new_v4();
        let ttl = draft.ttl.unwrap_or(DEFAULT_TTL);
        let notification = Notification {
            id,
            message: draft.message,
            kind: draft.kind,
            dedup_key: draft.dedup_key,
            created_at: Utc::now(),
            ttl,
        };

        {
            let mut queue = self.queue.lock();
            if let Some(key) = &notification.dedup_key {
                queue.retain(|n| n.dedup_key.as_deref() != Some(key.as_str()));
            }
            debug!("Queued notification {}: {}", id, notification.message);
            queue.push(notification);
        }

        let queue = Arc::downgrade(&self.queue);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(queue) = queue.upgrade() {
                queue.lock().retain(|n| n.id != id);
            }
        });

        id
    }

    /// Remove by id; no-op when the notification already expired.
    pub fn dismiss(&self, id: Uuid) {
        self.queue.lock().retain(|n| n.id != id);
    }

    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    /// Insertion-ordered snapshot for display.
    pub fn notifications(&self) -> Vec<Notification> {
        self.queue.lock().clone()
    }
}
