use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bus::{EventKind, Presentation};
use crate::transport::EventEnvelope;

/// Identifier assigned to a notification when it is received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl PartialEq<str> for NotificationId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// A received push event with its read state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    read: bool,
}

impl Notification {
    pub(crate) fn from_envelope(
        id: NotificationId,
        envelope: EventEnvelope,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind: envelope.kind,
            title: envelope.title,
            message: envelope.message,
            payload: envelope.payload,
            timestamp,
            read: false,
        }
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    /// Mark as read. Returns true if this changed the state.
    pub(crate) fn mark_read(&mut self) -> bool {
        !std::mem::replace(&mut self.read, true)
    }

    pub fn presentation(&self) -> &'static Presentation {
        self.kind.presentation()
    }
}

/// Point-in-time copy of everything the drawer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawerSnapshot {
    /// Newest first.
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub show_notification_drawer: bool,
}

/// A single state change, published to store subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum StoreChange {
    Added { id: NotificationId },
    Read { id: NotificationId },
    AllRead { count: usize },
    Deleted { id: NotificationId },
    Evicted { id: NotificationId },
    Cleared { count: usize },
    DrawerVisibility { visible: bool },
}
