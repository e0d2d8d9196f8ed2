//! Notification model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned notification identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub i64);

impl NotificationId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A notification for the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(alias = "notificationID")]
    pub id: NotificationId,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(id: i64, message: impl Into<String>) -> Self {
        Self {
            id: NotificationId(id),
            message: message.into(),
            read: false,
        }
    }
}
