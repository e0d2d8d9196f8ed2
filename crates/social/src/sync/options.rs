//! Sync client options

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::UserId;

/// Default poll interval, matching the web client's fixed 5 seconds
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Which message set the client mirrors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conversation {
    /// The shared chat room (`/chats`)
    #[default]
    Room,
    /// A one-to-one thread with `peer` (`/messages/{me}/{peer}`)
    Direct { peer: UserId },
}

/// How a poll response is folded into the local log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// The log becomes exactly what the server returned
    #[default]
    Replace,
    /// Server response first, then confirmed sends it has not reported yet
    MergeById,
}

/// Options for [`SyncClient`](super::SyncClient)
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub conversation: Conversation,
    pub poll_interval: Duration,
    pub reconcile: ReconcileMode,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            conversation: Conversation::Room,
            poll_interval: DEFAULT_POLL_INTERVAL,
            reconcile: ReconcileMode::Replace,
        }
    }
}
