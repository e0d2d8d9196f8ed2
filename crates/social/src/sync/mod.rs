//! Sync engine for mirroring messages and notifications
//!
//! A [`SyncClient`] owns the local message log and unread set, polls the
//! server on a fixed interval, and applies user actions (send, mark read).

mod client;
mod options;
mod poller;
mod state;

pub use client::{SyncClient, SyncStatus};
pub use options::{Conversation, DEFAULT_POLL_INTERVAL, ReconcileMode, SyncOptions};
pub use state::{MessageLog, SyncState, UnreadNotifications};
