//! Local state owned by the sync client: the message log and unread set

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::ReconcileMode;
use crate::models::{Message, MessageId, Notification, NotificationId};

/// Ordered local view of a conversation
///
/// Entries keep the order the server reported them in; timestamps are
/// never used to reorder.
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    entries: Vec<Message>,
    /// Ids of sends confirmed locally that no poll has reported yet
    unacknowledged: HashSet<MessageId>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reconcile a full server response into the log
    pub fn reconcile(&mut self, incoming: Vec<Message>, mode: ReconcileMode) {
        match mode {
            ReconcileMode::Replace => {
                self.entries = incoming;
                self.unacknowledged.clear();
            }
            ReconcileMode::MergeById => self.merge(incoming),
        }
    }

    /// Server order first, then confirmed sends the server has not reported yet
    fn merge(&mut self, incoming: Vec<Message>) {
        let reported: HashSet<MessageId> = incoming.iter().filter_map(|m| m.id).collect();
        self.unacknowledged.retain(|id| !reported.contains(id));

        let pending: Vec<Message> = std::mem::take(&mut self.entries)
            .into_iter()
            .filter(|m| m.id.is_some_and(|id| self.unacknowledged.contains(&id)))
            .collect();

        self.entries = incoming;
        self.entries.extend(pending);
    }

    /// Append a message the server has just confirmed
    ///
    /// If a poll already delivered a message with the same id, that entry is
    /// updated in place instead of being duplicated.
    pub fn append_confirmed(&mut self, message: Message) {
        if let Some(id) = message.id {
            if let Some(existing) = self.entries.iter_mut().find(|m| m.id == Some(id)) {
                *existing = message;
                return;
            }
            self.unacknowledged.insert(id);
        }
        self.entries.push(message);
    }
}

/// Unread notifications, in server order
#[derive(Debug, Default, Clone)]
pub struct UnreadNotifications {
    items: Vec<Notification>,
}

impl UnreadNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.items.iter().any(|n| n.id == id)
    }

    pub fn replace(&mut self, items: Vec<Notification>) {
        self.items = items;
    }

    /// Flip the local read flag; returns false if the id is not present
    pub fn mark_read_local(&mut self, id: NotificationId) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    /// Drop an acknowledged notification; returns whether it was present
    pub fn remove(&mut self, id: NotificationId) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }
}

/// Everything the sync client mutates, kept behind a single lock
#[derive(Debug, Default)]
pub struct SyncState {
    pub log: MessageLog,
    pub unread: UnreadNotifications,
    /// Most recent failure, shown once and cleared by the next success
    pub last_error: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Advanced by every visible change
    pub revision: u64,
}

impl SyncState {
    pub fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn record_success(&mut self) {
        self.last_error = None;
        self.last_synced_at = Some(Utc::now());
        self.touch();
    }

    pub fn record_error(&mut self, message: String) {
        self.last_error = Some(message);
        self.touch();
    }
}
