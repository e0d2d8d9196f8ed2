//! Polling sync client
//!
//! Keeps a local view of one conversation and the user's unread
//! notifications approximately consistent with the server.
//!
//! Every request captures a `RequestGuard` (client epoch plus session
//! generation) before it leaves. When the response comes back it is applied
//! only if both counters are unchanged, so nothing issued before `stop()`,
//! `logout()` or a re-login can land afterwards. Overlapping requests within
//! one epoch are not ordered: whichever resolves last wins.

use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::poller;
use super::state::SyncState;
use super::{Conversation, SyncOptions};
use crate::api::ChatApi;
use crate::error::{ClientError, Result};
use crate::models::{Message, NewChatMessage, NewDirectMessage, Notification, NotificationId, UserId};
use crate::session::SessionContext;

/// Snapshot of the lifetime a request was issued in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequestGuard {
    epoch: u64,
    session_generation: u64,
}

/// Point-in-time summary for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    /// Changes whenever messages, notifications or the error banner change
    pub revision: u64,
    pub last_error: Option<String>,
    pub last_synced_at: Option<chrono::DateTime<chrono::Utc>>,
    pub polling: bool,
    pub message_count: usize,
    pub unread_count: usize,
}

/// Client that mirrors messages and unread notifications from the server
pub struct SyncClient {
    api: Arc<dyn ChatApi>,
    session: Arc<SessionContext>,
    options: SyncOptions,
    state: RwLock<SyncState>,
    epoch: AtomicU64,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl SyncClient {
    /// Create a new sync client; nothing is fetched until asked
    pub fn new(api: Arc<dyn ChatApi>, session: Arc<SessionContext>, options: SyncOptions) -> Self {
        Self {
            api,
            session,
            options,
            state: RwLock::new(SyncState::default()),
            epoch: AtomicU64::new(0),
            poller: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    // === Lifecycle ===

    /// Begin periodic synchronization on the current tokio runtime
    ///
    /// The first cycle runs immediately. Returns `false` without doing
    /// anything if already polling, if nobody is signed in, or if called
    /// outside a runtime.
    pub fn start(self: &Arc<Self>) -> bool {
        if !self.session.is_authenticated() {
            debug!("Not starting poller: no authenticated session");
            return false;
        }

        let mut slot = self.lock_poller();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Poller already running");
            return false;
        }

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Cannot start poller outside a tokio runtime: {}", e);
                return false;
            }
        };

        let period = self.options.poll_interval;
        *slot = Some(poller::spawn(&runtime, Arc::downgrade(self), period));
        info!("Polling {:?} every {:?}", self.options.conversation, period);
        true
    }

    /// Cancel periodic synchronization
    ///
    /// In-flight requests are not aborted; their responses are discarded.
    /// Returns whether a poller was running.
    pub fn stop(&self) -> bool {
        let handle = self.lock_poller().take();
        let was_running = handle.as_ref().is_some_and(|h| !h.is_finished());
        if let Some(handle) = handle {
            handle.abort();
        }

        // Advance the epoch under the state lock so no apply can straddle it
        let _state = self.write_state();
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if was_running {
            info!("Stopped polling");
        }
        was_running
    }

    pub fn is_polling(&self) -> bool {
        self.lock_poller()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    // === Sync operations ===

    /// Run one poll cycle: messages, then unread notifications
    ///
    /// Failures are logged and recorded in `last_error`; the next cycle is
    /// the only retry.
    pub fn poll_once(&self) {
        let _ = self.fetch_messages();
        let _ = self.fetch_unread_notifications();
    }

    /// Fetch the whole conversation and reconcile it into the log
    ///
    /// Returns `Ok(true)` if the response was applied and `Ok(false)` if it
    /// arrived after the client was stopped or the session changed.
    pub fn fetch_messages(&self) -> Result<bool> {
        const CONTEXT: &str = "Fetching messages";
        let guard = self.guard();
        let session = self
            .session
            .require()
            .map_err(|e| self.fail(guard, CONTEXT, e))?;

        let response = match self.options.conversation {
            Conversation::Room => self.api.list_chats(&session.token),
            Conversation::Direct { peer } => self.api.list_direct_messages(session.user_id, peer),
        };
        let messages = response.map_err(|e| self.fail(guard, CONTEXT, e))?;

        let count = messages.len();
        let mode = self.options.reconcile;
        let applied = self.apply(guard, |state| {
            state.log.reconcile(messages, mode);
            state.record_success();
        });

        if applied {
            debug!("Reconciled {} messages", count);
        } else {
            debug!("Discarded stale message response ({} messages)", count);
        }
        Ok(applied)
    }

    /// Fetch unread notifications and replace the local unread set
    pub fn fetch_unread_notifications(&self) -> Result<bool> {
        const CONTEXT: &str = "Fetching notifications";
        let guard = self.guard();
        let session = self
            .session
            .require()
            .map_err(|e| self.fail(guard, CONTEXT, e))?;

        let notifications = self
            .api
            .unread_notifications(&session.token, session.user_id)
            .map_err(|e| self.fail(guard, CONTEXT, e))?;

        let count = notifications.len();
        let applied = self.apply(guard, |state| {
            state.unread.replace(notifications);
            state.record_success();
        });

        if !applied {
            debug!("Discarded stale notification response ({} items)", count);
        }
        Ok(applied)
    }

    /// Send a message and append the server-confirmed copy to the log
    ///
    /// `receiver` is raw user input and must be a positive integer; anything
    /// else fails before a request is made. Nothing is inserted before the
    /// server confirms.
    pub fn send_message(&self, content: &str, receiver: &str) -> Result<Message> {
        const CONTEXT: &str = "Sending message";
        let guard = self.guard();
        let receiver = UserId::parse(receiver).map_err(|e| self.fail(guard, CONTEXT, e))?;
        let session = self
            .session
            .require()
            .map_err(|e| self.fail(guard, CONTEXT, e))?;

        let response = match self.options.conversation {
            Conversation::Room => {
                let body = NewChatMessage::new(content, session.user_id, receiver);
                self.api.send_chat(&session.token, &body)
            }
            Conversation::Direct { peer } => {
                if receiver != peer {
                    let e = ClientError::validation(format!(
                        "user {} is not part of this conversation",
                        receiver
                    ));
                    return Err(self.fail(guard, CONTEXT, e));
                }
                if content.trim().is_empty() {
                    return Err(self.fail(guard, CONTEXT, ClientError::validation("Message is empty")));
                }
                let body = NewDirectMessage::new(content, session.user_id, receiver);
                self.api.send_direct_message(&body)
            }
        };
        let message = response.map_err(|e| self.fail(guard, CONTEXT, e))?;

        let confirmed = message.clone();
        let applied = self.apply(guard, |state| {
            state.log.append_confirmed(confirmed);
            state.last_error = None;
            state.touch();
        });
        if !applied {
            debug!("Discarded send confirmation after client shutdown");
        }
        Ok(message)
    }

    /// Acknowledge a notification
    ///
    /// The local copy is flagged read before the request. It leaves the
    /// unread set only once the server confirms; on failure it stays,
    /// still flagged read.
    pub fn mark_read(&self, id: NotificationId) -> Result<()> {
        const CONTEXT: &str = "Marking notification read";
        let guard = self.guard();
        let session = self
            .session
            .require()
            .map_err(|e| self.fail(guard, CONTEXT, e))?;

        {
            let mut state = self.write_state();
            if state.unread.mark_read_local(id) {
                state.touch();
            }
        }

        self.api
            .mark_notification_read(&session.token, id)
            .map_err(|e| self.fail(guard, CONTEXT, e))?;

        self.apply(guard, |state| {
            state.unread.remove(id);
            state.last_error = None;
            state.touch();
        });
        debug!("Notification {} acknowledged", id);
        Ok(())
    }

    // === Read access ===

    /// Current log contents, in order
    pub fn messages(&self) -> Vec<Message> {
        self.read_state().log.entries().to_vec()
    }

    /// Current unread set, including entries flagged read but not yet acknowledged
    pub fn unread_notifications(&self) -> Vec<Notification> {
        self.read_state().unread.items().to_vec()
    }

    pub fn status(&self) -> SyncStatus {
        let polling = self.is_polling();
        let state = self.read_state();
        SyncStatus {
            revision: state.revision,
            last_error: state.last_error.clone(),
            last_synced_at: state.last_synced_at,
            polling,
            message_count: state.log.len(),
            unread_count: state.unread.len(),
        }
    }

    /// Clear the error banner
    pub fn dismiss_error(&self) {
        let mut state = self.write_state();
        if state.last_error.take().is_some() {
            state.touch();
        }
    }

    // === Internals ===

    fn guard(&self) -> RequestGuard {
        RequestGuard {
            epoch: self.epoch.load(Ordering::SeqCst),
            session_generation: self.session.generation(),
        }
    }

    /// Run `f` against the state if `guard` still describes the current lifetime
    fn apply<F>(&self, guard: RequestGuard, f: F) -> bool
    where
        F: FnOnce(&mut SyncState),
    {
        let mut state = self.write_state();
        if self.guard() != guard {
            return false;
        }
        f(&mut state);
        true
    }

    /// Log a failure, surface it as the banner if still current, and hand it back
    fn fail(&self, guard: RequestGuard, context: &str, err: ClientError) -> ClientError {
        warn!("{} failed: {}", context, err);
        let message = format!("{}: {}", context, err);
        self.apply(guard, |state| state.record_error(message));
        err
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SyncState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SyncState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_poller(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_poller().take() {
            handle.abort();
        }
    }
}
