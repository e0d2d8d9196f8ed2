//! Social crate - Client logic for the social backend
//!
//! This crate provides platform-independent client functionality including:
//! - Domain models (Message, Notification, UserProfile, Follow)
//! - REST API client and the traits it implements
//! - Explicit session context decoded from the bearer token
//! - Polling sync client for messages and unread notifications
//! - Action handlers for follows and profile edits
//!
//! This crate has zero UI dependencies.

pub mod actions;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod sync;

pub use actions::{FollowHandler, ProfileHandler};
pub use api::{ApiClient, ChatApi, DirectoryApi};
pub use config::ServerConfig;
pub use error::{ClientError, Result};
pub use models::{
    Follow, FollowKind, Message, MessageId, Notification, NotificationId, ProfileUpdate,
    RegistrationForm, UserId, UserProfile, UserRef,
};
pub use session::{Session, SessionContext, decode_token};
pub use sync::{Conversation, ReconcileMode, SyncClient, SyncOptions, SyncStatus};
