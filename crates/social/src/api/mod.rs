//! REST API integration
//!
//! This module provides:
//! - `ChatApi` and `DirectoryApi`, the seams the sync client and action
//!   handlers are written against
//! - `ApiClient`, the blocking HTTP implementation of both

mod client;

pub use client::ApiClient;

use crate::error::Result;
use crate::models::{
    Follow, FollowKind, Message, NewChatMessage, NewDirectMessage, Notification, NotificationId,
    ProfileUpdate, UserId, UserProfile,
};

/// Message and notification endpoints used by the sync client
pub trait ChatApi: Send + Sync {
    /// `GET /chats/get`: every chat message visible to the token's user
    fn list_chats(&self, token: &str) -> Result<Vec<Message>>;

    /// `POST /chats`: returns the message as stored by the server
    fn send_chat(&self, token: &str, message: &NewChatMessage) -> Result<Message>;

    /// `GET /messages/{sender}/{receiver}`: a direct-message thread
    fn list_direct_messages(&self, sender: UserId, receiver: UserId) -> Result<Vec<Message>>;

    /// `POST /message`: returns the message as stored by the server
    fn send_direct_message(&self, message: &NewDirectMessage) -> Result<Message>;

    /// `GET /notifications/unread/{user}`
    fn unread_notifications(&self, token: &str, user: UserId) -> Result<Vec<Notification>>;

    /// `POST /notifications/markAsRead/{id}`
    fn mark_notification_read(&self, token: &str, id: NotificationId) -> Result<()>;
}

/// Follow-graph, search, and profile endpoints
pub trait DirectoryApi: Send + Sync {
    /// `GET /follows?userID=&type=`
    fn list_follows(&self, user: UserId, kind: FollowKind) -> Result<Vec<Follow>>;

    /// `POST /follow?followingID=`
    fn follow(&self, token: &str, following: UserId) -> Result<()>;

    /// `DELETE /unfollow?followerID=&followingID=`
    fn unfollow(&self, token: &str, follower: UserId, following: UserId) -> Result<()>;

    /// `GET /users/search?query=`
    fn search_users(&self, query: &str) -> Result<Vec<UserProfile>>;

    /// `GET /users/{id}`
    fn get_user(&self, id: UserId) -> Result<UserProfile>;

    /// `PUT /users/{id}`
    fn update_user(&self, token: &str, id: UserId, update: &ProfileUpdate) -> Result<()>;
}
