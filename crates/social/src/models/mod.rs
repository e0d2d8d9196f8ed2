//! Domain models for social entities

mod follow;
mod message;
mod notification;
mod timestamp;
mod user;

pub use follow::{Follow, FollowKind};
pub use message::{Message, MessageBuilder, MessageId, NewChatMessage, NewDirectMessage};
pub use notification::{Notification, NotificationId};
pub use user::{
    LoginRequest, ProfileUpdate, RegisterRequest, RegistrationForm, UserId, UserProfile, UserRef,
};
