//! Message model shared by the chat room and direct-message threads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{UserId, UserRef};

/// Server-assigned message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl MessageId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message in the local log
///
/// The chat endpoints call the body `message` while the direct-message
/// endpoints call it `content`; both are accepted on the way in, and
/// `content` wins when a payload carries both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireMessage")]
pub struct Message {
    /// Server id, when the endpoint reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    pub content: String,
    pub sender: UserRef,
    pub receiver: UserRef,
    /// Not guaranteed to be monotonic across the log
    pub timestamp: Option<DateTime<Utc>>,
}

/// Message as any endpoint may send it
#[derive(Deserialize)]
struct WireMessage {
    #[serde(default, alias = "messageID", alias = "chatID")]
    id: Option<MessageId>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    message: Option<String>,
    sender: UserRef,
    receiver: UserRef,
    #[serde(default, deserialize_with = "super::timestamp::deserialize")]
    timestamp: Option<DateTime<Utc>>,
}

impl TryFrom<WireMessage> for Message {
    type Error = String;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let content = wire
            .content
            .or(wire.message)
            .ok_or_else(|| "message has neither `content` nor `message`".to_string())?;

        Ok(Message {
            id: wire.id,
            content,
            sender: wire.sender,
            receiver: wire.receiver,
            timestamp: wire.timestamp,
        })
    }
}

impl Message {
    /// Create a new message builder
    pub fn builder(sender: UserRef, receiver: UserRef) -> MessageBuilder {
        MessageBuilder::new(sender, receiver)
    }

    /// Whether the given user sent this message
    pub fn is_from(&self, user_id: UserId) -> bool {
        self.sender.user_id == user_id
    }
}

/// Builder for creating Message instances
pub struct MessageBuilder {
    id: Option<MessageId>,
    content: String,
    sender: UserRef,
    receiver: UserRef,
    timestamp: Option<DateTime<Utc>>,
}

impl MessageBuilder {
    fn new(sender: UserRef, receiver: UserRef) -> Self {
        Self {
            id: None,
            content: String::new(),
            sender,
            receiver,
            timestamp: None,
        }
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(MessageId(id));
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn build(self) -> Message {
        Message {
            id: self.id,
            content: self.content,
            sender: self.sender,
            receiver: self.receiver,
            timestamp: self.timestamp,
        }
    }
}

/// Body of `POST /chats`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewChatMessage {
    pub message: String,
    pub sender: UserRef,
    pub receiver: UserRef,
}

impl NewChatMessage {
    pub fn new(content: impl Into<String>, sender: UserId, receiver: UserId) -> Self {
        Self {
            message: content.into(),
            sender: UserRef::id(sender),
            receiver: UserRef::id(receiver),
        }
    }
}

/// Body of `POST /message`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDirectMessage {
    pub content: String,
    pub sender: UserRef,
    pub receiver: UserRef,
    pub timestamp: DateTime<Utc>,
}

impl NewDirectMessage {
    pub fn new(content: impl Into<String>, sender: UserId, receiver: UserId) -> Self {
        Self {
            content: content.into(),
            sender: UserRef::id(sender),
            receiver: UserRef::id(receiver),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_chat_payload_uses_message_field() {
        let message: Message = serde_json::from_value(json!({
            "id": 9,
            "message": "hello",
            "sender": { "userID": 1, "username": "ada" },
            "receiver": { "userID": 2, "username": "bob" }
        }))
        .unwrap();

        assert_eq!(message.id, Some(MessageId(9)));
        assert_eq!(message.content, "hello");
        assert_eq!(message.sender.username.as_deref(), Some("ada"));
        assert_eq!(message.timestamp, None);
        assert!(message.is_from(UserId(1)));
    }

    #[test]
    fn test_direct_payload_uses_content_field() {
        let message: Message = serde_json::from_value(json!({
            "content": "hi",
            "sender": { "userID": 1 },
            "receiver": { "userID": 2 },
            "timestamp": "2024-05-01T12:30:00"
        }))
        .unwrap();

        assert_eq!(message.id, None);
        assert_eq!(message.content, "hi");
        assert_eq!(
            message.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_unparseable_timestamp_does_not_fail_message() {
        let message: Message = serde_json::from_value(json!({
            "content": "hi",
            "sender": { "userID": 1 },
            "receiver": { "userID": 2 },
            "timestamp": "not a date"
        }))
        .unwrap();
        assert_eq!(message.timestamp, None);
    }

    #[test]
    fn test_both_body_fields_prefer_content() {
        let message: Message = serde_json::from_value(json!({
            "id": 1,
            "message": "from chat",
            "content": "from dm",
            "sender": { "userID": 1 },
            "receiver": { "userID": 2 }
        }))
        .unwrap();
        assert_eq!(message.content, "from dm");
    }

    #[test]
    fn test_list_with_both_body_fields_decodes() {
        let messages: Vec<Message> = serde_json::from_value(json!([
            { "id": 1, "message": "a", "sender": { "userID": 1 }, "receiver": { "userID": 2 } },
            { "id": 2, "message": "b", "content": "b", "sender": { "userID": 2 }, "receiver": { "userID": 1 } }
        ]))
        .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "b");
    }

    #[test]
    fn test_missing_body_is_rejected() {
        let result = serde_json::from_value::<Message>(json!({
            "id": 1,
            "sender": { "userID": 1 },
            "receiver": { "userID": 2 }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_sender_is_rejected() {
        let result = serde_json::from_value::<Message>(json!({
            "content": "hi",
            "receiver": { "userID": 2 }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_new_chat_message_body() {
        let body = serde_json::to_value(NewChatMessage::new("yo", UserId(1), UserId(2))).unwrap();
        assert_eq!(
            body,
            json!({
                "message": "yo",
                "sender": { "userID": 1 },
                "receiver": { "userID": 2 }
            })
        );
    }
}
