//! Follow-graph models

use serde::{Deserialize, Serialize};

use super::{UserId, UserRef};

/// Which side of the follow graph to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowKind {
    /// Users who follow the given user
    Followers,
    /// Users the given user follows
    Following,
}

impl FollowKind {
    /// Value of the `type` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowKind::Followers => "followers",
            FollowKind::Following => "following",
        }
    }
}

/// One edge of the follow graph
///
/// The follows listing nests both users (`follower`, `following`) while
/// other endpoints send flat ids and usernames. Either shape decodes; use
/// the accessors rather than the raw fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    #[serde(rename = "followerID", default, skip_serializing_if = "Option::is_none")]
    pub follower_id: Option<UserId>,
    #[serde(rename = "followingID", default, skip_serializing_if = "Option::is_none")]
    pub following_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower: Option<UserRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<UserRef>,
}

impl Follow {
    pub fn follower_id(&self) -> Option<UserId> {
        self.follower_id
            .or_else(|| self.follower.as_ref().map(|u| u.user_id))
    }

    pub fn following_id(&self) -> Option<UserId> {
        self.following_id
            .or_else(|| self.following.as_ref().map(|u| u.user_id))
    }

    pub fn follower_name(&self) -> Option<&str> {
        self.follower_username
            .as_deref()
            .or_else(|| self.follower.as_ref()?.username.as_deref())
    }

    pub fn following_name(&self) -> Option<&str> {
        self.following_username
            .as_deref()
            .or_else(|| self.following.as_ref()?.username.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_follow_edge() {
        let follow: Follow = serde_json::from_str(
            r#"{"followerID": 1, "followingID": 2, "followingUsername": "bob"}"#,
        )
        .unwrap();
        assert_eq!(follow.follower_id, Some(UserId(1)));
        assert_eq!(follow.following_id, Some(UserId(2)));
        assert_eq!(follow.following_username.as_deref(), Some("bob"));
        assert_eq!(follow.follower_username, None);
        assert_eq!(follow.following_name(), Some("bob"));
    }

    #[test]
    fn test_parse_nested_follow_edge() {
        let follow: Follow = serde_json::from_str(
            r#"{"follower": {"userID": 1, "username": "ada"},
                "following": {"userID": 2, "username": "bob"}}"#,
        )
        .unwrap();
        assert_eq!(follow.follower_id(), Some(UserId(1)));
        assert_eq!(follow.following_id(), Some(UserId(2)));
        assert_eq!(follow.follower_name(), Some("ada"));
        assert_eq!(follow.following_name(), Some("bob"));
    }

    #[test]
    fn test_flat_fields_take_precedence() {
        let follow: Follow = serde_json::from_str(
            r#"{"followingUsername": "bob", "following": {"userID": 2}}"#,
        )
        .unwrap();
        assert_eq!(follow.following_name(), Some("bob"));
        assert_eq!(follow.following_id(), Some(UserId(2)));
        assert_eq!(follow.follower_name(), None);
    }

    #[test]
    fn test_follow_kind_query_value() {
        assert_eq!(FollowKind::Followers.as_str(), "followers");
        assert_eq!(FollowKind::Following.as_str(), "following");
    }
}
