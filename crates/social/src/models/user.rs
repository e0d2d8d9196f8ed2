//! User identity, profile, and account request models

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ClientError, Result};

/// Server-assigned user identifier (always positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    /// Parse user input such as a receiver field into a user id.
    ///
    /// Only a run of ASCII digits (surrounding whitespace ignored) with a
    /// value above zero is accepted. Partial numbers like `"12abc"` are
    /// rejected rather than truncated.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ClientError::validation(format!(
                "'{}' is not a valid user id",
                input
            )));
        }

        match trimmed.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(ClientError::validation(format!(
                "'{}' is not a valid user id",
                input
            ))),
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Reference to a user as embedded in messages (`{userID, username}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl UserRef {
    /// Reference by id only, the shape the server expects in request bodies
    pub fn id(user_id: UserId) -> Self {
        Self {
            user_id,
            username: None,
        }
    }

    pub fn with_name(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: Some(username.into()),
        }
    }

    /// Name to show for this user, falling back to the numeric id
    pub fn display(&self) -> String {
        match &self.username {
            Some(name) => name.clone(),
            None => format!("user {}", self.user_id),
        }
    }
}

/// Public profile as returned by `GET /users/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userID", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub bio: String,
}

/// Body of `PUT /users/{id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub bio: String,
}

impl ProfileUpdate {
    /// Build an update that keeps every field of an existing profile
    pub fn from_profile(user_id: UserId, profile: &UserProfile) -> Self {
        Self {
            user_id,
            username: profile.username.clone(),
            firstname: profile.firstname.clone(),
            lastname: profile.lastname.clone(),
            bio: profile.bio.clone(),
        }
    }
}

/// Body of `POST /login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `POST /register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub bio: String,
    pub password: String,
}

/// Registration input including the password confirmation field
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub bio: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Check the form and produce the request body
    pub fn validate(&self) -> Result<RegisterRequest> {
        if self.username.trim().is_empty() {
            return Err(ClientError::validation("Username is required"));
        }
        if self.password.is_empty() {
            return Err(ClientError::validation("Password is required"));
        }
        if self.password != self.confirm_password {
            return Err(ClientError::validation("Passwords do not match"));
        }

        Ok(RegisterRequest {
            username: self.username.trim().to_string(),
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
            bio: self.bio.clone(),
            password: self.password.clone(),
        })
    }
}
