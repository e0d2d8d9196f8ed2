//! REST API HTTP client
//!
//! Provides methods for every backend endpoint the client consumes.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use log::debug;
use serde::de::DeserializeOwned;
use std::time::Duration;
use ureq::http::Response;
use ureq::http::header::SET_COOKIE;
use ureq::{Agent, Body, RequestBuilder};
use url::Url;

use super::{ChatApi, DirectoryApi};
use crate::error::{ClientError, Result};
use crate::models::{
    Follow, FollowKind, LoginRequest, Message, NewChatMessage, NewDirectMessage, Notification,
    NotificationId, ProfileUpdate, RegisterRequest, UserId, UserProfile,
};
use crate::session::{AUTH_COOKIE, token_from_cookies};

/// HTTP client for the social backend
pub struct ApiClient {
    agent: Agent,
    base_url: Url,
}

impl ApiClient {
    /// Backend address used when nothing is configured
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8080";

    /// Timeout applied to each whole request
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a new client for the given base URL
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Create a new client with an explicit per-request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        // Non-2xx responses are read normally so their bodies can become error messages
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Ok(Self {
            agent: Agent::new_with_config(config),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // === Account ===

    /// Sign in and return the bearer token from the `Authentication` cookie
    pub fn login(&self, username: &str, password: &str) -> Result<String> {
        let url = self.endpoint("/login")?;
        debug!("POST {}", url);

        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.agent.post(url.as_str()).send_json(&body)?;

        let token = token_from_cookies(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
        read_success(response)?;

        token.ok_or_else(|| {
            ClientError::invalid_token(format!(
                "login response carried no {} cookie",
                AUTH_COOKIE
            ))
        })
    }

    /// Create an account
    pub fn register(&self, request: &RegisterRequest) -> Result<()> {
        let url = self.endpoint("/register")?;
        debug!("POST {}", url);

        let response = self.agent.post(url.as_str()).send_json(request)?;
        read_success(response)?;
        Ok(())
    }

    /// Combine the base URL with an absolute endpoint path
    ///
    /// Any path prefix on the base URL (e.g. `/api`) is preserved.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}", base, path))?)
    }
}

impl ChatApi for ApiClient {
    fn list_chats(&self, token: &str) -> Result<Vec<Message>> {
        let url = self.endpoint("/chats/get")?;
        debug!("GET {}", url);

        let response = authorize(self.agent.get(url.as_str()), token).call()?;
        read_json(response)
    }

    fn send_chat(&self, token: &str, message: &NewChatMessage) -> Result<Message> {
        let url = self.endpoint("/chats")?;
        debug!("POST {} (receiver {})", url, message.receiver.user_id);

        let response = authorize(self.agent.post(url.as_str()), token).send_json(message)?;
        read_json(response)
    }

    fn list_direct_messages(&self, sender: UserId, receiver: UserId) -> Result<Vec<Message>> {
        let url = self.endpoint(&format!("/messages/{}/{}", sender, receiver))?;
        debug!("GET {}", url);

        let response = self.agent.get(url.as_str()).call()?;
        read_json(response)
    }

    fn send_direct_message(&self, message: &NewDirectMessage) -> Result<Message> {
        let url = self.endpoint("/message")?;
        debug!("POST {} (receiver {})", url, message.receiver.user_id);

        let response = self.agent.post(url.as_str()).send_json(message)?;
        read_json(response)
    }

    fn unread_notifications(&self, token: &str, user: UserId) -> Result<Vec<Notification>> {
        let url = self.endpoint(&format!("/notifications/unread/{}", user))?;
        debug!("GET {}", url);

        let response = authorize(self.agent.get(url.as_str()), token).call()?;
        read_json(response)
    }

    fn mark_notification_read(&self, token: &str, id: NotificationId) -> Result<()> {
        let url = self.endpoint(&format!("/notifications/markAsRead/{}", id))?;
        debug!("POST {}", url);

        let response = authorize(self.agent.post(url.as_str()), token).send_empty()?;
        read_success(response)?;
        Ok(())
    }
}

impl DirectoryApi for ApiClient {
    fn list_follows(&self, user: UserId, kind: FollowKind) -> Result<Vec<Follow>> {
        let mut url = self.endpoint("/follows")?;
        url.query_pairs_mut()
            .append_pair("userID", &user.to_string())
            .append_pair("type", kind.as_str());
        debug!("GET {}", url);

        let response = self.agent.get(url.as_str()).call()?;
        read_json(response)
    }

    fn follow(&self, token: &str, following: UserId) -> Result<()> {
        let mut url = self.endpoint("/follow")?;
        url.query_pairs_mut()
            .append_pair("followingID", &following.to_string());
        debug!("POST {}", url);

        let response = authorize(self.agent.post(url.as_str()), token).send_empty()?;
        read_success(response)?;
        Ok(())
    }

    fn unfollow(&self, token: &str, follower: UserId, following: UserId) -> Result<()> {
        let mut url = self.endpoint("/unfollow")?;
        url.query_pairs_mut()
            .append_pair("followerID", &follower.to_string())
            .append_pair("followingID", &following.to_string());
        debug!("DELETE {}", url);

        let response = authorize(self.agent.delete(url.as_str()), token).call()?;
        read_success(response)?;
        Ok(())
    }

    fn search_users(&self, query: &str) -> Result<Vec<UserProfile>> {
        let mut url = self.endpoint("/users/search")?;
        url.query_pairs_mut().append_pair("query", query);
        debug!("GET {}", url);

        let response = self.agent.get(url.as_str()).call()?;
        read_json(response)
    }

    fn get_user(&self, id: UserId) -> Result<UserProfile> {
        let url = self.endpoint(&format!("/users/{}", id))?;
        debug!("GET {}", url);

        let response = self.agent.get(url.as_str()).call()?;
        read_json(response)
    }

    fn update_user(&self, token: &str, id: UserId, update: &ProfileUpdate) -> Result<()> {
        let url = self.endpoint(&format!("/users/{}", id))?;
        debug!("PUT {}", url);

        let response = authorize(self.agent.put(url.as_str()), token).send_json(update)?;
        read_success(response)?;
        Ok(())
    }
}

/// Attach the bearer token both as a header and as the session cookie
fn authorize<B>(request: RequestBuilder<B>, token: &str) -> RequestBuilder<B> {
    request
        .header("Authorization", &format!("Bearer {}", token))
        .header("Cookie", &format!("{}={}", AUTH_COOKIE, token))
}

/// Read the body of a 2xx response, or turn anything else into `ClientError::Http`
fn read_success(mut response: Response<Body>) -> Result<String> {
    let status = response.status();
    let body = response.body_mut().read_to_string()?;

    if status.is_success() {
        return Ok(body);
    }

    let message = match body.trim() {
        "" => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        text => text.to_string(),
    };
    Err(ClientError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Read a 2xx JSON body into `T`
fn read_json<T: DeserializeOwned>(response: Response<Body>) -> Result<T> {
    let body = read_success(response)?;
    Ok(serde_json::from_str(&body)?)
}
