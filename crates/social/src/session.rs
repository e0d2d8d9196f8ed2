//! Session context for the signed-in user
//!
//! Holds the bearer token and the identity decoded from it. Components
//! receive an `Arc<SessionContext>` instead of reaching for global state,
//! and watch [`SessionContext::generation`] to notice login/logout.
//!
//! The token is a JWT issued by the server. Only the payload is decoded;
//! the signature is the server's business.

use base64::prelude::*;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::error::{ClientError, Result};
use crate::models::UserId;

/// Name of the cookie the server sets on login
pub const AUTH_COOKIE: &str = "Authentication";

/// An authenticated session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Raw bearer token (without the `Bearer ` prefix)
    pub token: String,
    pub user_id: UserId,
    pub username: Option<String>,
    /// From the `exp` claim, when present
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Check whether the token's `exp` claim has passed
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= Utc::now())
    }
}

/// Claims we read from the token payload
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(rename = "userID", alias = "userId")]
    user_id: Option<IdClaim>,
    username: Option<String>,
    exp: Option<i64>,
}

/// `userID` shows up as either a number or a numeric string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdClaim {
    Number(i64),
    Text(String),
}

impl IdClaim {
    fn into_user_id(self) -> Result<UserId> {
        match self {
            IdClaim::Number(id) if id > 0 => Ok(UserId(id)),
            IdClaim::Number(id) => Err(ClientError::invalid_token(format!(
                "userID {} is not positive",
                id
            ))),
            IdClaim::Text(s) => UserId::parse(&s)
                .map_err(|_| ClientError::invalid_token(format!("userID '{}' is not numeric", s))),
        }
    }
}

/// Shared, explicitly managed authentication state
pub struct SessionContext {
    current: RwLock<Option<Session>>,
    generation: AtomicU64,
}

impl SessionContext {
    /// Create a context with nobody signed in
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Sign in with a bearer token
    ///
    /// On failure the previous session (if any) is left untouched.
    pub fn login(&self, token: &str) -> Result<Session> {
        let session = decode_token(token)?;

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(session.clone());
        self.generation.fetch_add(1, Ordering::SeqCst);

        info!("Signed in as user {}", session.user_id);
        Ok(session)
    }

    /// Sign out and invalidate anything issued under the old session
    pub fn logout(&self) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if current.take().is_some() {
            info!("Signed out");
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Get the current session, if signed in and not expired
    pub fn current(&self) -> Option<Session> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().filter(|s| !s.is_expired()).cloned()
    }

    /// Get the current session or fail with `NotAuthenticated`
    pub fn require(&self) -> Result<Session> {
        self.current().ok_or(ClientError::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Counter advanced by every login and logout
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the identity carried in a JWT
pub fn decode_token(token: &str) -> Result<Session> {
    let token = strip_bearer(token.trim());
    let payload = token
        .split('.')
        .nth(1)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ClientError::invalid_token("expected three dot-separated segments"))?;

    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ClientError::invalid_token(format!("payload is not base64url: {}", e)))?;
    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::invalid_token(format!("payload is not JSON: {}", e)))?;

    let user_id = claims
        .user_id
        .ok_or_else(|| ClientError::invalid_token("userID not found in token"))?
        .into_user_id()?;
    let expires_at = claims
        .exp
        .and_then(|exp| Utc.timestamp_opt(exp, 0).single());

    debug!("Decoded token for user {}", user_id);
    Ok(Session {
        token: token.to_string(),
        user_id,
        username: claims.username,
        expires_at,
    })
}

/// Extract the token from `Set-Cookie` header values
///
/// The cookie value may be percent-encoded and may carry a `Bearer ` prefix.
pub fn token_from_cookies<'a, I>(set_cookie_values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    set_cookie_values.into_iter().find_map(|header| {
        let pair = header.split(';').next()?.trim();
        let (name, value) = pair.split_once('=')?;
        if name.trim() != AUTH_COOKIE {
            return None;
        }

        let value = value.trim().trim_matches('"');
        let decoded = urlencoding::decode(value).ok()?;
        let token = strip_bearer(decoded.trim());
        (!token.is_empty()).then(|| token.to_string())
    })
}

fn strip_bearer(token: &str) -> &str {
    token.strip_prefix("Bearer ").unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_token(claims: serde_json::Value) -> String {
        let header = BASE64_URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = BASE64_URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_decode_numeric_user_id() {
        let token = make_token(json!({ "userID": 7, "username": "ada" }));
        let session = decode_token(&token).unwrap();
        assert_eq!(session.user_id, UserId(7));
        assert_eq!(session.username.as_deref(), Some("ada"));
        assert_eq!(session.token, token);
    }

    #[test]
    fn test_decode_string_user_id_and_bearer_prefix() {
        let token = make_token(json!({ "userID": "12" }));
        let session = decode_token(&format!("Bearer {}", token)).unwrap();
        assert_eq!(session.user_id, UserId(12));
        assert_eq!(session.token, token);
    }

    #[test]
    fn test_decode_missing_user_id() {
        let token = make_token(json!({ "username": "ada" }));
        let err = decode_token(&token).unwrap_err();
        assert_eq!(err, ClientError::invalid_token("userID not found in token"));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(decode_token("not-a-jwt").is_err());
        assert!(decode_token("a.!!!.c").is_err());
    }

    #[test]
    fn test_login_and_logout_advance_generation() {
        let ctx = SessionContext::new();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.require(), Err(ClientError::NotAuthenticated));

        let before = ctx.generation();
        ctx.login(&make_token(json!({ "userID": 1 }))).unwrap();
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.generation(), before + 1);

        ctx.logout();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.generation(), before + 2);
    }

    #[test]
    fn test_failed_login_keeps_session() {
        let ctx = SessionContext::new();
        ctx.login(&make_token(json!({ "userID": 1 }))).unwrap();
        let generation = ctx.generation();

        assert!(ctx.login("garbage").is_err());
        assert_eq!(ctx.current().unwrap().user_id, UserId(1));
        assert_eq!(ctx.generation(), generation);
    }

    #[test]
    fn test_expired_token_is_not_authenticated() {
        let ctx = SessionContext::new();
        let past = Utc::now().timestamp() - 60;
        ctx.login(&make_token(json!({ "userID": 1, "exp": past }))).unwrap();
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn test_token_from_cookies() {
        let headers = [
            "JSESSIONID=abc; Path=/",
            "Authentication=Bearer%20abc.def.ghi; Path=/; HttpOnly",
        ];
        assert_eq!(
            token_from_cookies(headers.iter().copied()),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(token_from_cookies(["Other=1"].iter().copied()), None);
    }
}
