//! Error taxonomy for client operations
//!
//! Every failure is transient from the caller's point of view: it is logged,
//! shown once, and the next poll cycle is the recovery path.

/// Errors produced by API calls, session handling, and the sync client
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (connect, DNS, timeout, I/O)
    #[error("Network error: {message}")]
    Network { message: String },

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Input rejected before any request was made
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The response body did not match the expected shape
    #[error("Unexpected response: {message}")]
    Decode { message: String },

    /// An operation needed a session and there is none
    #[error("Authentication required")]
    NotAuthenticated,

    /// The bearer token could not be decoded
    #[error("Invalid session token: {message}")]
    InvalidToken { message: String },

    /// The configured base URL cannot be combined with an endpoint path
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// True for failures that came back from the server as a status code
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    /// True for input rejected locally without touching the network
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<ureq::Error> for ClientError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(status) => Self::Http {
                status,
                message: String::new(),
            },
            other => Self::network(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::decode(e.to_string())
    }
}

/// Result alias used across the crate
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_display_includes_status_and_body() {
        let err = ClientError::Http {
            status: 404,
            message: "user not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: user not found");
        assert!(err.is_http());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let parse = serde_json::from_str::<Vec<u32>>("{not json").unwrap_err();
        let err = ClientError::from(parse);
        assert!(matches!(err, ClientError::Decode { .. }));
    }
}
