//! Client error types

use crate::token_store::TokenStoreError;
use reqwest::StatusCode;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure; no response was received
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The session ended and stored credentials were cleared
    #[error("Session expired: {0}")]
    AuthenticationExpired(String),

    /// Server answered with a non-success status
    #[error("Request rejected with status {status}: {body}")]
    RequestRejected { status: u16, body: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Credentials could not be read or written
    #[error("Token storage error: {0}")]
    TokenStore(#[from] TokenStoreError),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: StatusCode, body: String) -> Self {
        Self::RequestRejected {
            status: status.as_u16(),
            body,
        }
    }

    /// True when the caller should send the user back to sign-in
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::AuthenticationExpired(_))
    }

    /// HTTP status associated with the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestRejected { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_keeps_status_and_body() {
        let error = ClientError::from_status(StatusCode::NOT_FOUND, "missing".into());
        assert_eq!(error.status(), Some(404));
        assert!(matches!(
            error,
            ClientError::RequestRejected { ref body, .. } if body == "missing"
        ));
    }

    #[test]
    fn only_expired_sessions_redirect() {
        assert!(ClientError::AuthenticationExpired("gone".into()).is_session_expired());
        assert!(!ClientError::from_status(StatusCode::UNAUTHORIZED, String::new()).is_session_expired());
        assert!(!ClientError::Configuration("x".into()).is_session_expired());
    }
}
