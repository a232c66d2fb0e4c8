//! Credential storage for the authenticated client
//!
//! The client never caches tokens: every dispatch reads the store again, so a
//! pair renewed by one request is seen by the next one.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod local_storage;

pub use memory::MemoryTokenStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileTokenStore;
#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageTokenStore;

use crate::types::TokenPair;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Token storage errors
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("Token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token storage is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Token storage unavailable: {0}")]
    Unavailable(String),
}

/// Get/set/clear capability over the session's credentials
pub trait TokenStore: Send + Sync {
    /// Current access token, if signed in
    fn access_token(&self) -> Result<Option<String>, TokenStoreError>;

    /// Current refresh token, if any
    fn refresh_token(&self) -> Result<Option<String>, TokenStoreError>;

    /// Replace both tokens with a freshly issued pair
    fn set_tokens(&self, tokens: &TokenPair) -> Result<(), TokenStoreError>;

    /// Forget both tokens
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Stored credentials; either token may be missing
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

impl From<&TokenPair> for Credentials {
    fn from(tokens: &TokenPair) -> Self {
        Self {
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}
