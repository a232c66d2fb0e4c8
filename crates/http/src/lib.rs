//! WhatsExpense HTTP client
//!
//! Talks to the WhatsExpense REST API with bearer authentication. An access
//! token rejected by the server is renewed once with the stored refresh token
//! and the original request is replayed; if renewal is impossible the stored
//! credentials are cleared and [`ClientError::AuthenticationExpired`] is
//! returned so the caller can send the user back to sign-in.

#[macro_use]
extern crate tracing;

pub mod client;
pub mod token_store;
pub mod types;

pub use client::error::ClientError;
pub use client::{ExpenseClient, ExpenseClientBuilder, OutboundRequest, RequestOptions};
pub use token_store::{Credentials, MemoryTokenStore, TokenStore, TokenStoreError};

#[cfg(not(target_arch = "wasm32"))]
pub use token_store::FileTokenStore;
#[cfg(target_arch = "wasm32")]
pub use token_store::LocalStorageTokenStore;
