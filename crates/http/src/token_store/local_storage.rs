use super::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore, TokenStoreError};
use crate::types::TokenPair;
use gloo::storage::{LocalStorage, Storage};

/// Token store backed by the browser's `localStorage`
///
/// Values are kept as raw strings under [`ACCESS_TOKEN_KEY`] and
/// [`REFRESH_TOKEN_KEY`], surviving page reloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageTokenStore;

impl LocalStorageTokenStore {
    pub const fn new() -> Self {
        Self
    }

    fn get(key: &str) -> Result<Option<String>, TokenStoreError> {
        LocalStorage::raw()
            .get_item(key)
            .map_err(|e| TokenStoreError::Unavailable(format!("{e:?}")))
    }

    fn set(key: &str, value: &str) -> Result<(), TokenStoreError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| TokenStoreError::Unavailable(format!("{e:?}")))
    }

    fn remove(key: &str) -> Result<(), TokenStoreError> {
        LocalStorage::raw()
            .remove_item(key)
            .map_err(|e| TokenStoreError::Unavailable(format!("{e:?}")))
    }
}

impl TokenStore for LocalStorageTokenStore {
    fn access_token(&self) -> Result<Option<String>, TokenStoreError> {
        Self::get(ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> Result<Option<String>, TokenStoreError> {
        Self::get(REFRESH_TOKEN_KEY)
    }

    fn set_tokens(&self, tokens: &TokenPair) -> Result<(), TokenStoreError> {
        Self::set(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        Self::set(REFRESH_TOKEN_KEY, &tokens.refresh_token)
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        Self::remove(REFRESH_TOKEN_KEY)?;
        Self::remove(ACCESS_TOKEN_KEY)
    }
}
