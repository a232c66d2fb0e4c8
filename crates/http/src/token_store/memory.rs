use super::{Credentials, TokenStore, TokenStoreError};
use crate::types::TokenPair;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-process token store
///
/// Credentials live as long as the store; nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    credentials: RwLock<Credentials>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a full token pair
    pub fn with_tokens(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self::from_credentials(Credentials {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        })
    }

    pub fn from_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: RwLock::new(credentials),
        }
    }

    /// Snapshot of the stored credentials
    pub fn credentials(&self) -> Result<Credentials, TokenStoreError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Credentials>, TokenStoreError> {
        self.credentials
            .read()
            .map_err(|_| TokenStoreError::Unavailable("token store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Credentials>, TokenStoreError> {
        self.credentials
            .write()
            .map_err(|_| TokenStoreError::Unavailable("token store lock poisoned".into()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.read()?.access_token.clone())
    }

    fn refresh_token(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.read()?.refresh_token.clone())
    }

    fn set_tokens(&self, tokens: &TokenPair) -> Result<(), TokenStoreError> {
        *self.write()? = Credentials::from(tokens);
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.write()? = Credentials::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap(), None);
    }

    #[test]
    fn set_replaces_both_tokens() {
        let store = MemoryTokenStore::with_tokens("old", "old-refresh");
        store.set_tokens(&TokenPair::new("new", "new-refresh")).unwrap();

        assert_eq!(store.access_token().unwrap().as_deref(), Some("new"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("new-refresh"));
    }

    #[test]
    fn clear_removes_both_tokens() {
        let store = MemoryTokenStore::with_tokens("T1", "R1");
        store.clear().unwrap();
        assert!(store.credentials().unwrap().is_empty());
    }
}
