use super::{Credentials, TokenStore, TokenStoreError};
use crate::types::TokenPair;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Token store persisted as a JSON file
///
/// The file is re-read on every access so several processes sharing it see
/// each other's renewals. A missing file means no credentials.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Credentials, TokenStoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Credentials::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, credentials: &Credentials) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename so readers never see a half-written file
        let tmp_path = self.path.with_extension("tmp");
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp_path)?;
        // A leftover tmp file keeps its old mode through `open`
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(&serde_json::to_vec_pretty(credentials)?)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, &self.path)?;

        debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn access_token(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.load()?.access_token)
    }

    fn refresh_token(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.load()?.refresh_token)
    }

    fn set_tokens(&self, tokens: &TokenPair) -> Result<(), TokenStoreError> {
        self.save(&Credentials::from(tokens))
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed credentials at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_has_no_tokens() {
        let dir = tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("credentials.json"));

        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap(), None);
    }

    #[test]
    fn tokens_survive_a_new_store_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        FileTokenStore::new(&path)
            .set_tokens(&TokenPair::new("T1", "R1"))
            .unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.access_token().unwrap().as_deref(), Some("T1"));
        assert_eq!(reopened.refresh_token().unwrap().as_deref(), Some("R1"));
    }

    #[test]
    fn uses_browser_storage_key_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        FileTokenStore::new(&path)
            .set_tokens(&TokenPair::new("T1", "R1"))
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["token"], "T1");
        assert_eq!(raw["refreshToken"], "R1");
    }

    #[cfg(unix)]
    #[test]
    fn credentials_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        // A stale tmp file from an interrupted write must not keep loose permissions
        fs::write(path.with_extension("tmp"), b"{}").unwrap();
        fs::set_permissions(path.with_extension("tmp"), fs::Permissions::from_mode(0o644)).unwrap();

        FileTokenStore::new(&path)
            .set_tokens(&TokenPair::new("T1", "R1"))
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("credentials.json"));
        store.set_tokens(&TokenPair::new("T1", "R1")).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.access_token().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, b"not json").unwrap();

        let result = FileTokenStore::new(&path).access_token();
        assert!(matches!(result, Err(TokenStoreError::Serialization(_))));
    }
}
