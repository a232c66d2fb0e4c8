//! CLI configuration

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment overrides, e.g. `WHATSEXPENSE_BASE_URL`
pub const ENV_PREFIX: &str = "WHATSEXPENSE";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// API root, including any version prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (0 = no timeout)
    #[serde(default)]
    pub timeout_secs: u64,
    /// Where credentials are persisted between runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: 0,
            token_file: None,
        }
    }
}

/// Platform-specific application directories
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "WhatsExpense", "whatsexpense")
}

/// Data directory for credentials and logs
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".whatsexpense"))
}

impl CliConfig {
    /// Load configuration: defaults, then a TOML file, then the environment
    ///
    /// Without an explicit path, `config.toml` in the platform config
    /// directory is used if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        } else if let Some(dirs) = project_dirs() {
            builder = builder.add_source(File::from(dirs.config_dir().join("config.toml")).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Credentials file, defaulting to the data directory
    pub fn token_file(&self) -> PathBuf {
        self.token_file
            .clone()
            .unwrap_or_else(|| data_dir().join("credentials.json"))
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_have_no_timeout() {
        let config = CliConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080/api/v1");
        assert_eq!(config.timeout(), None);
        assert!(config.token_file().ends_with("credentials.json"));
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "base_url = \"https://api.example.com/api/v1\"\ntimeout_secs = 15\ntoken_file = \"/tmp/creds.json\"\n",
        )
        .unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_url, "https://api.example.com/api/v1");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.token_file(), PathBuf::from("/tmp/creds.json"));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = 5\n").unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/api/v1");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = CliConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(result.is_err());
    }
}
