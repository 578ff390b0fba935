//! Client configuration management.
//!
//! This module handles loading and saving the configuration: the backend
//! base URL, request timeout, storage backend and last used email.
//!
//! Configuration is stored at `~/.config/sessionkit/config.json`. The base
//! URL can be overridden with the `SESSIONKIT_API_URL` environment variable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "sessionkit";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the backend base URL
pub const BASE_URL_ENV: &str = "SESSIONKIT_API_URL";

/// Default backend. 10.0.2.2 is the host machine as seen from the Android
/// emulator; physical devices need the server's real address.
pub const DEFAULT_BASE_URL: &str = "http://10.0.2.2:3000";

/// HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find {0} directory")]
    NoDirectory(&'static str),

    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where session state is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Process memory only
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub backend: StoreBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirectory("config"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the file-backed session store
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDirectory("data"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Base URL: environment variable, then config file, then the default
    pub fn base_url(&self) -> String {
        Self::resolve_base_url(std::env::var(BASE_URL_ENV).ok(), self.base_url.as_deref())
    }

    fn resolve_base_url(env: Option<String>, configured: Option<&str>) -> String {
        env.filter(|url| !url.trim().is_empty())
            .or_else(|| configured.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_resolution_order() {
        assert_eq!(Config::resolve_base_url(None, None), DEFAULT_BASE_URL);
        assert_eq!(
            Config::resolve_base_url(None, Some("http://file:1")),
            "http://file:1"
        );
        assert_eq!(
            Config::resolve_base_url(Some("http://env:2".to_string()), Some("http://file:1")),
            "http://env:2"
        );
        assert_eq!(
            Config::resolve_base_url(Some("  ".to_string()), Some("http://file:1")),
            "http://file:1"
        );
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(Config::default().request_timeout(), Duration::from_secs(30));
        let config = Config {
            timeout_secs: Some(5),
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join(CONFIG_FILE);

        assert_eq!(Config::load_from(&path).unwrap().backend, StoreBackend::File);

        let config = Config {
            base_url: Some("http://localhost:3000".to_string()),
            backend: StoreBackend::Keyring,
            last_email: Some("a@b.com".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(loaded.backend, StoreBackend::Keyring);
        assert_eq!(loaded.last_email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_backend_names() {
        let config: Config = serde_json::from_str(r#"{"backend":"memory"}"#).unwrap();
        assert_eq!(config.backend, StoreBackend::Memory);
    }
}
