//! Admin client configuration.
//!
//! Settings are read from a TOML file and then overridden by environment
//! variables:
//!
//! ```toml
//! secret-key = "sk_live_..."
//! api-url = "https://api.example.com"
//! ws-url = "wss://api.example.com/ws"
//! timeout-secs = 30
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// API URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default config filename, under `<config dir>/paanj/`.
const CONFIG_FILE: &str = "admin.toml";

pub const ENV_SECRET_KEY: &str = "PAANJ_SECRET_KEY";
pub const ENV_API_URL: &str = "PAANJ_API_URL";
pub const ENV_WS_URL: &str = "PAANJ_WS_URL";
pub const ENV_TIMEOUT_SECS: &str = "PAANJ_TIMEOUT_SECS";

/// Connection settings for [`crate::PaanjAdmin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdminConfig {
    /// Admin secret key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// HTTP API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Event channel URL; derived from `api_url` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            api_url: default_api_url(),
            ws_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AdminConfig {
    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigFile {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "Loaded admin config");
        Self::from_toml(&content)
    }

    /// Load the user config file (if present) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_SECRET_KEY) {
            self.secret_key = Some(key);
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(url) = lookup(ENV_WS_URL) {
            self.ws_url = Some(url);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECS, raw))
            })?;
        }
        Ok(())
    }
}

/// Path of the user config file: `<config dir>/paanj/admin.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paanj").join(CONFIG_FILE))
}
