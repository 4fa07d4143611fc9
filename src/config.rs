//! Application Configuration
//!
//! Backend selection and credentials, stored as JSON next to the app data
//! or taken from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

pub const ENV_URL: &str = "TRIP_CHECKLIST_URL";
pub const ENV_ANON_KEY: &str = "TRIP_CHECKLIST_ANON_KEY";
pub const ENV_ACCESS_TOKEN: &str = "TRIP_CHECKLIST_ACCESS_TOKEN";
pub const ENV_DB_PATH: &str = "TRIP_CHECKLIST_DB";
pub const ENV_LOG_DIR: &str = "TRIP_CHECKLIST_LOG_DIR";

fn default_timeout_secs() -> u64 {
    30
}

/// Remote row API credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
    /// Signed-in user's token; the anon key is sent when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Where rows are stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Remote(RemoteConfig),
    Local { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    /// Directory for rolling log files; logging to file is off when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Read a JSON config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Build from process environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from a variable lookup. A remote URL wins over a local path.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let log_dir = lookup(ENV_LOG_DIR).map(PathBuf::from);

        let backend = if let Some(url) = lookup(ENV_URL) {
            BackendConfig::Remote(RemoteConfig {
                url,
                anon_key: lookup(ENV_ANON_KEY).ok_or(ConfigError::MissingEnv(ENV_ANON_KEY))?,
                access_token: lookup(ENV_ACCESS_TOKEN),
                timeout_secs: default_timeout_secs(),
            })
        } else if let Some(path) = lookup(ENV_DB_PATH) {
            BackendConfig::Local {
                path: PathBuf::from(path),
            }
        } else {
            return Err(ConfigError::MissingEnv(ENV_URL));
        };

        Ok(Self { backend, log_dir })
    }
}
