//! Editor configuration backed by a JSON file.
//!
//! The file lives at `~/.config/inview/config.json` on most platforms and can
//! be relocated with `INVIEW_CONFIG_PATH`. A missing file yields defaults; a
//! malformed one is an error. The API key is only ever read from the
//! environment and is never written back to disk.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{expand_tilde, inview_config_dir};

/// Environment variable allowing callers to override the config file path.
pub const CONFIG_PATH_ENV: &str = "INVIEW_CONFIG_PATH";
/// Environment variable overriding the resource base URL.
pub const API_BASE_ENV: &str = "INVIEW_API_BASE";
/// Environment variable carrying the API key sent as `Authorization`.
pub const API_KEY_ENV: &str = "INVIEW_API_KEY";
/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Error surfaced when reading or validating configuration fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// What happens to selected variables when the connection changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableRetention {
    /// Keep every selected variable, even when the new scope does not list it.
    #[default]
    Retain,
    /// Drop selected variables missing from the freshly fetched scoped catalog.
    DropMissing,
}

/// How variable search results are folded into the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CatalogMerge {
    /// Every response replaces the catalog.
    Replace,
    /// Responses to a non-empty search are unioned into the catalog.
    #[default]
    AccumulateOnSearch,
}

/// Tunables for the editor, its selectors and the lookup client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Root of the `Connections` / `Variables` resource endpoints.
    pub base_url: Option<String>,
    /// Quiet period before a search text triggers a lookup.
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
    /// Initial page size of the emitted query.
    pub page_size: u32,
    /// Page size used for searched (paginated) lookups.
    pub lookup_page_size: u32,
    pub allow_custom_connection: bool,
    pub allow_custom_variable: bool,
    pub variable_retention: VariableRetention,
    pub variable_catalog_merge: CatalogMerge,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            debounce_ms: 500,
            request_timeout_secs: 30,
            page_size: 10,
            lookup_page_size: 50,
            allow_custom_connection: true,
            allow_custom_variable: true,
            variable_retention: VariableRetention::default(),
            variable_catalog_merge: CatalogMerge::default(),
            api_key: None,
        }
    }
}

impl EditorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply `INVIEW_API_BASE` and `INVIEW_API_KEY` on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = env::var(API_BASE_ENV)
            && !base_url.trim().is_empty()
        {
            self.base_url = Some(base_url.trim().to_string());
        }
        if let Ok(api_key) = env::var(API_KEY_ENV)
            && !api_key.trim().is_empty()
        {
            self.api_key = Some(api_key.trim().to_string());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "pageSize",
                reason: "must be greater than zero".into(),
            });
        }
        if self.lookup_page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "lookupPageSize",
                reason: "must be greater than zero".into(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "requestTimeoutSecs",
                reason: "must be greater than zero".into(),
            });
        }
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).map_err(|error| ConfigError::Invalid {
                field: "baseUrl",
                reason: format!("'{}' is not a valid URL: {}", base_url, error),
            })?;
        }
        Ok(())
    }
}

/// Returns the default path for the editor configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    inview_config_dir().join(CONFIG_FILE_NAME)
}

/// Loads configuration from the default path and applies environment overrides.
pub fn load_config() -> Result<EditorConfig, ConfigError> {
    let path = default_config_path();
    load_config_from_path(&path)
}

/// Loads configuration from a specific path and applies environment overrides.
pub fn load_config_from_path(path: &Path) -> Result<EditorConfig, ConfigError> {
    let mut config = match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str::<EditorConfig>(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file; using defaults");
            EditorConfig::default()
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
