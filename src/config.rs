use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const APP_NAME: &str = "typo3-update-check";

// =============================================================================
// Network-related constants
// =============================================================================

/// Default base URL of the TYPO3 release API
pub const DEFAULT_BASE_URL: &str = "https://get.typo3.org/api/v1";

/// Timeout for a single HTTP request in seconds
pub const FETCH_TIMEOUT_SECS: u64 = 10;

/// Maximum number of release content requests in flight at once
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 5;

// =============================================================================
// Cache-related constants
// =============================================================================

/// Lifetime of a cached release index in seconds (1 hour)
pub const DEFAULT_INDEX_TTL_SECS: i64 = 3600;

/// Application configuration, read from an optional JSON file
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub fetch: FetchConfig,
}

/// Release API configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: FETCH_TIMEOUT_SECS,
        }
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    pub enabled: bool,
    /// Release index lifetime in seconds
    pub index_ttl_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            index_ttl_secs: DEFAULT_INDEX_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchConfig {
    pub max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

impl Config {
    /// Reads the configuration from `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Loads the configuration from an explicit path, or from the default location
    /// when it exists. Falls back to defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = config_path();
                if path.is_file() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Returns the cache root for typo3-update-check.
/// Uses $XDG_CACHE_HOME/typo3-update-check if XDG_CACHE_HOME is set,
/// otherwise falls back to ~/.cache/typo3-update-check,
/// or ./typo3-update-check if neither is available.
pub fn cache_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_CACHE_HOME").ok(),
        dirs::home_dir(),
        ".cache",
    )
}

/// Returns the data directory, used for the log file.
pub fn data_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_DATA_HOME").ok(),
        dirs::home_dir(),
        ".local/share",
    )
}

/// Returns the path to the default config file.
pub fn config_path() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::home_dir(),
        ".config",
    )
    .join("config.json")
}

/// Returns the path to the cache database inside `cache_dir`.
pub fn db_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("cache.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(format!("{APP_NAME}.log"))
}

fn dir_with_env(xdg_home: Option<String>, home_dir: Option<PathBuf>, fallback: &str) -> PathBuf {
    let base = xdg_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(fallback)))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_NAME)
}
