use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid version format: {0}")]
    InvalidVersion(String),

    #[error("Target version {to} must be greater than current version {from}")]
    NotIncreasing { from: String, to: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Unavailable(String),
}

impl FetchError {
    /// Error reported when the release index cannot be retrieved or decoded
    pub fn unavailable() -> Self {
        FetchError::Unavailable(
            "Failed to parse API response. The TYPO3 API might be temporarily unavailable."
                .to_string(),
        )
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}
