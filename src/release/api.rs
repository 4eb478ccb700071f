//! Release API endpoints

use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use serde_json::Value;
use tracing::warn;

use crate::config::{DEFAULT_BASE_URL, FETCH_TIMEOUT_SECS};
use crate::error::FetchError;
use crate::version::CoreVersion;

const USER_AGENT: &str = "typo3-update-check";

/// Builds the HTTP client shared by all fetchers
pub fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client")
}

/// Trait for retrieving raw release data from the remote API
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseApi: Send + Sync {
    /// Fetches the release index of a major version line as raw JSON
    async fn fetch_release_index(&self, major: u64) -> Result<Value, FetchError>;

    /// Fetches the changelog and announcement of a single release as raw JSON
    async fn fetch_release_content(&self, version: &CoreVersion) -> Result<Value, FetchError>;
}

/// [`ReleaseApi`] implementation for get.typo3.org
pub struct HttpReleaseApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReleaseApi {
    /// Creates a new HttpReleaseApi with a custom base URL
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            warn!("Release API returned status {}: {}", status, url);
            return Err(FetchError::Status(status.as_u16()));
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse release API response from {}: {}", url, e);
            FetchError::InvalidResponse(e.to_string())
        })
    }
}

impl Default for HttpReleaseApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, Duration::from_secs(FETCH_TIMEOUT_SECS))
    }
}

#[async_trait::async_trait]
impl ReleaseApi for HttpReleaseApi {
    async fn fetch_release_index(&self, major: u64) -> Result<Value, FetchError> {
        let url = format!("{}/major/{}/release/", self.base_url, major);
        self.get_json(&url).await
    }

    async fn fetch_release_content(&self, version: &CoreVersion) -> Result<Value, FetchError> {
        let url = format!("{}/release/{}/content", self.base_url, version);
        self.get_json(&url).await
    }
}
