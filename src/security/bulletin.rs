//! Security bulletin fetching and severity extraction

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde_json::json;
use tracing::{debug, warn};

use crate::cache::{CacheStore, security_bulletin_key};
use crate::config::FETCH_TIMEOUT_SECS;
use crate::error::FetchError;
use crate::release::api::build_client;
use crate::security::{SeverityCounts, SeverityFetcher};

/// `Severity:` label followed by a single word, optionally with a closing tag in between
/// as in `<strong>Severity:</strong> High`
static SEVERITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Severity:(?:\s*</[a-z]+>)?\s*(\w+)").expect("valid severity pattern")
});

/// Fetches advisory documents over HTTP and extracts their severity.
///
/// Severities never change once published, so they are cached permanently.
pub struct SecurityBulletinFetcher {
    client: reqwest::Client,
    cache: Option<Arc<dyn CacheStore>>,
}

impl SecurityBulletinFetcher {
    pub fn new(timeout: Duration, cache: Option<Arc<dyn CacheStore>>) -> Self {
        Self {
            client: build_client(timeout),
            cache,
        }
    }

    async fn fetch_severity(&self, url: &str) -> Option<String> {
        let cache_key = security_bulletin_key(url);

        let cached = self
            .cache
            .as_ref()
            .and_then(|c| c.get(&cache_key))
            .and_then(|entry| entry.get("severity")?.as_str().map(str::to_string));

        if let Some(severity) = cached {
            debug!("Using cached severity {} for {}", severity, url);
            return Some(severity);
        }

        let document = self
            .fetch_document(url)
            .await
            .inspect_err(|e| warn!("Failed to fetch security bulletin {}: {}", url, e))
            .ok()?;

        let Some(severity) = extract_severity(&document) else {
            debug!("No severity found in security bulletin {}", url);
            return None;
        };

        if let Some(cache) = &self.cache {
            cache.set(&cache_key, &json!({ "severity": severity }));
        }

        Some(severity)
    }

    async fn fetch_document(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

impl Default for SecurityBulletinFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(FETCH_TIMEOUT_SECS), None)
    }
}

#[async_trait::async_trait]
impl SeverityFetcher for SecurityBulletinFetcher {
    async fn fetch_severities(&self, urls: &[String]) -> SeverityCounts {
        let mut severities = SeverityCounts::new();

        for url in urls {
            if let Some(severity) = self.fetch_severity(url).await {
                *severities.entry(severity).or_insert(0) += 1;
            }
        }

        severities
    }
}

/// Extracts the severity label from an advisory document, verbatim.
pub fn extract_severity(document: &str) -> Option<String> {
    SEVERITY_PATTERN
        .captures(document)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SqliteCache;
    use mockito::Server;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("<li><strong>Severity:</strong> High</li>", Some("High"))]
    #[case("<li><strong>severity:</strong>   critical</li>", Some("critical"))]
    #[case("Severity: Medium", Some("Medium"))]
    #[case("<html>No severity information</html>", None)]
    fn extract_severity_reads_word_after_label(
        #[case] document: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(extract_severity(document).as_deref(), expected);
    }

    #[tokio::test]
    async fn fetch_severities_counts_labels() {
        let mut server = Server::new_async().await;

        let mut mocks = Vec::new();
        for (path, severity) in [("/sa-001", "High"), ("/sa-002", "Low"), ("/sa-003", "High")] {
            mocks.push(
                server
                    .mock("GET", path)
                    .with_status(200)
                    .with_body(format!("<li><strong>Severity:</strong> {severity}</li>"))
                    .create_async()
                    .await,
            );
        }

        let fetcher = SecurityBulletinFetcher::default();
        let urls: Vec<String> = ["/sa-001", "/sa-002", "/sa-003"]
            .iter()
            .map(|p| format!("{}{}", server.url(), p))
            .collect();

        let severities = fetcher.fetch_severities(&urls).await;

        for mock in mocks {
            mock.assert_async().await;
        }
        assert_eq!(
            severities,
            SeverityCounts::from([("High".to_string(), 2), ("Low".to_string(), 1)])
        );
    }

    #[tokio::test]
    async fn fetch_severities_skips_failed_and_missing_bulletins() {
        let mut server = Server::new_async().await;

        let _ok = server
            .mock("GET", "/sa-001")
            .with_status(200)
            .with_body("<li><strong>Severity:</strong> Medium</li>")
            .create_async()
            .await;
        let _failed = server
            .mock("GET", "/sa-002")
            .with_status(500)
            .create_async()
            .await;
        let _no_severity = server
            .mock("GET", "/sa-003")
            .with_status(200)
            .with_body("<html>No severity information</html>")
            .create_async()
            .await;

        let fetcher = SecurityBulletinFetcher::default();
        let urls: Vec<String> = ["/sa-001", "/sa-002", "/sa-003"]
            .iter()
            .map(|p| format!("{}{}", server.url(), p))
            .collect();

        let severities = fetcher.fetch_severities(&urls).await;

        assert_eq!(
            severities,
            SeverityCounts::from([("Medium".to_string(), 1)])
        );
    }

    #[tokio::test]
    async fn fetch_severities_caches_and_reuses_results() {
        let temp_dir = TempDir::new().unwrap();
        let cache: Arc<dyn CacheStore> =
            Arc::new(SqliteCache::new(&temp_dir.path().join("test.db"), 3600).unwrap());

        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/sa-001")
            .with_status(200)
            .with_body("<li><strong>Severity:</strong> High</li>")
            .expect(1)
            .create_async()
            .await;

        let fetcher =
            SecurityBulletinFetcher::new(Duration::from_secs(5), Some(cache.clone()));
        let url = format!("{}/sa-001", server.url());

        let first = fetcher.fetch_severities(&[url.clone()]).await;
        let second = fetcher.fetch_severities(&[url.clone()]).await;

        mock.assert_async().await;
        assert_eq!(first, second);
        assert_eq!(
            cache.get(&security_bulletin_key(&url)),
            Some(json!({"severity": "High"}))
        );
    }

    #[tokio::test]
    async fn fetch_severities_uses_cached_severity_without_network() {
        let temp_dir = TempDir::new().unwrap();
        let cache: Arc<dyn CacheStore> =
            Arc::new(SqliteCache::new(&temp_dir.path().join("test.db"), 3600).unwrap());

        let url = "http://127.0.0.1:9/unreachable".to_string();
        cache.set(&security_bulletin_key(&url), &json!({"severity": "Critical"}));

        let fetcher = SecurityBulletinFetcher::new(Duration::from_secs(1), Some(cache));

        assert_eq!(
            fetcher.fetch_severities(&[url]).await,
            SeverityCounts::from([("Critical".to_string(), 1)])
        );
    }

    #[tokio::test]
    async fn fetch_severities_refetches_when_cached_entry_lacks_severity() {
        let temp_dir = TempDir::new().unwrap();
        let cache: Arc<dyn CacheStore> =
            Arc::new(SqliteCache::new(&temp_dir.path().join("test.db"), 3600).unwrap());

        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/sa-001")
            .with_status(200)
            .with_body("<li><strong>Severity:</strong> Low</li>")
            .expect(1)
            .create_async()
            .await;

        let url = format!("{}/sa-001", server.url());
        cache.set(&security_bulletin_key(&url), &json!({"unexpected": true}));

        let fetcher = SecurityBulletinFetcher::new(Duration::from_secs(5), Some(cache));

        assert_eq!(
            fetcher.fetch_severities(&[url]).await,
            SeverityCounts::from([("Low".to_string(), 1)])
        );
        mock.assert_async().await;
    }
}
