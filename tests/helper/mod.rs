//! Shared utilities for end-to-end tests

#![allow(dead_code)]

use std::sync::Arc;

use mockito::{Mock, ServerGuard};
use serde_json::{Value, json};
use tempfile::TempDir;

use typo3_update_check::cache::{CacheStore, SqliteCache};
use typo3_update_check::config::{ApiConfig, Config, DEFAULT_INDEX_TTL_SECS};
use typo3_update_check::report::UpdateImpactChecker;

/// Creates a file-backed cache in a temporary directory
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn create_test_cache() -> (TempDir, Arc<dyn CacheStore>) {
    let temp_dir = TempDir::new().unwrap();
    let cache = SqliteCache::new(&temp_dir.path().join("cache.db"), DEFAULT_INDEX_TTL_SECS)
        .unwrap();
    (temp_dir, Arc::new(cache))
}

/// Builds a checker that talks to the mock server
pub fn create_checker(
    server: &ServerGuard,
    cache: Option<Arc<dyn CacheStore>>,
) -> UpdateImpactChecker {
    let config = Config {
        api: ApiConfig {
            base_url: server.url(),
            timeout_secs: 5,
        },
        ..Default::default()
    };
    UpdateImpactChecker::from_config(&config, cache)
}

/// Release index body listing `versions` newest first, as the API does
pub fn index_body(versions: &[&str]) -> String {
    let releases: Vec<Value> = versions
        .iter()
        .rev()
        .map(|v| json!({"version": v, "type": "regular", "date": "2025-01-14T10:00:00+01:00"}))
        .collect();
    Value::Array(releases).to_string()
}

/// Release content body with the given changelog lines and announcement text
pub fn content_body(version: &str, changes: &[&str], news: Option<&str>) -> String {
    json!({
        "version": version,
        "release_notes": {
            "version": version,
            "changes": changes.join("\n"),
            "news": news,
            "news_link": format!("https://typo3.org/article/typo3-{}-released", version.replace('.', "")),
        }
    })
    .to_string()
}

/// Index endpoint mock, not yet created, so callers can set expectations
pub fn index_mock(server: &mut ServerGuard, major: u64, versions: &[&str]) -> Mock {
    server
        .mock("GET", format!("/major/{}/release/", major).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(index_body(versions))
}

pub fn content_mock(
    server: &mut ServerGuard,
    version: &str,
    changes: &[&str],
    news: Option<&str>,
) -> Mock {
    server
        .mock("GET", format!("/release/{}/content", version).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(content_body(version, changes, news))
}

pub fn failure_mock(server: &mut ServerGuard, path: &str, status: usize) -> Mock {
    server.mock("GET", path).with_status(status)
}
