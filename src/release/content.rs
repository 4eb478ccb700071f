//! Release content retrieval with bounded concurrency

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, content_key};
use crate::changelog::parser::ChangelogParser;
use crate::config::DEFAULT_MAX_CONCURRENT_FETCHES;
use crate::release::api::ReleaseApi;
use crate::release::types::ReleaseContent;
use crate::version::CoreVersion;

/// Fetches and parses the changelogs of a set of releases
pub struct ReleaseContentFetcher {
    api: Arc<dyn ReleaseApi>,
    cache: Option<Arc<dyn CacheStore>>,
    parser: Arc<ChangelogParser>,
    max_concurrent: usize,
}

impl ReleaseContentFetcher {
    pub fn new(
        api: Arc<dyn ReleaseApi>,
        cache: Option<Arc<dyn CacheStore>>,
        parser: Arc<ChangelogParser>,
    ) -> Self {
        Self {
            api,
            cache,
            parser,
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    /// Sets how many content requests may be in flight at once
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Returns the parsed content of every version that could be retrieved.
    ///
    /// Cached payloads are parsed directly; the remaining versions are fetched with at
    /// most `max_concurrent` requests in flight. Versions whose request fails or whose
    /// body is malformed are absent from the result. Iteration order of the returned map
    /// carries no meaning.
    pub async fn get_contents(
        &self,
        versions: &[CoreVersion],
    ) -> HashMap<CoreVersion, ReleaseContent> {
        let mut results = HashMap::new();
        let mut uncached = Vec::new();

        for version in versions {
            let cached = self
                .cache
                .as_ref()
                .and_then(|c| c.get(&content_key(&version.to_string())));

            match cached {
                Some(payload) => {
                    debug!("Using cached content for {}", version);
                    results.insert(version.clone(), self.parser.parse(&payload).await);
                }
                None => uncached.push(version.clone()),
            }
        }

        if uncached.is_empty() {
            return results;
        }

        info!(
            "Fetching release content for {} versions ({} in parallel)",
            uncached.len(),
            self.max_concurrent
        );

        let fetched: Vec<(CoreVersion, Option<ReleaseContent>)> = stream::iter(uncached)
            .map(|version| async move {
                let content = self.fetch_content(&version).await;
                (version, content)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        for (version, content) in fetched {
            if let Some(content) = content {
                results.insert(version, content);
            }
        }

        results
    }

    async fn fetch_content(&self, version: &CoreVersion) -> Option<ReleaseContent> {
        let payload = self
            .api
            .fetch_release_content(version)
            .await
            .inspect_err(|e| warn!("Failed to fetch release content for {}: {}", version, e))
            .ok()?;

        // Content entries never expire, so only complete responses may be cached
        if !payload.get("release_notes").is_some_and(Value::is_object) {
            warn!("Skipping malformed release content for {}", version);
            return None;
        }

        if let Some(cache) = &self.cache {
            cache.set(&content_key(&version.to_string()), &payload);
        }

        Some(self.parser.parse(&payload).await)
    }
}
