//! Release index retrieval

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, releases_key};
use crate::error::FetchError;
use crate::release::api::ReleaseApi;
use crate::release::types::ReleaseSummary;

/// Fetches the list of releases of a major version, through the cache
pub struct ReleaseIndexFetcher {
    api: Arc<dyn ReleaseApi>,
    cache: Option<Arc<dyn CacheStore>>,
}

impl ReleaseIndexFetcher {
    pub fn new(api: Arc<dyn ReleaseApi>, cache: Option<Arc<dyn CacheStore>>) -> Self {
        Self { api, cache }
    }

    /// Returns every release of `major` in API order.
    ///
    /// A cached index is used while it is fresh. Otherwise the index is fetched once and
    /// written back. Network and decoding failures are reported as
    /// [`FetchError::Unavailable`].
    pub async fn get_releases(&self, major: u64) -> Result<Vec<ReleaseSummary>, FetchError> {
        let cache_key = releases_key(major);

        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&cache_key)) {
            match decode(&cached) {
                Ok(releases) => {
                    debug!("Using cached release index for v{}", major);
                    return Ok(releases);
                }
                Err(e) => warn!("Ignoring undecodable cached release index {}: {}", cache_key, e),
            }
        }

        let payload = self.api.fetch_release_index(major).await.map_err(|e| {
            warn!("Failed to fetch release index for v{}: {}", major, e);
            FetchError::unavailable()
        })?;

        let releases = decode(&payload).map_err(|e| {
            warn!("Failed to decode release index for v{}: {}", major, e);
            FetchError::unavailable()
        })?;

        if let Some(cache) = &self.cache {
            cache.set(&cache_key, &payload);
        }

        info!("Fetched {} releases for v{}", releases.len(), major);
        Ok(releases)
    }
}

fn decode(payload: &Value) -> Result<Vec<ReleaseSummary>, serde_json::Error> {
    Vec::<ReleaseSummary>::deserialize(payload)
}
