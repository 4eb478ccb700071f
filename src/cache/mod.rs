//! Persistent key/value cache for API responses
//!
//! Keys are namespaced by a category prefix which also decides how long an entry
//! stays valid:
//!
//! | Prefix               | Example                      | Lifetime        |
//! |----------------------|------------------------------|-----------------|
//! | `releases-`          | `releases-v12`               | configurable    |
//! | `content-`           | `content-12.4.2`             | never expires   |
//! | `security-bulletin-` | `security-bulletin-<url>`    | never expires   |

pub mod sqlite;

pub use sqlite::SqliteCache;

use serde_json::Value;

const RELEASES_PREFIX: &str = "releases-";
const CONTENT_PREFIX: &str = "content-";
const SECURITY_BULLETIN_PREFIX: &str = "security-bulletin-";

/// Key/value store consumed by the fetchers.
///
/// Implementations absorb their own failures: a failed read is a miss and a failed write
/// is dropped, so callers behave the same with or without a working cache.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, payload: &Value);
}

/// Category of a cache key, derived from its prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCategory {
    ReleaseIndex,
    Content,
    SecurityBulletin,
    Other,
}

impl CacheCategory {
    pub fn from_key(key: &str) -> Self {
        if key.starts_with(RELEASES_PREFIX) {
            CacheCategory::ReleaseIndex
        } else if key.starts_with(CONTENT_PREFIX) {
            CacheCategory::Content
        } else if key.starts_with(SECURITY_BULLETIN_PREFIX) {
            CacheCategory::SecurityBulletin
        } else {
            CacheCategory::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::ReleaseIndex => "release_index",
            CacheCategory::Content => "content",
            CacheCategory::SecurityBulletin => "security_bulletin",
            CacheCategory::Other => "other",
        }
    }
}

/// Returns the lifetime in seconds for `key`, where 0 means the entry never expires.
pub fn ttl_for_key(key: &str, default_ttl_secs: i64) -> i64 {
    match CacheCategory::from_key(key) {
        CacheCategory::Content | CacheCategory::SecurityBulletin => 0,
        CacheCategory::ReleaseIndex | CacheCategory::Other => default_ttl_secs,
    }
}

pub fn releases_key(major: u64) -> String {
    format!("{RELEASES_PREFIX}v{major}")
}

pub fn content_key(version: &str) -> String {
    format!("{CONTENT_PREFIX}{version}")
}

pub fn security_bulletin_key(url: &str) -> String {
    format!("{SECURITY_BULLETIN_PREFIX}{url}")
}
