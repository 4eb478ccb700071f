use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheCategory, CacheStore, ttl_for_key};
use crate::error::CacheError;

/// How long a writer waits for a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

/// SQLite-backed [`CacheStore`].
///
/// Every entry is a single row, so a write replaces the previous payload atomically and
/// concurrent writers to the same key leave exactly one complete payload behind.
pub struct SqliteCache {
    conn: Mutex<Connection>,
    default_ttl_secs: i64,
    clock: Clock,
}

impl SqliteCache {
    pub fn new(db_path: &Path, default_ttl_secs: i64) -> Result<Self, CacheError> {
        Self::with_clock(db_path, default_ttl_secs, Box::new(Self::current_timestamp_secs))
    }

    /// Creates a cache that reads the current time (unix seconds) from `clock`
    pub fn with_clock(
        db_path: &Path,
        default_ttl_secs: i64,
        clock: Clock,
    ) -> Result<Self, CacheError> {
        info!("Initializing cache database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        debug!("Database connection established");

        let cache = Self {
            conn: Mutex::new(conn),
            default_ttl_secs,
            clock,
        };

        cache.create_schema()?;
        info!("Cache initialized successfully");

        Ok(cache)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn current_timestamp_secs() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                payload TEXT NOT NULL,
                written_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_category_written_at ON cache_entries(category, written_at)",
            [],
        )?;

        debug!("Database schema created successfully");
        Ok(())
    }

    /// Reads the payload stored under `key`.
    ///
    /// Expired entries and payloads that are not valid JSON are deleted and reported as
    /// missing, so the next successful fetch overwrites them.
    pub fn try_get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let conn = self.lock_conn()?;

        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT payload, written_at FROM cache_entries WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((payload, written_at)) = row else {
            return Ok(None);
        };

        let ttl = ttl_for_key(key, self.default_ttl_secs);
        if ttl > 0 && (self.clock)() - written_at > ttl {
            debug!("Cache entry {} expired, removing", key);
            conn.execute("DELETE FROM cache_entries WHERE key = ?1", [key])?;
            return Ok(None);
        }

        match serde_json::from_str(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding corrupt cache entry {}: {}", key, e);
                conn.execute("DELETE FROM cache_entries WHERE key = ?1", [key])?;
                Ok(None)
            }
        }
    }

    /// Stores `payload` under `key`, replacing any previous entry.
    pub fn try_set(&self, key: &str, payload: &Value) -> Result<(), CacheError> {
        let json = serde_json::to_string(payload)?;
        let category = CacheCategory::from_key(key);
        let now = (self.clock)();

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO cache_entries (key, category, payload, written_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                category = excluded.category,
                payload = excluded.payload,
                written_at = excluded.written_at
            "#,
            (key, category.as_str(), json, now),
        )?;

        debug!("Cached {} ({})", key, category.as_str());
        Ok(())
    }

    /// Deletes every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        if self.default_ttl_secs <= 0 {
            return Ok(0);
        }

        let threshold = (self.clock)() - self.default_ttl_secs;
        let conn = self.lock_conn()?;

        // Content and bulletin entries never expire
        let removed = conn.execute(
            "DELETE FROM cache_entries WHERE category IN (?1, ?2) AND written_at < ?3",
            (
                CacheCategory::ReleaseIndex.as_str(),
                CacheCategory::Other.as_str(),
                threshold,
            ),
        )?;

        debug!("Purged {} expired cache entries", removed);
        Ok(removed)
    }

    /// Deletes every entry, returning how many were removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM cache_entries", [])?;
        info!("Cleared {} cache entries", removed);
        Ok(removed)
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.try_get(key)
            .inspect_err(|e| warn!("Failed to read cache entry {}: {}", key, e))
            .ok()
            .flatten()
    }

    fn set(&self, key: &str, payload: &Value) {
        let _ = self
            .try_set(key, payload)
            .inspect_err(|e| warn!("Failed to write cache entry {}: {}", key, e));
    }
}
