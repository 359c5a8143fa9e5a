//! SQLite-based response cache.
//!
//! `SqliteCacheStore` keeps serialized upstream responses and fixed-window
//! rate-limit counters in one database file so both survive restarts.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use wattwise_core::RusqliteErrorExt;

use crate::response::{CacheResult, CachedResponse};

/// How long a writer waits on a database locked by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based cache storage.
pub struct SqliteCacheStore {
    conn: Connection,
}

impl SqliteCacheStore {
    /// Open (or create) a cache database at the given path.
    ///
    /// Parent directories are created when missing.
    pub fn new<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                wattwise_core::DatabaseError::ConnectionFailed(format!(
                    "Failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(RusqliteErrorExt::into_database_error)?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(RusqliteErrorExt::into_database_error)?;

        let store = Self { conn };
        store.init_schema()?;
        tracing::debug!("Opened SQLite cache at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory cache (for testing).
    pub fn in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory().map_err(RusqliteErrorExt::into_database_error)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> CacheResult<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS responses (
                    key TEXT PRIMARY KEY,
                    response BLOB NOT NULL,
                    created_at INTEGER NOT NULL,
                    expires_at INTEGER
                );

                CREATE TABLE IF NOT EXISTS rate_limits (
                    key TEXT PRIMARY KEY,
                    count INTEGER NOT NULL,
                    expires_at INTEGER NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_rate_limits_expires ON rate_limits(expires_at);
                "#,
            )
            .map_err(RusqliteErrorExt::into_database_error)?;
        Ok(())
    }

    /// Look up a response, ignoring (and dropping) expired or unreadable entries.
    pub fn get(&self, key: &str) -> CacheResult<Option<CachedResponse>> {
        let row: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT response FROM responses WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(RusqliteErrorExt::into_database_error)?;

        let Some(bytes) = row else {
            return Ok(None);
        };

        let response = match CachedResponse::decode(&bytes) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Dropping unreadable cache entry {}: {}", key, e);
                self.remove(key)?;
                return Ok(None);
            }
        };

        if response.is_expired(Utc::now()) {
            tracing::debug!("Cache entry {} expired", key);
            self.remove(key)?;
            return Ok(None);
        }

        Ok(Some(response))
    }

    /// Check whether a fresh, readable entry exists.
    pub fn contains(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Store a response, replacing any previous entry for the key.
    pub fn put(&self, key: &str, response: &CachedResponse) -> CacheResult<()> {
        let encoded = response.encode()?;
        self.conn
            .execute(
                r#"
                INSERT OR REPLACE INTO responses (key, response, created_at, expires_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    key,
                    encoded,
                    response.cached_at.timestamp(),
                    response.expires_at.map(|t| t.timestamp()),
                ],
            )
            .map_err(RusqliteErrorExt::into_database_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.conn
            .execute("DELETE FROM responses WHERE key = ?1", params![key])
            .map_err(RusqliteErrorExt::into_database_error)?;
        Ok(())
    }

    /// Increment a window counter and return its new value.
    ///
    /// The counter is created at 1 and lives until `expires_at`; stale
    /// counters are swept on the way in.
    pub fn incr(&self, key: &str, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> CacheResult<u64> {
        self.conn
            .execute(
                "DELETE FROM rate_limits WHERE expires_at <= ?1",
                params![now.timestamp()],
            )
            .map_err(RusqliteErrorExt::into_database_error)?;

        let count: i64 = self
            .conn
            .query_row(
                r#"
                INSERT INTO rate_limits (key, count, expires_at) VALUES (?1, 1, ?2)
                ON CONFLICT(key) DO UPDATE SET count = count + 1
                RETURNING count
                "#,
                params![key, expires_at.timestamp()],
                |row| row.get(0),
            )
            .map_err(RusqliteErrorExt::into_database_error)?;

        Ok(count.max(0) as u64)
    }

    /// Get the number of stored responses.
    pub fn len(&self) -> CacheResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))
            .map_err(RusqliteErrorExt::into_database_error)?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn response(expires_at: Option<DateTime<Utc>>) -> CachedResponse {
        CachedResponse {
            status: 200,
            headers: vec![],
            body: b"{}".to_vec(),
            cached_at: Utc::now(),
            expires_at,
            from_cache: false,
        }
    }

    #[test]
    fn test_put_then_get() {
        let store = SqliteCacheStore::in_memory().unwrap();
        assert!(store.get("k").unwrap().is_none());
        assert!(store.is_empty().unwrap());

        store.put("k", &response(None)).unwrap();
        let hit = store.get("k").unwrap().unwrap();
        assert!(hit.from_cache);
        assert_eq!(hit.body, b"{}");
        assert!(store.contains("k").unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_put_replaces_existing() {
        let store = SqliteCacheStore::in_memory().unwrap();
        store.put("k", &response(None)).unwrap();
        let mut newer = response(None);
        newer.body = b"[1]".to_vec();
        store.put("k", &newer).unwrap();
        assert_eq!(store.get("k").unwrap().unwrap().body, b"[1]");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let store = SqliteCacheStore::in_memory().unwrap();
        let past = Utc::now() - ChronoDuration::seconds(10);
        store.put("old", &response(Some(past))).unwrap();

        assert!(!store.contains("old").unwrap());
        assert!(store.get("old").unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_unreadable_entry_is_not_contained() {
        let store = SqliteCacheStore::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO responses (key, response, created_at, expires_at) VALUES ('bad', ?1, 0, NULL)",
                params![b"not json".to_vec()],
            )
            .unwrap();

        assert!(!store.contains("bad").unwrap());
        assert!(store.get("bad").unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_incr_counts_within_window() {
        let store = SqliteCacheStore::in_memory().unwrap();
        let now = Utc::now();
        let expires = now + ChronoDuration::seconds(60);

        assert_eq!(store.incr("ratelimit:user:1.2.3.4:0", expires, now).unwrap(), 1);
        assert_eq!(store.incr("ratelimit:user:1.2.3.4:0", expires, now).unwrap(), 2);
        assert_eq!(store.incr("ratelimit:user:5.6.7.8:0", expires, now).unwrap(), 1);
    }

    #[test]
    fn test_incr_restarts_after_expiry() {
        let store = SqliteCacheStore::in_memory().unwrap();
        let now = Utc::now();
        store
            .incr("ratelimit:global:0", now + ChronoDuration::seconds(1), now)
            .unwrap();

        let later = now + ChronoDuration::seconds(5);
        let count = store
            .incr("ratelimit:global:0", later + ChronoDuration::seconds(1), later)
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("http_cache.sqlite");

        {
            let store = SqliteCacheStore::new(&path).unwrap();
            store.put("k", &response(None)).unwrap();
        }

        let reopened = SqliteCacheStore::new(&path).unwrap();
        assert!(reopened.get("k").unwrap().is_some());
    }
}
