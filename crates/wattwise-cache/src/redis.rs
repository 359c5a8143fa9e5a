//! Redis-backed response cache shared by every API instance.

use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use wattwise_core::RedisErrorExt;

use crate::response::{CacheResult, CachedResponse};

const DEFAULT_NAMESPACE: &str = "wattwise";

/// Redis cache storage.
///
/// Cloning is cheap; clones share one multiplexed connection.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    namespace: String,
}

impl RedisCacheStore {
    /// Connect to the server at `url` (e.g. `redis://127.0.0.1:6379/0`).
    pub async fn connect(url: &str) -> CacheResult<Self> {
        Self::connect_with_namespace(url, DEFAULT_NAMESPACE).await
    }

    pub async fn connect_with_namespace(url: &str, namespace: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(RedisErrorExt::into_database_error)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(RedisErrorExt::into_database_error)?;

        tracing::info!("Connected to Redis cache (namespace '{}')", namespace);
        Ok(Self {
            conn,
            namespace: namespace.to_string(),
        })
    }

    fn response_key(&self, key: &str) -> String {
        response_key(&self.namespace, key)
    }

    fn counter_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<CachedResponse>> {
        let mut conn = self.conn.clone();
        let redis_key = self.response_key(key);
        let bytes: Option<Vec<u8>> = redis::cmd("GET")
            .arg(&redis_key)
            .query_async(&mut conn)
            .await
            .map_err(RedisErrorExt::into_database_error)?;

        let Some(bytes) = bytes else {
            return Ok(None);
        };

        match CachedResponse::decode(&bytes) {
            Ok(response) if !response.is_expired(Utc::now()) => Ok(Some(response)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {}", redis_key, e);
                Ok(None)
            }
        }
    }

    /// Check whether a fresh, readable entry exists.
    pub async fn contains(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Store a response; Redis expires it at `expires_at` when one is set.
    pub async fn put(&self, key: &str, response: &CachedResponse) -> CacheResult<()> {
        let encoded = response.encode()?;
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.response_key(key)).arg(encoded);

        if let Some(expires_at) = response.expires_at {
            let ttl = (expires_at - Utc::now()).num_seconds().max(1);
            cmd.arg("EX").arg(ttl);
        }

        cmd.query_async::<_, ()>(&mut conn)
            .await
            .map_err(RedisErrorExt::into_database_error)?;
        Ok(())
    }

    /// Atomically increment a window counter and return its new value.
    pub async fn incr(&self, key: &str, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> CacheResult<u64> {
        let mut conn = self.conn.clone();
        let counter_key = self.counter_key(key);
        let ttl = (expires_at - now).num_seconds().max(1);

        let (count, _): (i64, i64) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&counter_key)
            .cmd("EXPIRE")
            .arg(&counter_key)
            .arg(ttl)
            .query_async(&mut conn)
            .await
            .map_err(RedisErrorExt::into_database_error)?;

        Ok(count.max(0) as u64)
    }
}

fn response_key(namespace: &str, key: &str) -> String {
    format!("{}:http:{}", namespace, key)
}
