//! Unified cache store supporting multiple backends.
//!
//! This module provides `CacheStore`, an enum that wraps the SQLite and Redis
//! backends with a consistent async interface.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use wattwise_core::{CacheBackendKind, CacheConfig, DatabaseError};

use crate::redis::RedisCacheStore;
use crate::response::{CacheError, CacheResult, CachedResponse};
use crate::sqlite::SqliteCacheStore;

/// Unified cache store.
///
/// Cloning is cheap; every clone talks to the same backend.
#[derive(Clone)]
pub enum CacheStore {
    /// Local SQLite file (default).
    Sqlite(Arc<Mutex<SqliteCacheStore>>),

    /// Remote Redis server, shared across instances.
    Redis(RedisCacheStore),
}

impl CacheStore {
    /// Create a new SQLite-backed store.
    pub fn sqlite(store: SqliteCacheStore) -> Self {
        Self::Sqlite(Arc::new(Mutex::new(store)))
    }

    /// Create a new Redis-backed store.
    pub fn redis(store: RedisCacheStore) -> Self {
        Self::Redis(store)
    }

    /// Open the backend selected by configuration.
    pub async fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        match config.backend {
            CacheBackendKind::Sqlite => {
                let path = config.path.clone();
                let store = tokio::task::spawn_blocking(move || SqliteCacheStore::new(path))
                    .await
                    .map_err(|e| CacheError::Task(e.to_string()))??;
                tracing::info!("Using SQLite cache at {}", config.path.display());
                Ok(Self::sqlite(store))
            }
            CacheBackendKind::Redis => {
                let url = config.redis_url.as_deref().ok_or_else(|| {
                    DatabaseError::ConnectionFailed("cache.redis_url is not set".to_string())
                })?;
                Ok(Self::redis(RedisCacheStore::connect(url).await?))
            }
        }
    }

    /// Check if this store uses SQLite storage.
    pub fn is_sqlite(&self) -> bool {
        matches!(self, Self::Sqlite(_))
    }

    /// Check if this store uses Redis.
    pub fn is_redis(&self) -> bool {
        matches!(self, Self::Redis(_))
    }

    /// Fetch a fresh entry.
    pub async fn get(&self, key: &str) -> CacheResult<Option<CachedResponse>> {
        match self {
            Self::Sqlite(store) => {
                let store = store.clone();
                let key = key.to_string();
                tokio::task::spawn_blocking(move || store.lock().get(&key))
                    .await
                    .map_err(|e| CacheError::Task(e.to_string()))?
            }
            Self::Redis(store) => store.get(key).await,
        }
    }

    /// Check whether a fresh entry exists.
    pub async fn contains(&self, key: &str) -> CacheResult<bool> {
        match self {
            Self::Sqlite(store) => {
                let store = store.clone();
                let key = key.to_string();
                tokio::task::spawn_blocking(move || store.lock().contains(&key))
                    .await
                    .map_err(|e| CacheError::Task(e.to_string()))?
            }
            Self::Redis(store) => store.contains(key).await,
        }
    }

    /// Store an entry.
    pub async fn put(&self, key: &str, response: &CachedResponse) -> CacheResult<()> {
        match self {
            Self::Sqlite(store) => {
                let store = store.clone();
                let key = key.to_string();
                let response = response.clone();
                tokio::task::spawn_blocking(move || store.lock().put(&key, &response))
                    .await
                    .map_err(|e| CacheError::Task(e.to_string()))?
            }
            Self::Redis(store) => store.put(key, response).await,
        }
    }

    /// Increment the counter at `key`, which lives until `expires_at`.
    pub async fn incr(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CacheResult<u64> {
        match self {
            Self::Sqlite(store) => {
                let store = store.clone();
                let key = key.to_string();
                tokio::task::spawn_blocking(move || store.lock().incr(&key, expires_at, now))
                    .await
                    .map_err(|e| CacheError::Task(e.to_string()))?
            }
            Self::Redis(store) => store.incr(key, expires_at, now).await,
        }
    }
}
