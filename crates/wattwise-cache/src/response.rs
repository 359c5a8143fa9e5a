//! Stored HTTP responses and cache error types.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wattwise_core::DatabaseError;

/// Errors that can occur during cache backend operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Storage error (SQLite, Redis, stored value encoding).
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// The blocking SQLite task panicked or was cancelled.
    #[error("Cache task failed: {0}")]
    Task(String),
}

impl CacheError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Database(e) => e.user_message(),
            Self::Task(_) => "A cache operation failed.",
        }
    }
}

/// Result type for cache backend operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// An upstream response as held in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    #[serde(with = "body_encoding")]
    pub body: Vec<u8>,
    pub cached_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Set when the value was read back from a store rather than fetched.
    #[serde(skip)]
    pub from_cache: bool,
}

impl CachedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    pub(crate) fn encode(&self) -> CacheResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| CacheError::Database(DatabaseError::Serialization(e.to_string())))
    }

    pub(crate) fn decode(bytes: &[u8]) -> CacheResult<Self> {
        let mut response: Self = serde_json::from_slice(bytes)
            .map_err(|e| CacheError::Database(DatabaseError::Serialization(e.to_string())))?;
        response.from_cache = true;
        Ok(response)
    }
}

mod body_encoding {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
