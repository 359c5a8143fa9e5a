//! Shared error types for the WattWise services.
//!
//! Crates wrap these in their own error enums; the HTTP layer uses
//! `user_message()` so internal details never reach API callers.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request could not be built: {0}")]
    InvalidRequest(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "The upstream provider could not be reached.",
            NetworkError::Timeout => "The upstream provider did not respond in time.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The upstream provider is experiencing issues."
            }
            NetworkError::ServerError { .. } => "The upstream provider rejected the request.",
            NetworkError::InvalidResponse(_) => {
                "The upstream provider returned an unexpected response."
            }
            NetworkError::InvalidRequest(_) => "The upstream request could not be built.",
        }
    }
}

/// Storage errors (SQLite, Redis, serialization of stored values).
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),

    #[error("Stored value could not be (de)serialized: {0}")]
    Serialization(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => "The cache backend is unavailable.",
            DatabaseError::QueryFailed(_) => "A cache operation failed.",
            DatabaseError::Corruption(_) => "Cached data is corrupted.",
            DatabaseError::Serialization(_) => "Cached data could not be read.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if self.is_builder() {
            NetworkError::InvalidRequest(self.to_string())
        } else if self.is_decode() || self.is_body() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                DatabaseError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DatabaseError::ConnectionFailed(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}

/// Extension trait for converting redis errors to our error types.
pub trait RedisErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RedisErrorExt for redis::RedisError {
    fn into_database_error(self) -> DatabaseError {
        if self.is_connection_dropped() || self.is_connection_refusal() || self.is_timeout() {
            DatabaseError::ConnectionFailed(self.to_string())
        } else if self.kind() == redis::ErrorKind::TypeError {
            DatabaseError::Corruption(self.to_string())
        } else {
            DatabaseError::QueryFailed(self.to_string())
        }
    }
}

/// Field-level input errors, reported together.
///
/// Serializes as an object mapping each field to its messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "Invalid input: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_messages_depend_on_status() {
        let upstream = NetworkError::ServerError {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(
            upstream.user_message(),
            "The upstream provider is experiencing issues."
        );

        let rejected = NetworkError::ServerError {
            status: 401,
            message: "bad key".into(),
        };
        assert_eq!(
            rejected.user_message(),
            "The upstream provider rejected the request."
        );
    }

    #[test]
    fn test_rusqlite_error_conversion() {
        let err = rusqlite::Error::QueryReturnedNoRows.into_database_error();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }

    #[test]
    fn test_redis_type_error_is_corruption() {
        let err = redis::RedisError::from((redis::ErrorKind::TypeError, "not a string"));
        assert!(matches!(err.into_database_error(), DatabaseError::Corruption(_)));
    }

    #[test]
    fn test_database_display_keeps_detail() {
        let err = DatabaseError::QueryFailed("no such table: http_cache".into());
        assert!(err.to_string().contains("http_cache"));
        assert_eq!(err.user_message(), "A cache operation failed.");
    }

    #[test]
    fn test_validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("lat", "Must be between -90 and 90.");
        errors.add("lat", "Not a valid number.");
        errors.add("BEDROOMS", "Not a valid integer.");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.messages("lat").len(), 2);
        assert!(errors.messages("lng").is_empty());
        assert_eq!(errors.to_string(), "Invalid input: BEDROOMS, lat");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["BEDROOMS"][0], "Not a valid integer.");
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(5), Ok(5));

        let mut errors = ValidationErrors::new();
        errors.add("search", "Shorter than minimum length 3.");
        assert!(errors.into_result(()).is_err());
    }
}
