//! Request handlers, one module per endpoint.

pub mod climate;
pub mod geocode;
pub mod health;
pub mod params;
pub mod predict;

use crate::error::ApiError;

/// Fallback for paths no route matches.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Fallback for known paths hit with the wrong method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
