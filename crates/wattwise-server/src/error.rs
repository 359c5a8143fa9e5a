//! The JSON error envelope every failed request answers with.

use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use wattwise_cache::{CacheError, FetchError};
use wattwise_core::{NetworkError, ValidationErrors};
use wattwise_predict::ModelError;
use wattwise_weather::WeatherError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Malformed request: {0}")]
    BadRequest(String),

    /// The framework refused the request body (size limit, unreadable stream).
    #[error("Request body rejected: {detail}")]
    BodyRejected { status: StatusCode, detail: String },

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Rate limit exceeded")]
    RateLimited,

    /// Upstream answered with a non-2xx status; it is passed through.
    #[error("Upstream returned {0}")]
    Upstream(u16),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Response body for every error.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub code: u16,
    pub name: String,
    pub description: Value,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::BodyRejected { status, .. } => *status,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(status) => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Cache(_) | Self::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn description(&self) -> Value {
        match self {
            Self::Validation(errors) => serde_json::to_value(errors).unwrap_or(Value::Null),
            Self::BadRequest(detail) => Value::String(detail.clone()),
            Self::BodyRejected { detail, .. } => Value::String(detail.clone()),
            Self::NotFound => "The requested URL was not found on the server.".into(),
            Self::MethodNotAllowed => "The method is not allowed for the requested URL.".into(),
            Self::RateLimited => "Too many requests. Try again later.".into(),
            Self::Upstream(status) => NetworkError::ServerError {
                status: *status,
                message: String::new(),
            }
            .user_message()
            .into(),
            Self::BadGateway(detail) => Value::String(detail.clone()),
            Self::Cache(e) => e.user_message().into(),
            Self::Model(_) => "The prediction model failed.".into(),
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let status = self.status();
        ErrorEnvelope {
            code: status.as_u16(),
            name: status.canonical_reason().unwrap_or("Unknown Error").to_string(),
            description: self.description(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }

        let body = serde_json::to_vec(&self.envelope()).unwrap_or_default();
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::BodyRejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status { status, .. } => Self::Upstream(status),
            FetchError::Network(e) => Self::BadGateway(e.user_message().to_string()),
            FetchError::Decode(_) => Self::BadGateway(
                NetworkError::InvalidResponse(String::new())
                    .user_message()
                    .to_string(),
            ),
            FetchError::Cache(e) => Self::Cache(e),
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::Fetch(e) => e.into(),
            WeatherError::InvalidResponse(detail) => {
                tracing::warn!("Provider payload rejected: {}", detail);
                Self::BadGateway(
                    NetworkError::InvalidResponse(detail)
                        .user_message()
                        .to_string(),
                )
            }
        }
    }
}
