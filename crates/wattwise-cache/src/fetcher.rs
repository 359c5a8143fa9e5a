//! HTTP fetching through the response cache.

use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use wattwise_core::{NetworkError, ReqwestErrorExt};

use crate::key::OutboundRequest;
use crate::response::{CacheError, CachedResponse};
use crate::store::CacheStore;

const USER_AGENT: &str = concat!("WattWise/", env!("CARGO_PKG_VERSION"));

/// Errors from a cached fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider answered with a non-2xx status.
    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider could not be reached or the exchange failed.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// The provider answered 2xx with a body we could not read.
    #[error("Unexpected upstream payload: {0}")]
    Decode(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Wraps a `reqwest::Client` so identical outbound requests are served
/// from the `CacheStore` after the first successful call.
#[derive(Clone)]
pub struct CachedFetcher {
    client: reqwest::Client,
    store: CacheStore,
    ttl: Option<Duration>,
}

impl CachedFetcher {
    /// Build a fetcher with its own HTTP client.
    pub fn new(store: CacheStore, timeout: Duration, ttl: Option<Duration>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Network(e.into_network_error()))?;

        Ok(Self::with_client(client, store, ttl))
    }

    pub fn with_client(client: reqwest::Client, store: CacheStore, ttl: Option<Duration>) -> Self {
        Self { client, store, ttl }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Whether a fresh cached response exists for the request.
    pub async fn contains(&self, request: &OutboundRequest) -> Result<bool, FetchError> {
        Ok(self.store.contains(&request.cache_key()).await?)
    }

    /// Return the cached response for the request, or perform it.
    ///
    /// Only 2xx responses are stored. Anything else surfaces as
    /// `FetchError::Status` and the next call goes upstream again.
    #[instrument(skip_all, fields(url = %request.url))]
    pub async fn fetch(&self, request: &OutboundRequest) -> Result<CachedResponse, FetchError> {
        let key = request.cache_key();

        if let Some(hit) = self.store.get(&key).await? {
            tracing::debug!("Cache hit for {}", request.redacted());
            return Ok(hit);
        }

        tracing::info!("Cache miss, calling {}", request.redacted());
        let response = request
            .to_request(&self.client)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.into_network_error()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.into_network_error()))?;

        if !status.is_success() {
            tracing::warn!("Upstream {} returned {}", request.url, status);
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let cached_at = Utc::now();
        let expires_at = self
            .ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| cached_at + ttl);

        let fetched = CachedResponse {
            status: status.as_u16(),
            headers,
            body: body.to_vec(),
            cached_at,
            expires_at,
            from_cache: false,
        };

        self.store.put(&key, &fetched).await?;
        Ok(fetched)
    }

    /// Fetch and decode a JSON body.
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: &OutboundRequest) -> Result<T, FetchError> {
        let response = self.fetch(request).await?;
        response
            .json()
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}
