use std::sync::Arc;

use anyhow::{Context, Result};
use wattwise_cache::{CacheStore, CachedFetcher, RateLimiter};
use wattwise_core::{Config, RateLimitConfig};
use wattwise_predict::{EnergyModel, LinearModel};
use wattwise_weather::{ClimateClient, GeocodeClient, TimezoneLookup};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: CachedFetcher,
    pub geocoder: GeocodeClient,
    pub climate: ClimateClient,
    pub limiter: RateLimiter,
    pub limits: RateLimitConfig,
    pub model: Arc<dyn EnergyModel>,
}

impl AppState {
    /// Wire the state from already-built parts.
    pub fn new(
        fetcher: CachedFetcher,
        config: &Config,
        model: Arc<dyn EnergyModel>,
    ) -> Self {
        let timezones = Arc::new(TimezoneLookup::new());
        Self {
            geocoder: GeocodeClient::from_config(fetcher.clone(), &config.providers),
            climate: ClimateClient::from_config(fetcher.clone(), &config.providers, timezones),
            limiter: RateLimiter::new(fetcher.store().clone()),
            limits: config.rate_limit.clone(),
            model,
            fetcher,
        }
    }

    /// Open the cache backend and load the model named in `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = CacheStore::from_config(&config.cache)
            .await
            .context("Failed to open cache backend")?;
        let fetcher = CachedFetcher::new(store, config.cache.http_timeout(), config.cache.ttl())
            .context("Failed to build HTTP client")?;

        let model = LinearModel::from_path(&config.model.path).with_context(|| {
            format!("Failed to load model from {}", config.model.path.display())
        })?;

        Ok(Self::new(fetcher, config, Arc::new(model)))
    }
}
