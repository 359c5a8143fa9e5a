//! Forward and reverse geocoding through OpenCage.

use std::collections::HashSet;

use tracing::instrument;
use wattwise_cache::{CachedFetcher, OutboundRequest};
use wattwise_core::ProvidersConfig;

use crate::types::{AddressComponents, Coordinates, OpenCageResponse, Place, WeatherError};

const GEOCODE_PATH: &str = "/geocode/v1/json";
const COUNTRY_CODE: &str = "us";
const RESULT_LIMIT: u32 = 5;

/// What to look up: free text, or a coordinate to reverse geocode.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeQuery {
    Search(String),
    Reverse(Coordinates),
}

impl GeocodeQuery {
    /// The `q` parameter sent to the provider.
    pub fn as_query(&self) -> String {
        match self {
            Self::Search(text) => text.clone(),
            Self::Reverse(Coordinates { lat, lng }) => format!("{}, {}", lat, lng),
        }
    }
}

#[derive(Clone)]
pub struct GeocodeClient {
    fetcher: CachedFetcher,
    base_url: String,
    api_key: String,
}

impl GeocodeClient {
    pub fn new(fetcher: CachedFetcher, base_url: &str, api_key: Option<&str>) -> Self {
        if api_key.map_or(true, str::is_empty) {
            tracing::warn!("No OpenCage key configured; geocoding calls will fail upstream");
        }
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.unwrap_or_default().to_string(),
        }
    }

    pub fn from_config(fetcher: CachedFetcher, providers: &ProvidersConfig) -> Self {
        Self::new(
            fetcher,
            &providers.opencage_url,
            providers.opencage_key.as_deref(),
        )
    }

    /// The outbound request for a query, usable as a cache probe before `lookup`.
    pub fn request(&self, query: &GeocodeQuery) -> OutboundRequest {
        OutboundRequest::get(format!("{}{}", self.base_url, GEOCODE_PATH))
            .param("q", query.as_query())
            .param("abbrv", 1)
            .param("countrycode", COUNTRY_CODE)
            .param("limit", RESULT_LIMIT)
            .param("no_record", 1)
            .param("key", &self.api_key)
    }

    /// Run a prepared request and shape the matches.
    #[instrument(skip_all, level = "info")]
    pub async fn lookup(&self, request: &OutboundRequest) -> Result<Vec<Place>, WeatherError> {
        let body: OpenCageResponse = self.fetcher.fetch_json(request).await?;
        let places = unique_places(body);
        tracing::debug!("Geocoded to {} unique places", places.len());
        Ok(places)
    }

    pub async fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<Place>, WeatherError> {
        self.lookup(&self.request(query)).await
    }
}

/// Join postcode, city, state and country, skipping the ones not present.
pub fn format_components(components: &AddressComponents) -> String {
    [
        &components.postcode,
        &components.city,
        &components.state,
        &components.country,
    ]
    .into_iter()
    .flatten()
    .map(String::as_str)
    .collect::<Vec<_>>()
    .join(", ")
}

/// Keep the first result per geohash, in the order the provider sent them.
fn unique_places(response: OpenCageResponse) -> Vec<Place> {
    let mut seen = HashSet::new();
    let mut places = Vec::new();

    for result in response.results {
        let Some(geohash) = result.annotations.geohash else {
            tracing::debug!("Skipping geocode result without a geohash");
            continue;
        };
        if !seen.insert(geohash.clone()) {
            continue;
        }
        places.push(Place {
            id: geohash,
            formatted: format_components(&result.components),
            lat: result.geometry.lat,
            lng: result.geometry.lng,
        });
    }

    places
}
