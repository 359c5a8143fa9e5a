//! Yearly heating and cooling degree days from the Open-Meteo archive.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::instrument;
use wattwise_cache::{CachedFetcher, OutboundRequest};
use wattwise_core::ProvidersConfig;

use crate::timezone::TimezoneLookup;
use crate::types::{ArchiveResponse, ClimateSummary, Coordinates, DailyTemp, WeatherError};

const ARCHIVE_PATH: &str = "/v1/archive";
const DAILY_VARIABLE: &str = "temperature_2m_mean";

/// Balance point for degree days, in Fahrenheit.
pub const BASE_TEMPERATURE_F: f64 = 65.0;

#[derive(Clone)]
pub struct ClimateClient {
    fetcher: CachedFetcher,
    base_url: String,
    start: NaiveDate,
    end: NaiveDate,
    timezones: Arc<TimezoneLookup>,
}

impl ClimateClient {
    pub fn new(
        fetcher: CachedFetcher,
        base_url: &str,
        start: NaiveDate,
        end: NaiveDate,
        timezones: Arc<TimezoneLookup>,
    ) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            start,
            end,
            timezones,
        }
    }

    pub fn from_config(
        fetcher: CachedFetcher,
        providers: &ProvidersConfig,
        timezones: Arc<TimezoneLookup>,
    ) -> Self {
        Self::new(
            fetcher,
            &providers.open_meteo_url,
            providers.climate_start,
            providers.climate_end,
            timezones,
        )
    }

    /// The archive request for a location. Days are bucketed in the
    /// location's own timezone.
    pub fn request(&self, coords: Coordinates) -> OutboundRequest {
        let timezone = self.timezones.zone_for(coords.lat, coords.lng);

        OutboundRequest::get(format!("{}{}", self.base_url, ARCHIVE_PATH))
            .param("latitude", coords.lat)
            .param("longitude", coords.lng)
            .param("start_date", self.start.format("%Y-%m-%d"))
            .param("end_date", self.end.format("%Y-%m-%d"))
            .param("daily", DAILY_VARIABLE)
            .param("temperature_unit", "fahrenheit")
            .param("timezone", timezone)
    }

    #[instrument(skip_all, level = "info")]
    pub async fn summary(&self, request: &OutboundRequest) -> Result<ClimateSummary, WeatherError> {
        let body: ArchiveResponse = self.fetcher.fetch_json(request).await?;
        summarize(body)
    }

    pub async fn climate(&self, coords: Coordinates) -> Result<ClimateSummary, WeatherError> {
        self.summary(&self.request(coords)).await
    }
}

/// Cooling and heating degree days for one mean temperature, as `(cdd, hdd)`.
pub fn degree_days(temp: f64) -> (f64, f64) {
    if temp > BASE_TEMPERATURE_F {
        (temp - BASE_TEMPERATURE_F, 0.0)
    } else {
        (0.0, BASE_TEMPERATURE_F - temp)
    }
}

fn summarize(body: ArchiveResponse) -> Result<ClimateSummary, WeatherError> {
    let ArchiveResponse { daily } = body;
    if daily.time.len() != daily.temperature_2m_mean.len() {
        return Err(WeatherError::InvalidResponse(format!(
            "{} days but {} temperatures",
            daily.time.len(),
            daily.temperature_2m_mean.len()
        )));
    }

    let mut cdd = 0.0;
    let mut hdd = 0.0;
    let mut stats = Vec::with_capacity(daily.time.len());

    for (day, temp) in daily.time.into_iter().zip(daily.temperature_2m_mean) {
        // Gaps in the archive contribute nothing.
        if let Some(temp) = temp {
            let (c, h) = degree_days(temp);
            cdd += c;
            hdd += h;
        }
        stats.push(DailyTemp { day, temp });
    }

    Ok(ClimateSummary {
        hdd65: hdd.trunc() as i64,
        cdd65: cdd.trunc() as i64,
        stats,
    })
}
