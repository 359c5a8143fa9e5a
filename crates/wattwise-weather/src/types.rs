use serde::{Deserialize, Serialize};
use wattwise_cache::FetchError;

/// A coordinate pair, already range-checked by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A de-duplicated geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Provider geohash, unique within a response
    pub id: String,
    pub formatted: String,
    pub lat: f64,
    pub lng: f64,
}

/// One day of the climate series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemp {
    pub day: String,
    /// Mean temperature in Fahrenheit; `None` when the archive has a gap
    pub temp: Option<f64>,
}

/// Degree-day aggregates plus the daily series they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSummary {
    #[serde(rename = "HDD65")]
    pub hdd65: i64,
    #[serde(rename = "CDD65")]
    pub cdd65: i64,
    pub stats: Vec<DailyTemp>,
}

// OpenCage payload

#[derive(Debug, Deserialize)]
pub(crate) struct OpenCageResponse {
    #[serde(default)]
    pub results: Vec<OpenCageResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenCageResult {
    #[serde(default)]
    pub annotations: OpenCageAnnotations,
    pub geometry: OpenCageGeometry,
    #[serde(default)]
    pub components: AddressComponents,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenCageAnnotations {
    pub geohash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenCageGeometry {
    pub lat: f64,
    pub lng: f64,
}

/// The address parts used to build a display string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AddressComponents {
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

// Open-Meteo archive payload

#[derive(Debug, Deserialize)]
pub(crate) struct ArchiveResponse {
    pub daily: ArchiveDaily,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArchiveDaily {
    pub time: Vec<String>,
    pub temperature_2m_mean: Vec<Option<f64>>,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_climate_summary_uses_upper_case_keys() {
        let summary = ClimateSummary {
            hdd65: 5,
            cdd65: 7,
            stats: vec![DailyTemp {
                day: "2022-01-01".to_string(),
                temp: Some(30.5),
            }],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["HDD65"], 5);
        assert_eq!(json["CDD65"], 7);
        assert_eq!(json["stats"][0]["day"], "2022-01-01");
        assert_eq!(json["stats"][0]["temp"], 30.5);
    }

    #[test]
    fn test_components_tolerate_missing_fields() {
        let components: AddressComponents =
            serde_json::from_value(serde_json::json!({"city": "Springfield", "_type": "city"}))
                .unwrap();
        assert_eq!(components.city.as_deref(), Some("Springfield"));
        assert!(components.postcode.is_none());
    }
}
