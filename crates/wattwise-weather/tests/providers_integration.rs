//! Integration tests for the geocoding and climate clients using wiremock.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use wattwise_cache::{CacheStore, CachedFetcher, FetchError, SqliteCacheStore};
use wattwise_weather::{
    ClimateClient, Coordinates, GeocodeClient, GeocodeQuery, TimezoneLookup, WeatherError,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> CachedFetcher {
    let store = CacheStore::sqlite(SqliteCacheStore::in_memory().unwrap());
    CachedFetcher::new(store, Duration::from_secs(5), None).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_geocode_sends_provider_params_and_dedupes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .and(query_param("q", "Springfield"))
        .and(query_param("countrycode", "us"))
        .and(query_param("limit", "5"))
        .and(query_param("abbrv", "1"))
        .and(query_param("no_record", "1"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {
                    "annotations": {"geohash": "dr9x"},
                    "geometry": {"lat": 39.8, "lng": -89.65},
                    "components": {"city": "Springfield", "state": "IL", "country": "US"}
                },
                {
                    "annotations": {"geohash": "dr9x"},
                    "geometry": {"lat": 39.8, "lng": -89.65},
                    "components": {"city": "Springfield"}
                },
                {
                    "annotations": {"geohash": "9yx3"},
                    "geometry": {"lat": 37.2, "lng": -93.29},
                    "components": {"city": "Springfield", "country": "US"}
                }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeocodeClient::new(fetcher(), &mock_server.uri(), Some("test-key"));
    let query = GeocodeQuery::Search("Springfield".to_string());

    let places = client.geocode(&query).await.unwrap();
    assert_eq!(places.len(), 2);
    assert_eq!(places[0].id, "dr9x");
    assert_eq!(places[0].formatted, "Springfield, IL, US");
    assert_eq!(places[1].formatted, "Springfield, US");

    // Served from cache the second time.
    let again = client.geocode(&query).await.unwrap();
    assert_eq!(places, again);
}

#[tokio::test]
async fn test_geocode_upstream_error_keeps_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .respond_with(ResponseTemplate::new(403).set_body_string("invalid key"))
        .mount(&mock_server)
        .await;

    let client = GeocodeClient::new(fetcher(), &mock_server.uri(), Some("bad"));
    let err = client
        .geocode(&GeocodeQuery::Search("Denver".to_string()))
        .await
        .unwrap_err();

    assert!(
        matches!(err, WeatherError::Fetch(FetchError::Status { status: 403, .. })),
        "unexpected error: {:?}",
        err
    );
}

#[tokio::test]
async fn test_climate_requests_local_timezone_and_sums() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .and(query_param("latitude", "39.74"))
        .and(query_param("longitude", "-104.99"))
        .and(query_param("start_date", "2022-01-01"))
        .and(query_param("end_date", "2022-01-03"))
        .and(query_param("daily", "temperature_2m_mean"))
        .and(query_param("temperature_unit", "fahrenheit"))
        .and(query_param("timezone", "America/Denver"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "latitude": 39.74,
            "longitude": -104.99,
            "daily": {
                "time": ["2022-01-01", "2022-01-02", "2022-01-03"],
                "temperature_2m_mean": [70.0, 60.0, null]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ClimateClient::new(
        fetcher(),
        &mock_server.uri(),
        date("2022-01-01"),
        date("2022-01-03"),
        Arc::new(TimezoneLookup::new()),
    );

    let summary = client
        .climate(Coordinates {
            lat: 39.74,
            lng: -104.99,
        })
        .await
        .unwrap();

    assert_eq!(summary.cdd65, 5);
    assert_eq!(summary.hdd65, 5);
    assert_eq!(summary.stats.len(), 3);
    assert_eq!(summary.stats[2].temp, None);
}

#[tokio::test]
async fn test_climate_malformed_payload_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": false})))
        .mount(&mock_server)
        .await;

    let client = ClimateClient::new(
        fetcher(),
        &mock_server.uri(),
        date("2022-01-01"),
        date("2022-12-31"),
        Arc::new(TimezoneLookup::new()),
    );

    let err = client
        .climate(Coordinates { lat: 40.0, lng: -100.0 })
        .await
        .unwrap_err();
    assert!(matches!(err, WeatherError::Fetch(FetchError::Decode(_))));
}
