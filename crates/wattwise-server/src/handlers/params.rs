//! Query-string validation shared by the location handlers.

use serde::Deserialize;
use wattwise_core::ValidationErrors;
use wattwise_weather::{Coordinates, GeocodeQuery};

pub const MIN_SEARCH_LEN: usize = 3;

const MISSING: &str = "Missing data for required field.";
const NOT_A_NUMBER: &str = "Not a valid number.";

/// Raw location parameters, validated by hand so every problem is reported.
#[derive(Debug, Default, Deserialize)]
pub struct LocationParams {
    pub search: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
}

fn parse_bounded(
    errors: &mut ValidationErrors,
    field: &str,
    raw: Option<&str>,
    bound: f64,
) -> Option<f64> {
    let raw = raw?;
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && (-bound..=bound).contains(&value) => Some(value),
        Ok(_) => {
            errors.add(
                field,
                format!(
                    "Must be greater than or equal to {} and less than or equal to {}.",
                    -bound, bound
                ),
            );
            None
        }
        Err(_) => {
            errors.add(field, NOT_A_NUMBER);
            None
        }
    }
}

impl LocationParams {
    /// `lat`/`lng` checked independently; each may be absent.
    fn bounded(&self, errors: &mut ValidationErrors) -> (Option<f64>, Option<f64>) {
        let lat = parse_bounded(errors, "lat", self.lat.as_deref(), 90.0);
        let lng = parse_bounded(errors, "lng", self.lng.as_deref(), 180.0);
        (lat, lng)
    }

    /// Both coordinates, required.
    pub fn coordinates(&self) -> Result<Coordinates, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let (lat, lng) = self.bounded(&mut errors);

        if self.lat.is_none() {
            errors.add("lat", MISSING);
        }
        if self.lng.is_none() {
            errors.add("lng", MISSING);
        }

        match (lat, lng) {
            (Some(lat), Some(lng)) if errors.is_empty() => Ok(Coordinates { lat, lng }),
            _ => Err(errors),
        }
    }

    /// A search term, or coordinates when no search term is given.
    pub fn geocode_query(&self) -> Result<GeocodeQuery, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let (lat, lng) = self.bounded(&mut errors);

        if let Some(search) = self.search.as_deref() {
            if search.chars().count() < MIN_SEARCH_LEN {
                errors.add(
                    "search",
                    format!("Shorter than minimum length {}.", MIN_SEARCH_LEN),
                );
            }
            return errors.into_result(GeocodeQuery::Search(search.to_string()));
        }

        match (&self.lat, &self.lng) {
            (None, None) => {
                errors.add("search", "Provide a search term or both lat and lng.");
            }
            (Some(_), None) => errors.add("lng", MISSING),
            (None, Some(_)) => errors.add("lat", MISSING),
            (Some(_), Some(_)) => {}
        }

        match (lat, lng) {
            (Some(lat), Some(lng)) if errors.is_empty() => {
                Ok(GeocodeQuery::Reverse(Coordinates { lat, lng }))
            }
            _ => Err(errors),
        }
    }
}
