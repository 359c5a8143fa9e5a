//! Location and climate lookups for WattWise
//!
//! Geocoding goes through OpenCage and the yearly temperature series
//! through the Open-Meteo archive. Both calls go through the shared
//! response cache.

pub mod climate;
pub mod geocode;
pub mod timezone;
pub mod types;

pub use climate::{degree_days, ClimateClient, BASE_TEMPERATURE_F};
pub use geocode::{format_components, GeocodeClient, GeocodeQuery};
pub use timezone::TimezoneLookup;
pub use types::*;
