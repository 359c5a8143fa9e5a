use std::net::SocketAddr;

use axum::extract::rejection::QueryRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::Json;
use wattwise_weather::Place;

use super::params::LocationParams;
use crate::error::ApiError;
use crate::limits;
use crate::state::AppState;

/// `GET /api/geocode/?search=..` or `?lat=..&lng=..`
pub async fn geocode(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> Result<Json<Vec<Place>>, ApiError> {
    let Query(params) = params?;
    let query = params.geocode_query()?;
    let request = state.geocoder.request(&query);

    limits::gate(&state, &request, connect_info.map(|ConnectInfo(addr)| addr)).await?;

    let places = state.geocoder.lookup(&request).await?;
    Ok(Json(places))
}
