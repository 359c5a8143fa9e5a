use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use wattwise_weather::ClimateSummary;

use super::params::LocationParams;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/climate/?lat=..&lng=..`
pub async fn climate(
    State(state): State<AppState>,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> Result<Json<ClimateSummary>, ApiError> {
    let Query(params) = params?;
    let coords = params.coordinates()?;
    let summary = state.climate.climate(coords).await?;
    tracing::debug!(
        hdd65 = summary.hdd65,
        cdd65 = summary.cdd65,
        days = summary.stats.len(),
        "Climate summary ready"
    );
    Ok(Json(summary))
}
