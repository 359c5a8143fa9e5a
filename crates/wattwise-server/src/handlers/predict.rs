use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{Map, Value};
use wattwise_core::ValidationErrors;
use wattwise_predict::{household_row, EnergyEstimate};

use crate::error::ApiError;
use crate::state::AppState;

/// `PUT /api/predict/` with a household object; an empty body is an empty household.
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EnergyEstimate>, ApiError> {
    let body = body?;
    let household = parse_body(&body)?;
    let row = household_row(&household)?;
    let estimate = state.model.predict(&row)?;
    Ok(Json(estimate))
}

fn parse_body(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => {
            let mut errors = ValidationErrors::new();
            errors.add("_schema", "Invalid input type.");
            Err(errors.into())
        }
        Err(e) => Err(ApiError::BadRequest(format!(
            "Failed to decode JSON object: {}",
            e
        ))),
    }
}
