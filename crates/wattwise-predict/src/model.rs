//! Energy-use models.
//!
//! The server only sees `EnergyModel`; `LinearModel` is the implementation
//! loaded from the exported model file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{FeatureRow, FeatureValue};
use crate::schema;

/// Output columns, in response order.
pub const TARGETS: [&str; 5] = ["BTUEL", "BTUNG", "BTULP", "BTUFO", "BTUWD"];

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model has no coefficients for {0}")]
    MissingTarget(String),

    #[error("Model produced a non-finite value for {0}")]
    NonFinite(String),
}

/// Yearly consumption by fuel, in thousand BTU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnergyEstimate {
    #[serde(rename = "BTUEL")]
    pub electricity: i64,
    #[serde(rename = "BTUNG")]
    pub natural_gas: i64,
    #[serde(rename = "BTULP")]
    pub propane: i64,
    #[serde(rename = "BTUFO")]
    pub fuel_oil: i64,
    #[serde(rename = "BTUWD")]
    pub wood: i64,
}

impl EnergyEstimate {
    fn from_outputs(outputs: [i64; 5]) -> Self {
        let [electricity, natural_gas, propane, fuel_oil, wood] = outputs;
        Self {
            electricity,
            natural_gas,
            propane,
            fuel_oil,
            wood,
        }
    }
}

/// A trained model mapping one household to its energy estimate.
pub trait EnergyModel: Send + Sync {
    fn predict(&self, row: &FeatureRow) -> Result<EnergyEstimate, ModelError>;
}

#[derive(Debug, Clone, Deserialize)]
struct LinearTarget {
    intercept: f64,
    #[serde(default)]
    weights: HashMap<String, f64>,
}

/// Linear regression per target.
///
/// Numeric cells are multiplied by the weight under their field name.
/// Codes and flags are one-hot: the weight under `NAME=value` applies when
/// the cell holds that value. Empty cells and unknown keys contribute
/// nothing.
///
/// ```json
/// {"targets": {"BTUEL": {"intercept": 4500.0, "weights": {"SQFTEST": 2.1, "TYPEHUQ=2": 800.0}}}}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    targets: HashMap<String, LinearTarget>,
}

impl LinearModel {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json)?;
        model.check()?;
        Ok(model)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json(&json)?;
        tracing::info!("Loaded linear model from {}", path.display());
        Ok(model)
    }

    fn check(&self) -> Result<(), ModelError> {
        for target in TARGETS {
            let Some(coefficients) = self.targets.get(target) else {
                return Err(ModelError::MissingTarget(target.to_string()));
            };
            for key in coefficients.weights.keys() {
                let name = key.split_once('=').map_or(key.as_str(), |(name, _)| name);
                if schema::field(name).is_none() {
                    tracing::warn!("Model weight {} for {} matches no household field", key, target);
                }
            }
        }
        Ok(())
    }

    fn score(coefficients: &LinearTarget, row: &FeatureRow) -> f64 {
        let mut total = coefficients.intercept;
        for (spec, value) in row.iter() {
            let contribution = match value {
                None => None,
                Some(FeatureValue::Int(n)) => {
                    coefficients.weights.get(spec.name).map(|w| w * (*n as f64))
                }
                Some(value) => coefficients
                    .weights
                    .get(&format!("{}={}", spec.name, value))
                    .copied(),
            };
            total += contribution.unwrap_or(0.0);
        }
        total
    }
}

impl EnergyModel for LinearModel {
    fn predict(&self, row: &FeatureRow) -> Result<EnergyEstimate, ModelError> {
        let mut outputs = [0_i64; 5];
        for (slot, target) in outputs.iter_mut().zip(TARGETS) {
            let coefficients = self
                .targets
                .get(target)
                .ok_or_else(|| ModelError::MissingTarget(target.to_string()))?;
            let value = Self::score(coefficients, row);
            if !value.is_finite() {
                return Err(ModelError::NonFinite(target.to_string()));
            }
            *slot = value.trunc() as i64;
        }
        Ok(EnergyEstimate::from_outputs(outputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::household_row;

    const MODEL: &str = r#"{
        "targets": {
            "BTUEL": {"intercept": 1000.0, "weights": {"SQFTEST": 2.5, "AIRCOND=1": 300.0}},
            "BTUNG": {"intercept": 500.0, "weights": {"HDD65": 0.75, "FUELHEAT=1": 200.0}},
            "BTULP": {"intercept": 0.0},
            "BTUFO": {"intercept": 10.9},
            "BTUWD": {"intercept": -3.7, "weights": {"NUMFIREPLC": 50.0}}
        }
    }"#;

    fn row(value: serde_json::Value) -> FeatureRow {
        let map = value.as_object().cloned().unwrap_or_default();
        household_row(&map).unwrap()
    }

    #[test]
    fn test_intercepts_only_for_empty_household() {
        let model = LinearModel::from_json(MODEL).unwrap();
        let estimate = model.predict(&row(serde_json::json!({}))).unwrap();

        assert_eq!(estimate.electricity, 1000);
        assert_eq!(estimate.natural_gas, 500);
        assert_eq!(estimate.propane, 0);
        assert_eq!(estimate.fuel_oil, 10);
        assert_eq!(estimate.wood, -3);
    }

    #[test]
    fn test_numeric_and_one_hot_weights() {
        let model = LinearModel::from_json(MODEL).unwrap();
        let estimate = model
            .predict(&row(serde_json::json!({
                "SQFTEST": 1000,
                "AIRCOND": true,
                "HDD65": 5000,
                "FUELHEAT": "1",
                "NUMFIREPLC": 2
            })))
            .unwrap();

        assert_eq!(estimate.electricity, 1000 + 2500 + 300);
        assert_eq!(estimate.natural_gas, 500 + 3750 + 200);
        assert_eq!(estimate.wood, 96);
    }

    #[test]
    fn test_other_codes_do_not_match() {
        let model = LinearModel::from_json(MODEL).unwrap();
        let estimate = model
            .predict(&row(serde_json::json!({"FUELHEAT": "5", "AIRCOND": false})))
            .unwrap();
        assert_eq!(estimate.natural_gas, 500);
        assert_eq!(estimate.electricity, 1000);
    }

    #[test]
    fn test_missing_target_is_rejected() {
        let err = LinearModel::from_json(r#"{"targets": {"BTUEL": {"intercept": 1.0}}}"#)
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingTarget(t) if t == "BTUNG"));
    }

    #[test]
    fn test_estimate_serializes_in_target_order() {
        let estimate = EnergyEstimate::from_outputs([1, 2, 3, 4, 5]);
        let json = serde_json::to_string(&estimate).unwrap();
        assert_eq!(
            json,
            r#"{"BTUEL":1,"BTUNG":2,"BTULP":3,"BTUFO":4,"BTUWD":5}"#
        );
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LinearModel::from_path(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
