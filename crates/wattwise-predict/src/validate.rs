//! Turning a loose JSON household into a `FeatureRow`.

use serde_json::{Map, Number, Value};
use wattwise_core::ValidationErrors;

use crate::features::{FeatureRow, FeatureValue};
use crate::schema::{self, FieldKind, HOUSEHOLD_FIELDS};

const UNKNOWN_FIELD: &str = "Unknown field.";
const INVALID_INTEGER: &str = "Not a valid integer.";
const NEGATIVE: &str = "Must be greater than or equal to 0.";
const INVALID_BOOLEAN: &str = "Not a valid boolean.";
const INVALID_STRING: &str = "Not a valid string.";

const TRUTHY: &[&str] = &["t", "true", "on", "y", "yes", "1"];
const FALSY: &[&str] = &["f", "false", "off", "n", "no", "0"];

/// Validate a household body and build its feature row.
///
/// Keys set to `null` are treated as missing. Every problem is reported,
/// not just the first.
pub fn household_row(body: &Map<String, Value>) -> Result<FeatureRow, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut row = FeatureRow::empty();

    for (key, value) in body {
        if value.is_null() {
            continue;
        }
        match schema::field(key) {
            Some(spec) => match parse_value(spec.kind, value) {
                Ok(parsed) => row.set(spec.name, parsed),
                Err(message) => errors.add(key.as_str(), message),
            },
            None => errors.add(key.as_str(), UNKNOWN_FIELD),
        }
    }

    for spec in HOUSEHOLD_FIELDS {
        if spec.kind == FieldKind::Count && row.get(spec.name).is_none() {
            row.set(spec.name, FeatureValue::Int(0));
        }
    }

    if !errors.is_empty() {
        tracing::debug!("Rejected household: {}", errors);
    }
    errors.into_result(row)
}

fn parse_value(kind: FieldKind, value: &Value) -> Result<FeatureValue, String> {
    match kind {
        FieldKind::Count | FieldKind::Quantity => {
            let n = parse_integer(value).ok_or(INVALID_INTEGER)?;
            if n < 0 {
                return Err(NEGATIVE.to_string());
            }
            Ok(FeatureValue::Int(n))
        }
        FieldKind::Flag => parse_bool(value)
            .map(FeatureValue::Flag)
            .ok_or_else(|| INVALID_BOOLEAN.to_string()),
        FieldKind::Choice(codes) => {
            let code = value.as_str().ok_or(INVALID_STRING)?;
            if codes.contains(&code) {
                Ok(FeatureValue::Code(code.to_string()))
            } else {
                Err(format!("Must be one of: {}.", codes.join(", ")))
            }
        }
    }
}

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => integral(n),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
        }
        _ => None,
    }
}

fn integral(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| n.as_f64().and_then(integral_f64))
}

fn integral_f64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            if TRUTHY.contains(&s.as_str()) {
                Some(true)
            } else if FALSY.contains(&s.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}
