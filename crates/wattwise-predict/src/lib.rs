//! Household energy-use prediction for WattWise

pub mod features;
pub mod model;
pub mod schema;
pub mod validate;

pub use features::{FeatureRow, FeatureValue};
pub use model::{EnergyEstimate, EnergyModel, LinearModel, ModelError, TARGETS};
pub use schema::{FieldKind, FieldSpec, HOUSEHOLD_FIELDS};
pub use validate::household_row;
