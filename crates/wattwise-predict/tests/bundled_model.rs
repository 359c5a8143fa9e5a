//! Checks against the model file shipped at the repository root.

use std::path::PathBuf;

use wattwise_predict::{household_row, EnergyModel, LinearModel};

fn bundled_model() -> LinearModel {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../model.json");
    LinearModel::from_path(path).unwrap()
}

#[test]
fn test_bundled_model_loads_and_predicts_empty_household() {
    let model = bundled_model();
    let row = household_row(&serde_json::Map::new()).unwrap();
    let estimate = model.predict(&row).unwrap();

    let json = serde_json::to_value(estimate).unwrap();
    let fields = json.as_object().unwrap();
    assert_eq!(fields.len(), 5);
    for key in ["BTUEL", "BTUNG", "BTULP", "BTUFO", "BTUWD"] {
        assert!(fields[key].is_i64(), "{} is not an integer", key);
    }
}

#[test]
fn test_gas_heated_home_uses_more_gas_than_electric_heated() {
    let model = bundled_model();

    let gas: serde_json::Value = serde_json::json!({
        "HDD65": 6000, "SQFTEST": 2000, "FUELHEAT": "1", "HEATHOME": true
    });
    let electric: serde_json::Value = serde_json::json!({
        "HDD65": 6000, "SQFTEST": 2000, "FUELHEAT": "5", "HEATHOME": true
    });

    let gas = model
        .predict(&household_row(gas.as_object().unwrap()).unwrap())
        .unwrap();
    let electric = model
        .predict(&household_row(electric.as_object().unwrap()).unwrap())
        .unwrap();

    assert!(gas.natural_gas > electric.natural_gas);
    assert!(electric.electricity > gas.electricity);
}
