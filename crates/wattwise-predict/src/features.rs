use std::fmt;

use crate::schema::{FieldSpec, HOUSEHOLD_FIELDS};

/// A validated cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Code(String),
    Flag(bool),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Code(code) => f.write_str(code),
            Self::Flag(true) => f.write_str("1"),
            Self::Flag(false) => f.write_str("0"),
        }
    }
}

/// One household as model input: a cell per schema field, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    cells: Vec<Option<FeatureValue>>,
}

impl FeatureRow {
    /// A row with every cell empty.
    pub fn empty() -> Self {
        Self {
            cells: vec![None; HOUSEHOLD_FIELDS.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        let index = HOUSEHOLD_FIELDS.iter().position(|f| f.name == name)?;
        self.cells.get(index)?.as_ref()
    }

    pub(crate) fn set(&mut self, name: &str, value: FeatureValue) {
        let index = HOUSEHOLD_FIELDS.iter().position(|f| f.name == name);
        if let Some(cell) = index.and_then(|i| self.cells.get_mut(i)) {
            *cell = Some(value);
        }
    }

    /// Cells paired with their field, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, Option<&FeatureValue>)> + '_ {
        HOUSEHOLD_FIELDS
            .iter()
            .zip(self.cells.iter().map(Option::as_ref))
    }
}

impl Default for FeatureRow {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_row_has_a_cell_per_field() {
        let row = FeatureRow::empty();
        assert_eq!(row.len(), HOUSEHOLD_FIELDS.len());
        assert!(row.is_empty());
        assert!(row.get("BEDROOMS").is_none());
    }

    #[test]
    fn test_set_and_get() {
        let mut row = FeatureRow::empty();
        row.set("TYPEHUQ", FeatureValue::Code("2".to_string()));
        row.set("NOT_A_FIELD", FeatureValue::Int(1));

        assert_eq!(row.get("TYPEHUQ"), Some(&FeatureValue::Code("2".to_string())));
        assert_eq!(row.iter().filter(|(_, v)| v.is_some()).count(), 1);
    }

    #[test]
    fn test_flag_display_is_numeric() {
        assert_eq!(FeatureValue::Flag(true).to_string(), "1");
        assert_eq!(FeatureValue::Flag(false).to_string(), "0");
        assert_eq!(FeatureValue::Int(42).to_string(), "42");
    }
}
