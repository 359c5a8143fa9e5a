//! Household characteristics accepted by the predictor.
//!
//! `HOUSEHOLD_FIELDS` is the single source of truth: validation walks it to
//! check input and the feature row is built in its order.

/// How a field is typed, validated and defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-negative count, 0 when missing.
    Count,
    /// Non-negative measurement, left empty when missing.
    Quantity,
    /// Survey code from a fixed list.
    Choice(&'static [&'static str]),
    /// Yes/no answer.
    Flag,
}

impl FieldKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Count | Self::Quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn count(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Count,
    }
}

const fn quantity(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Quantity,
    }
}

const fn choice(name: &'static str, codes: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Choice(codes),
    }
}

const fn flag(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Flag,
    }
}

const ONE_TO_THREE: &[&str] = &["1", "2", "3"];
const ONE_TO_FOUR: &[&str] = &["1", "2", "3", "4"];
const ONE_TO_FIVE: &[&str] = &["1", "2", "3", "4", "5"];
const ONE_OR_TWO: &[&str] = &["1", "2"];
const NONE_ONE_TWO: &[&str] = &["0", "1", "2"];
const COOKING_FUEL: &[&str] = &["1", "2", "5"];
const CONTROL: &[&str] = &["1", "2", "3", "4", "5", "99"];
const HEAT_FUEL: &[&str] = &["1", "2", "3", "5", "7", "99"];
const WATER_FUEL: &[&str] = &["1", "2", "3", "5", "7", "8", "99"];

/// Every accepted field, in feature-row order.
pub const HOUSEHOLD_FIELDS: &[FieldSpec] = &[
    quantity("HDD65"),
    quantity("CDD65"),
    // Structure
    choice("TYPEHUQ", ONE_TO_FIVE),
    flag("CELLAR"),
    flag("BASEFIN"),
    flag("ATTIC"),
    flag("ATTICFIN"),
    choice("STORIES", ONE_TO_FIVE),
    choice("SIZEOFGARAGE", ONE_TO_THREE),
    choice(
        "YEARMADERANGE",
        &["1", "2", "3", "4", "5", "6", "7", "8", "9"],
    ),
    count("BEDROOMS"),
    count("NCOMBATH"),
    count("NHAFBATH"),
    choice("WALLTYPE", &["1", "2", "3", "4", "5", "6", "7", "99"]),
    choice("ROOFTYPE", &["1", "2", "3", "4", "5", "6", "99"]),
    flag("HIGHCEIL"),
    choice("TYPEGLASS", ONE_TO_THREE),
    flag("TREESHAD"),
    choice("ADQINSUL", ONE_TO_FOUR),
    choice("FUELPOOL", &["0", "1", "2", "3", "5", "99"]),
    choice("FUELTUB", &["1", "2", "3", "5", "99"]),
    // Kitchen
    count("NUMFRIG"),
    choice("TYPERFR1", ONE_TO_FIVE),
    flag("ICE"),
    choice("TYPERFR2", ONE_TO_FIVE),
    choice("LOCRFRI2", &["1", "2", "3", "4", "99"]),
    flag("WINECHILL"),
    count("NUMFREEZ"),
    choice("UPRTFRZR", ONE_OR_TWO),
    choice("RANGEFUEL", &["1", "2", "5", "13"]),
    count("RCOOKUSE"),
    count("ROVENUSE"),
    choice("COOKTOPFUEL", COOKING_FUEL),
    count("COOKTOPUSE"),
    choice("OVENFUEL", COOKING_FUEL),
    count("OVENUSE"),
    count("MICRO"),
    count("AMTMICRO"),
    choice("OUTGRILLFUEL", &["1", "2", "23"]),
    flag("DISHWASH"),
    count("DWASHUSE"),
    choice("DWCYCLE", &["1", "2", "3", "4", "5", "6"]),
    // Laundry
    flag("CWASHER"),
    choice("TOPFRONT", ONE_OR_TWO),
    count("WASHLOAD"),
    choice("WASHTEMP", ONE_TO_THREE),
    flag("DRYER"),
    choice("DRYRFUEL", COOKING_FUEL),
    count("DRYRUSE"),
    // Electronics
    count("TVCOLOR"),
    count("PLAYSTA"),
    count("DESKTOP"),
    count("NUMLAPTOP"),
    count("NUMTABLET"),
    count("NUMSMPHONE"),
    // Heating
    flag("HEATHOME"),
    flag("HEATAPT"),
    choice(
        "EQUIPM",
        &["2", "3", "4", "5", "7", "8", "10", "13", "99"],
    ),
    choice("FUELHEAT", HEAT_FUEL),
    choice("EQUIPAUXTYPE", &["0", "5", "8", "9", "10", "13", "99"]),
    flag("EQUIPAUX"),
    choice("FUELAUX", HEAT_FUEL),
    count("NUMPORTEL"),
    count("NUMFIREPLC"),
    flag("BASEHEAT"),
    flag("ATTCHEAT"),
    flag("GARGHEAT"),
    choice("HUMIDTYPE", NONE_ONE_TWO),
    count("NUMPORTHUM"),
    // Cooling
    flag("AIRCOND"),
    flag("COOLAPT"),
    choice("ACEQUIPM_PUB", &["1", "3", "4", "5", "6"]),
    choice("ACEQUIPAUXTYPE_PUB", &["0", "1", "3", "4", "5", "6"]),
    count("NUMWWAC"),
    count("NUMPORTAC"),
    count("NUMCFAN"),
    count("NUMFLOORFAN"),
    choice("DEHUMTYPE", NONE_ONE_TWO),
    count("NUMPORTDEHUM"),
    // Thermostat
    choice("TYPETHERM", &["0", "1", "2", "3"]),
    choice("HEATCNTL", CONTROL),
    quantity("TEMPHOME"),
    choice("COOLCNTL", CONTROL),
    quantity("TEMPHOMEAC"),
    // Water heating
    flag("H2OAPT"),
    choice("WHEATSIZ", ONE_TO_FOUR),
    choice("FUELH2O", WATER_FUEL),
    flag("MORETHAN1H2O"),
    choice("FUELH2O2", WATER_FUEL),
    flag("EVCHRGHOME"),
    // Household
    quantity("NHSLDMEM"),
    quantity("SQFTEST"),
];

/// Look up a field by its exact (upper case) name.
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    HOUSEHOLD_FIELDS.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_are_unique() {
        let names: HashSet<_> = HOUSEHOLD_FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), HOUSEHOLD_FIELDS.len());
    }

    #[test]
    fn test_quantities_are_the_measured_fields() {
        let quantities: Vec<_> = HOUSEHOLD_FIELDS
            .iter()
            .filter(|f| f.kind == FieldKind::Quantity)
            .map(|f| f.name)
            .collect();
        assert_eq!(
            quantities,
            ["HDD65", "CDD65", "TEMPHOME", "TEMPHOMEAC", "NHSLDMEM", "SQFTEST"]
        );
    }

    #[test]
    fn test_field_lookup() {
        assert_eq!(field("SQFTEST").map(|f| f.kind), Some(FieldKind::Quantity));
        assert!(matches!(
            field("FUELHEAT").map(|f| f.kind),
            Some(FieldKind::Choice(codes)) if codes.contains(&"99")
        ));
        assert!(field("sqftest").is_none());
    }

    #[test]
    fn test_order_starts_with_climate() {
        assert_eq!(HOUSEHOLD_FIELDS[0].name, "HDD65");
        assert_eq!(HOUSEHOLD_FIELDS[1].name, "CDD65");
        assert_eq!(HOUSEHOLD_FIELDS.last().map(|f| f.name), Some("SQFTEST"));
    }
}
