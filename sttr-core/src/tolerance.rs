//! Tolerance bands for measured station parameters
//!
//! A band says a measured value must lie within `[min, max]` to count as
//! good. Values strictly outside the band are failures; values exactly on a
//! boundary are not. Bands are kept as data and rendered into SQL predicates
//! by the catalog, so changing a limit never means editing query text.

use std::fmt::Write as _;

/// Warehouse column holding the measured value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueColumn {
    /// Raw value as recorded by the station
    ParameterValueRaw,
    /// Numeric projection of the recorded value
    ParameterValueNum,
}

impl ValueColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            ValueColumn::ParameterValueRaw => "parameter_value_raw",
            ValueColumn::ParameterValueNum => "parameter_value_num",
        }
    }
}

/// Warehouse column identifying the work location inside a station
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkLocationColumn {
    /// Numeric `work_location_id`
    Id,
    /// Text `work_location_name`
    Name,
}

impl WorkLocationColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            WorkLocationColumn::Id => "work_location_id",
            WorkLocationColumn::Name => "work_location_name",
        }
    }

    fn literal(&self, location: &str) -> String {
        match self {
            WorkLocationColumn::Id if location.chars().all(|c| c.is_ascii_digit()) => {
                location.to_string()
            }
            _ => sql_quote(location),
        }
    }
}

/// Accepted range for one named parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceBand {
    /// Parameter name as recorded by the station
    pub parameter: &'static str,
    /// Lowest good value (inclusive)
    pub min: f64,
    /// Highest good value (inclusive)
    pub max: f64,
    /// Work locations the band applies to; empty means every location
    pub work_locations: &'static [&'static str],
}

impl ToleranceBand {
    pub const fn new(parameter: &'static str, min: f64, max: f64) -> Self {
        Self {
            parameter,
            min,
            max,
            work_locations: &[],
        }
    }

    pub const fn at(self, work_locations: &'static [&'static str]) -> Self {
        Self {
            parameter: self.parameter,
            min: self.min,
            max: self.max,
            work_locations,
        }
    }

    /// True when `value` lies strictly outside the band
    pub fn is_failure(&self, value: f64) -> bool {
        value < self.min || value > self.max
    }

    /// True when the band covers the given work location
    pub fn applies_to(&self, work_location: &str) -> bool {
        self.work_locations.is_empty() || self.work_locations.contains(&work_location)
    }

    /// Render the band as a SQL predicate selecting failing records
    pub fn to_sql_predicate(&self, value: ValueColumn, location: WorkLocationColumn) -> String {
        let column = value.column_name();
        let mut predicate = format!(
            "(PARAMETER_NAME = {} AND ({} < {} OR {} > {})",
            sql_quote(self.parameter),
            column,
            self.min,
            column,
            self.max
        );

        if !self.work_locations.is_empty() {
            let locations: Vec<String> = self
                .work_locations
                .iter()
                .map(|wl| format!("{} = {}", location.column_name(), location.literal(wl)))
                .collect();
            let _ = write!(predicate, " AND ({})", locations.join(" OR "));
        }

        predicate.push(')');
        predicate
    }
}

/// Find the band for a parameter
pub fn find_band<'a>(bands: &'a [ToleranceBand], parameter: &str) -> Option<&'a ToleranceBand> {
    bands.iter().find(|band| band.parameter == parameter)
}

/// OR together the predicates of a band table
pub fn bands_predicate(
    bands: &[ToleranceBand],
    value: ValueColumn,
    location: WorkLocationColumn,
) -> String {
    let predicates: Vec<String> = bands
        .iter()
        .map(|band| band.to_sql_predicate(value, location))
        .collect();
    format!("(\n        {}\n    )", predicates.join(" OR\n        "))
}

/// Quote a string literal for SQL by doubling single quotes
pub fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Hairpin pin vision limits at station 090
pub const VISION_BANDS: &[ToleranceBand] = &[
    ToleranceBand::new("Value Height Pin X", 39.0, 47.0),
    ToleranceBand::new("Value Pixle Area Pin X", 5000.0, 12000.0),
    ToleranceBand::new("Value Blob X Feret Diameters Pin X", 2.6, 3.9),
    ToleranceBand::new("Value Blob Y Feret Diameters Pin X", 1.2, 3.0),
    ToleranceBand::new("Value Angle 1 Pin X", -45.0, 45.0),
    ToleranceBand::new("Value Angle 2 Pin X", -45.0, 45.0),
    ToleranceBand::new("Value Level Difference", 0.0, 0.6),
    ToleranceBand::new("Value Pin 1 edge to stack edge", 0.0, 100000.0),
    ToleranceBand::new("Value Pin 5 edge to stack edge", 0.0, 100000.0),
];

const WL_01: &[&str] = &["01"];
const WL_02: &[&str] = &["02"];
const WL_BOTH: &[&str] = &["01", "02"];

/// End-of-line electrical test limits (stations 180 and 210)
pub const END_OF_LINE_BANDS: &[ToleranceBand] = &[
    ToleranceBand::new("AmbientTemperature Value", 0.0, 50.0).at(WL_BOTH),
    ToleranceBand::new("Area Waveform UV Value", -3.0, 3.0).at(WL_02),
    ToleranceBand::new("Area Waveform VW Value", -3.0, 3.0).at(WL_02),
    ToleranceBand::new("Area Waveform WU Value", -3.0, 3.0).at(WL_02),
    ToleranceBand::new("Humidity Value", 0.0, 100.0).at(WL_02),
    ToleranceBand::new("InbalanceOfAllPhasesU Value", 0.0, 1.5).at(WL_01),
    ToleranceBand::new("Insulation Resistance UVW to GND Value", 200.0, 10000.0).at(WL_01),
    ToleranceBand::new("Insulation Voltage UVW to GND Value", 450.0, 550.0).at(WL_01),
    ToleranceBand::new("PartTemperature Value", 0.0, 100.0).at(WL_01),
    ToleranceBand::new("Pdiv HvAc Value", 800.0, 10000.0).at(WL_01),
    ToleranceBand::new("Pdiv UV Value", 1400.0, 10000.0).at(WL_02),
    ToleranceBand::new("Pdiv VW Value", 1400.0, 10000.0).at(WL_02),
    ToleranceBand::new("Pdiv WU Value", 1400.0, 10000.0).at(WL_02),
    ToleranceBand::new("PhaseResistance between UV Value", 10.637, 11.523).at(WL_01),
    ToleranceBand::new("PhaseResistance between VW Value", 10.637, 11.523).at(WL_01),
    ToleranceBand::new("PhaseResistance between WU Value", 10.637, 11.523).at(WL_01),
    ToleranceBand::new("Withstand Current UVW to GND Value", 0.0, 15.0).at(WL_01),
    ToleranceBand::new("Withstand Voltage UVW to GND Value", 1850.0, 1950.0).at(WL_02),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_values_are_not_failures() {
        let band = ToleranceBand::new("Value Height Pin X", 39.0, 47.0);

        assert!(!band.is_failure(39.0));
        assert!(!band.is_failure(47.0));
        assert!(!band.is_failure(43.5));
        assert!(band.is_failure(38.999));
        assert!(band.is_failure(47.001));
    }

    #[test]
    fn test_negative_ranges() {
        let band = find_band(VISION_BANDS, "Value Angle 1 Pin X").unwrap();
        assert!(!band.is_failure(-45.0));
        assert!(band.is_failure(-45.5));
    }

    #[test]
    fn test_applies_to_work_location() {
        let band = find_band(END_OF_LINE_BANDS, "Humidity Value").unwrap();
        assert!(band.applies_to("02"));
        assert!(!band.applies_to("01"));

        let vision = find_band(VISION_BANDS, "Value Level Difference").unwrap();
        assert!(vision.applies_to("anything"));
    }

    #[test]
    fn test_predicate_without_work_locations() {
        let band = ToleranceBand::new("Value Level Difference", 0.0, 0.6);
        assert_eq!(
            band.to_sql_predicate(ValueColumn::ParameterValueRaw, WorkLocationColumn::Id),
            "(PARAMETER_NAME = 'Value Level Difference' AND \
             (parameter_value_raw < 0 OR parameter_value_raw > 0.6))"
        );
    }

    #[test]
    fn test_predicate_with_numeric_work_locations() {
        let band = ToleranceBand::new("AmbientTemperature Value", 0.0, 50.0).at(WL_BOTH);
        assert_eq!(
            band.to_sql_predicate(ValueColumn::ParameterValueNum, WorkLocationColumn::Id),
            "(PARAMETER_NAME = 'AmbientTemperature Value' AND \
             (parameter_value_num < 0 OR parameter_value_num > 50) AND \
             (work_location_id = 01 OR work_location_id = 02))"
        );
    }

    #[test]
    fn test_predicate_with_named_work_locations() {
        let band = ToleranceBand::new("Pdiv UV Value", 1400.0, 10000.0).at(WL_02);
        let sql = band.to_sql_predicate(ValueColumn::ParameterValueNum, WorkLocationColumn::Name);
        assert!(sql.ends_with("AND (work_location_name = '02'))"));
    }

    #[test]
    fn test_sql_quote_escapes() {
        assert_eq!(sql_quote("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn test_band_tables_are_well_formed() {
        for band in VISION_BANDS.iter().chain(END_OF_LINE_BANDS) {
            assert!(band.min <= band.max, "{} has inverted limits", band.parameter);
        }
        assert_eq!(VISION_BANDS.len(), 9);
        assert_eq!(END_OF_LINE_BANDS.len(), 18);
    }
}
