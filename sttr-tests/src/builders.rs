//! Builders for warehouse-shaped tables
//!
//! Cells are written the way the warehouse returns them: counts and ids as
//! strings, missing values as null.

use serde_json::Value;
use sttr_core::model::{ALARM_DESCRIPTION, COUNT, HAIRPIN_ORIGIN, PARAMETER_NAME, STATION_NAME};
use sttr_core::Table;

/// Builder for [`Table`] values
#[derive(Debug, Clone)]
pub struct TableBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TableBuilder {
    /// Start a table with the given columns
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// `COUNT, STATION_NAME, PARAMETER_NAME`
    pub fn parameters() -> Self {
        Self::new(&[COUNT, STATION_NAME, PARAMETER_NAME])
    }

    /// `COUNT, STATION_NAME, ALARM_DESCRIPTION`
    pub fn alarms() -> Self {
        Self::new(&[COUNT, STATION_NAME, ALARM_DESCRIPTION])
    }

    /// `COUNT, STATION_NAME`
    pub fn unique_serials() -> Self {
        Self::new(&[COUNT, STATION_NAME])
    }

    /// `COUNT, STATION_NAME, STTR_030_HAIRPIN_ORIGIN`
    pub fn origins() -> Self {
        Self::new(&[COUNT, STATION_NAME, HAIRPIN_ORIGIN])
    }

    /// Append a raw row
    pub fn row(mut self, cells: Vec<Value>) -> Self {
        self.rows.push(cells);
        self
    }

    /// Append `(count, station, label)`
    pub fn failure(self, count: u64, station: &str, label: &str) -> Self {
        self.row(vec![
            Value::String(count.to_string()),
            Value::String(station.to_string()),
            Value::String(label.to_string()),
        ])
    }

    /// Append `(count, station)`
    pub fn total(self, station: &str, count: u64) -> Self {
        self.row(vec![
            Value::String(count.to_string()),
            Value::String(station.to_string()),
        ])
    }

    /// Append `(count, station, origin)`
    pub fn origin(self, count: u64, station: &str, origin: &str) -> Self {
        self.failure(count, station, origin)
    }

    pub fn build(self) -> Table {
        Table::from_columns_and_rows(self.columns, self.rows)
    }
}
