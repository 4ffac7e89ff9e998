//! Failure, station-total and lineage row types
//!
//! These are the typed views over warehouse [`Table`]s that the aggregation
//! passes work with. Nothing here outlives one pipeline run.

use crate::table::Table;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Failure count column
pub const COUNT: &str = "COUNT";
/// Station identifier column
pub const STATION_NAME: &str = "STATION_NAME";
/// Parameter label column
pub const PARAMETER_NAME: &str = "PARAMETER_NAME";
/// Alarm label column, takes precedence over `PARAMETER_NAME`
pub const ALARM_DESCRIPTION: &str = "ALARM_DESCRIPTION";
/// Origin station column of the lineage queries
pub const HAIRPIN_ORIGIN: &str = "STTR_030_HAIRPIN_ORIGIN";

/// Label given to rows that carry neither a parameter name nor an alarm
pub const UNLABELLED: &str = "(unlabelled)";

/// Failure count for one (station, label) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRow {
    pub count: u64,
    pub station_id: String,
    pub label: String,
}

impl FailureRow {
    pub fn new(count: u64, station_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            count,
            station_id: station_id.into(),
            label: label.into(),
        }
    }

    /// Read failure rows from a (possibly combined) table, coalescing labels.
    ///
    /// The label is `ALARM_DESCRIPTION` when that cell is present and
    /// non-blank, otherwise `PARAMETER_NAME`. The alarm column does not
    /// survive this conversion.
    pub fn coalesce_from(table: &Table) -> Result<Vec<FailureRow>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }
        table.require_columns(&[COUNT, STATION_NAME])?;

        (0..table.len())
            .map(|i| {
                let count = table.cell_u64(i, COUNT)?;
                let station_id = station_cell(table, i, STATION_NAME)?;
                let label = table
                    .cell_str(i, ALARM_DESCRIPTION)
                    .or_else(|| table.cell_str(i, PARAMETER_NAME))
                    .unwrap_or_else(|| UNLABELLED.to_string());

                Ok(FailureRow {
                    count,
                    station_id,
                    label,
                })
            })
            .collect()
    }
}

/// Total failures for one station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationTotal {
    pub station_id: String,
    pub count: u64,
}

impl StationTotal {
    pub fn new(station_id: impl Into<String>, count: u64) -> Self {
        Self {
            station_id: station_id.into(),
            count,
        }
    }

    /// Read `(STATION_NAME, COUNT)` pairs from a table
    pub fn from_table(table: &Table) -> Result<Vec<StationTotal>> {
        table.require_columns(&[STATION_NAME, COUNT])?;

        (0..table.len())
            .map(|i| {
                Ok(StationTotal {
                    station_id: station_cell(table, i, STATION_NAME)?,
                    count: table.cell_u64(i, COUNT)?,
                })
            })
            .collect()
    }
}

/// Failing units at a station attributed to an upstream origin station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageRow {
    pub count: u64,
    pub station_id: String,
    pub origin_station_id: String,
}

impl LineageRow {
    pub fn new(
        count: u64,
        station_id: impl Into<String>,
        origin_station_id: impl Into<String>,
    ) -> Self {
        Self {
            count,
            station_id: station_id.into(),
            origin_station_id: origin_station_id.into(),
        }
    }

    /// Read lineage rows from one trace query result
    pub fn from_table(table: &Table) -> Result<Vec<LineageRow>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }
        table.require_columns(&[COUNT, STATION_NAME, HAIRPIN_ORIGIN])?;

        (0..table.len())
            .map(|i| {
                Ok(LineageRow {
                    count: table.cell_u64(i, COUNT)?,
                    station_id: station_cell(table, i, STATION_NAME)?,
                    origin_station_id: station_cell(table, i, HAIRPIN_ORIGIN)?,
                })
            })
            .collect()
    }
}

fn station_cell(table: &Table, row: usize, column: &str) -> Result<String> {
    table.cell_str(row, column).ok_or_else(|| Error::InvalidCell {
        column: column.to_string(),
        row,
        reason: "station identifier is empty".to_string(),
    })
}
