//! Failure aggregation and the station pareto
//!
//! Combines the per-station failure tables of one window into a single
//! ranked failure list, sums it per station, and optionally replaces station
//! totals with distinct-serial counts from an override table.
//!
//! The override merge is a left merge: it can only replace a station that
//! already has a total. A malformed or empty override table never fails the
//! run; the summed totals are kept and a warning is logged.

use crate::model::{FailureRow, StationTotal, COUNT, STATION_NAME};
use crate::table::Table;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What happened to the station-total override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OverrideOutcome {
    /// Override merged; lists stations whose totals were replaced
    Applied { replaced: Vec<String> },
    /// Override table unusable, summed totals kept
    Skipped { reason: String },
    /// No override table was requested for this window
    Omitted,
}

/// Aggregated failure tables of one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoReport {
    /// Non-zero failures, descending by count
    pub failures: Vec<FailureRow>,
    /// Non-zero station totals, descending by count
    pub totals: Vec<StationTotal>,
    pub override_outcome: OverrideOutcome,
}

/// Stateless aggregation passes
pub struct Aggregator;

impl Aggregator {
    /// Union the failure tables, coalesce labels, drop zero counts and sort
    /// descending by count. Ties keep their input order.
    pub fn combine(tables: Vec<Table>) -> Result<Vec<FailureRow>> {
        let combined = Table::concat(tables);
        let mut rows: Vec<FailureRow> = FailureRow::coalesce_from(&combined)?
            .into_iter()
            .filter(|row| row.count > 0)
            .collect();

        // sort_by is stable
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(rows)
    }

    /// Sum failure counts per station, in ascending station order
    pub fn station_totals(rows: &[FailureRow]) -> Vec<StationTotal> {
        let mut sums: BTreeMap<&str, u64> = BTreeMap::new();
        for row in rows {
            *sums.entry(row.station_id.as_str()).or_insert(0) += row.count;
        }

        sums.into_iter()
            .map(|(station_id, count)| StationTotal::new(station_id, count))
            .collect()
    }

    /// Left-merge distinct-serial counts onto the station totals.
    pub fn apply_override(
        mut totals: Vec<StationTotal>,
        override_table: Option<&Table>,
    ) -> (Vec<StationTotal>, OverrideOutcome) {
        let table = match override_table {
            Some(table) => table,
            None => return (totals, OverrideOutcome::Omitted),
        };

        let skipped = |reason: String| {
            warn!(
                reason = %reason,
                "Station override unavailable, falling back to summed totals"
            );
            OverrideOutcome::Skipped { reason }
        };

        if table.is_empty() {
            let outcome = skipped("override table is empty".to_string());
            return (totals, outcome);
        }
        if !table.has_columns(&[STATION_NAME, COUNT]) {
            let outcome = skipped(format!(
                "override table lacks {} or {} (columns: {:?})",
                STATION_NAME,
                COUNT,
                table.columns()
            ));
            return (totals, outcome);
        }

        let overrides = match StationTotal::from_table(table) {
            Ok(overrides) => overrides,
            Err(e) => {
                let outcome = skipped(format!("override table unreadable: {}", e));
                return (totals, outcome);
            }
        };

        let mut replaced = Vec::new();
        for total in totals.iter_mut() {
            if let Some(o) = overrides.iter().find(|o| o.station_id == total.station_id) {
                debug!(
                    station = %total.station_id,
                    summed = total.count,
                    distinct = o.count,
                    "Replacing station total with distinct serial count"
                );
                total.count = o.count;
                replaced.push(total.station_id.clone());
            }
        }

        (totals, OverrideOutcome::Applied { replaced })
    }

    /// Full pareto pass over one window's tables
    pub fn aggregate(tables: Vec<Table>, override_table: Option<&Table>) -> Result<ParetoReport> {
        let failures = Self::combine(tables)?;
        let totals = Self::station_totals(&failures);
        let (totals, override_outcome) = Self::apply_override(totals, override_table);

        let mut totals: Vec<StationTotal> = totals.into_iter().filter(|t| t.count > 0).collect();
        totals.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(ParetoReport {
            failures,
            totals,
            override_outcome,
        })
    }
}
