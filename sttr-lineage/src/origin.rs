//! Lineage aggregation

use crate::Result;
use sttr_core::{LineageRow, Table};
use tracing::debug;

/// Combines trace results into the hairpin origin table
pub struct LineageAggregator;

impl LineageAggregator {
    /// Concatenate trace tables, drop zero counts and sort by count
    /// descending, then origin station ascending.
    pub fn aggregate(tables: Vec<Table>) -> Result<Vec<LineageRow>> {
        let combined = Table::concat(tables);
        let mut rows: Vec<LineageRow> = LineageRow::from_table(&combined)?
            .into_iter()
            .filter(|row| row.count > 0)
            .collect();

        rows.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.origin_station_id.cmp(&b.origin_station_id))
        });

        debug!(rows = rows.len(), "Aggregated hairpin origin table");
        Ok(rows)
    }
}
