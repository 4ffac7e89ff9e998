//! Fixed-width text rendering of report tables
//!
//! Every column is right-aligned to its widest cell (header included) and
//! columns are separated by a single space. The chat client displays the
//! block in a monospace font, so no other decoration is needed.

use crate::model::{
    FailureRow, LineageRow, StationTotal, COUNT, HAIRPIN_ORIGIN, PARAMETER_NAME, STATION_NAME,
};

/// A row type that can be rendered as a fixed-width table
pub trait TableRow {
    /// Column headers, in display order
    fn header() -> &'static [&'static str];

    /// Cell text, one per header column
    fn cells(&self) -> Vec<String>;
}

impl TableRow for FailureRow {
    fn header() -> &'static [&'static str] {
        &[COUNT, STATION_NAME, PARAMETER_NAME]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.count.to_string(),
            self.station_id.clone(),
            self.label.clone(),
        ]
    }
}

impl TableRow for StationTotal {
    fn header() -> &'static [&'static str] {
        &[STATION_NAME, COUNT]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.station_id.clone(), self.count.to_string()]
    }
}

impl TableRow for LineageRow {
    fn header() -> &'static [&'static str] {
        &[COUNT, STATION_NAME, HAIRPIN_ORIGIN]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.count.to_string(),
            self.station_id.clone(),
            self.origin_station_id.clone(),
        ]
    }
}

/// Render headers and rows as a fixed-width block without trailing newline.
///
/// An empty row set renders the header line only.
pub fn render_table(columns: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let header: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    std::iter::once(&header)
        .chain(rows.iter())
        .map(|cells| {
            widths
                .iter()
                .enumerate()
                .map(|(i, width)| {
                    let cell = cells.get(i).map(String::as_str).unwrap_or("");
                    format!("{:>width$}", cell, width = *width)
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render typed rows with their own headers
pub fn render_rows<R: TableRow>(rows: &[R]) -> String {
    let cells: Vec<Vec<String>> = rows.iter().map(TableRow::cells).collect();
    render_table(R::header(), &cells)
}

/// Wrap text in a triple-backtick fence for monospace display
pub fn fenced(text: &str) -> String {
    format!("```{}```", text)
}
