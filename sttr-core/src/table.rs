//! Uniform tabular shape for warehouse results
//!
//! Every query result is materialized as a [`Table`]: an ordered list of
//! column names plus an ordered list of rows, each row mapping an uppercase
//! column name to a JSON cell value.
//!
//! # Null Handling
//!
//! Rows are padded so that every row carries every column. Missing cells are
//! normalized to `Value::Null`, which keeps `concat` well defined when the
//! inputs disagree on their column sets (e.g. `PARAMETER_NAME` vs
//! `ALARM_DESCRIPTION`).

use crate::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;

/// One result row: column name -> cell value
pub type Row = IndexMap<String, Value>;

/// Ordered rows with uppercase column names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create a table with no columns and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from a column list and positional row data.
    ///
    /// Column names are uppercased. Short rows are padded with `Null`,
    /// surplus cells are ignored.
    pub fn from_columns_and_rows(columns: Vec<String>, data: Vec<Vec<Value>>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(|c| c.to_uppercase()).collect();

        let rows = data
            .into_iter()
            .map(|cells| {
                let mut cells = cells.into_iter();
                columns
                    .iter()
                    .map(|name| (name.clone(), cells.next().unwrap_or(Value::Null)))
                    .collect::<Row>()
            })
            .collect();

        Self { columns, rows }
    }

    /// Union tables top to bottom, preserving row order.
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Self {
        let tables: Vec<Table> = tables.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let rows = tables
            .into_iter()
            .flat_map(|table| table.rows)
            .map(|row| pad_row(row, &columns))
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check if a column exists (case-insensitive)
    pub fn has_column(&self, name: &str) -> bool {
        let name = name.to_uppercase();
        self.columns.iter().any(|c| *c == name)
    }

    /// Check that every named column exists
    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.has_column(name))
    }

    /// Fail with [`Error::MissingColumn`] for the first absent column
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(Error::MissingColumn(missing.to_uppercase())),
            None => Ok(()),
        }
    }

    /// Raw cell access
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column.to_uppercase().as_str()))
    }

    /// Cell as text. Null and blank strings are `None`; numbers are stringified.
    pub fn cell_str(&self, row: usize, column: &str) -> Option<String> {
        match self.cell(row, column)? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Cell as a non-negative count.
    ///
    /// The warehouse returns every cell as a string, so numeric strings are
    /// accepted. Null counts are coerced to 0.
    pub fn cell_u64(&self, row: usize, column: &str) -> Result<u64> {
        let invalid = |reason: String| Error::InvalidCell {
            column: column.to_uppercase(),
            row,
            reason,
        };

        match self.cell(row, column) {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    Ok(v)
                } else {
                    n.as_f64()
                        .and_then(integral_count)
                        .ok_or_else(|| invalid(format!("{} is not a count", n)))
                }
            }
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if let Ok(v) = trimmed.parse::<u64>() {
                    return Ok(v);
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(integral_count)
                    .ok_or_else(|| invalid(format!("'{}' is not a count", s)))
            }
            Some(other) => Err(invalid(format!("unexpected value {}", other))),
        }
    }
}

fn pad_row(mut row: Row, columns: &[String]) -> Row {
    let mut padded = Row::with_capacity(columns.len());
    for column in columns {
        let value = row.shift_remove(column).unwrap_or(Value::Null);
        padded.insert(column.clone(), value);
    }
    padded
}

fn integral_count(v: f64) -> Option<u64> {
    if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
        Some(v as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_columns_are_uppercased() {
        let table = Table::from_columns_and_rows(
            cols(&["count", "station_name"]),
            vec![vec![json!("5"), json!("040")]],
        );

        assert_eq!(table.columns(), &["COUNT", "STATION_NAME"]);
        assert!(table.has_column("station_name"));
        assert_eq!(table.cell_str(0, "STATION_NAME"), Some("040".to_string()));
    }

    #[test]
    fn test_short_rows_are_padded_with_null() {
        let table = Table::from_columns_and_rows(
            cols(&["COUNT", "STATION_NAME", "PARAMETER_NAME"]),
            vec![vec![json!("5")]],
        );

        assert_eq!(table.cell(0, "PARAMETER_NAME"), Some(&Value::Null));
        assert_eq!(table.cell_str(0, "PARAMETER_NAME"), None);
    }

    #[test]
    fn test_concat_unions_columns_and_preserves_order() {
        let a = Table::from_columns_and_rows(
            cols(&["COUNT", "STATION_NAME", "PARAMETER_NAME"]),
            vec![vec![json!(5), json!("040"), json!("Force process value")]],
        );
        let b = Table::from_columns_and_rows(
            cols(&["COUNT", "STATION_NAME", "ALARM_DESCRIPTION"]),
            vec![vec![json!(3), json!("070"), json!("Bad Cuts/Welding Fail")]],
        );

        let combined = Table::concat(vec![a, b]);

        assert_eq!(
            combined.columns(),
            &["COUNT", "STATION_NAME", "PARAMETER_NAME", "ALARM_DESCRIPTION"]
        );
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.cell(0, "ALARM_DESCRIPTION"), Some(&Value::Null));
        assert_eq!(combined.cell(1, "PARAMETER_NAME"), Some(&Value::Null));
        assert_eq!(combined.cell_str(1, "STATION_NAME"), Some("070".to_string()));
    }

    #[test]
    fn test_concat_of_nothing_is_empty() {
        let combined = Table::concat(Vec::new());
        assert!(combined.is_empty());
        assert!(combined.columns().is_empty());
    }

    #[test]
    fn test_cell_u64_accepts_strings_and_numbers() {
        let table = Table::from_columns_and_rows(
            cols(&["A", "B", "C", "D"]),
            vec![vec![json!("12"), json!(7), json!("3.0"), Value::Null]],
        );

        assert_eq!(table.cell_u64(0, "A").unwrap(), 12);
        assert_eq!(table.cell_u64(0, "B").unwrap(), 7);
        assert_eq!(table.cell_u64(0, "C").unwrap(), 3);
        assert_eq!(table.cell_u64(0, "D").unwrap(), 0);
    }

    #[test]
    fn test_cell_u64_rejects_negative_and_garbage() {
        let table = Table::from_columns_and_rows(
            cols(&["A", "B"]),
            vec![vec![json!("-1"), json!("many")]],
        );

        assert!(matches!(
            table.cell_u64(0, "A"),
            Err(Error::InvalidCell { .. })
        ));
        assert!(matches!(
            table.cell_u64(0, "B"),
            Err(Error::InvalidCell { .. })
        ));
    }

    #[test]
    fn test_require_columns_names_the_missing_one() {
        let table = Table::from_columns_and_rows(cols(&["COUNT"]), vec![]);

        assert_eq!(
            table.require_columns(&["COUNT", "STATION_NAME"]),
            Err(Error::MissingColumn("STATION_NAME".to_string()))
        );
        assert!(table.has_columns(&["count"]));
    }
}
