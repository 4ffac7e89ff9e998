//! # Stator Core
//!
//! Core model for the stator line failure report: the uniform table shape
//! returned by the warehouse, the failure-row model, tolerance bands, the
//! query catalog, report windows, aggregation and rendering.

pub mod aggregate;
pub mod catalog;
pub mod model;
pub mod payload;
pub mod render;
pub mod table;
pub mod tolerance;
pub mod window;

// Re-export commonly used types
pub use aggregate::{Aggregator, OverrideOutcome, ParetoReport};
pub use catalog::{Catalog, CatalogConfig, QueryParam, QuerySpec};
pub use model::{FailureRow, LineageRow, StationTotal};
pub use payload::{Block, Payload, ReportGroup, Text};
pub use table::{Row, Table};
pub use tolerance::{ToleranceBand, ValueColumn, WorkLocationColumn};
pub use window::{ReportWindow, WindowKind, WindowPolicy};

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for core operations
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid cell in column {column} at row {row}: {reason}")]
    InvalidCell {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Render error: {0}")]
    Render(String),
}
