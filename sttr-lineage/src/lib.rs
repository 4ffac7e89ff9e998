//! # Stator Lineage
//!
//! Genealogy traces from a failing station back to the hairpin-forming
//! station (030 nest) each unit's hairpins came from, and aggregation of the
//! resulting per-origin counts.

pub mod origin;
pub mod queries;

// Re-export commonly used types
pub use origin::LineageAggregator;
pub use queries::{default_traces, CountingRule, FailureFilter, TraceQuery};

/// Result type for lineage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for lineage operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core error: {0}")]
    Core(#[from] sttr_core::Error),

    #[error("Invalid trace: {0}")]
    InvalidTrace(String),
}
