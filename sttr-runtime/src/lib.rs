//! # Stator Runtime
//!
//! Execution runtime for the stator line report: the warehouse and notifier
//! seams, sequential result fetching, the report pipeline and run metrics.

pub mod fetcher;
pub mod metrics;
pub mod notifier;
pub mod pipeline;
pub mod warehouse;

// Re-export commonly used types
pub use fetcher::ResultFetcher;
pub use notifier::{DeliveryOutcome, DeliveryReceipt, Notifier, UnconfiguredNotifier};
pub use pipeline::{PipelineConfig, ReportPipeline, RunReport, SummaryOverride, WindowReport};
pub use warehouse::Warehouse;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for runtime operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Warehouse error: {0}")]
    Warehouse(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Core error: {0}")]
    Core(#[from] sttr_core::Error),

    #[error("Lineage error: {0}")]
    Lineage(#[from] sttr_lineage::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
