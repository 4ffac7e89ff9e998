//! Shared test utilities for the stator report crates
//!
//! This crate provides:
//! - **Fixtures**: canned warehouse tables for every catalog and trace query
//! - **Builders**: a fluent [`TableBuilder`] for warehouse-shaped tables
//! - **Mocks**: in-process warehouse and notifier, plus HTTP mocks of the
//!   Databricks and Slack endpoints
//! - **Assertions**: ordering and zero-count checks on report tables
//! - **Logs**: in-memory capture of emitted warnings
//!
//! # Example
//!
//! ```ignore
//! use sttr_tests::{fixtures, mocks::{MockWarehouse, RecordingNotifier}};
//!
//! #[tokio::test]
//! async fn test_run() {
//!     let warehouse = fixtures::scenario_warehouse();
//!     let notifier = RecordingNotifier::new();
//!     // build a ReportPipeline and run it at fixtures::chicago(10)
//! }
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod logs;
pub mod mocks;

// Re-export commonly used items
pub use builders::TableBuilder;
pub use logs::{capture_warnings, CapturedLogs};
pub use mocks::{MockDatabricksServer, MockSlackServer, MockWarehouse, RecordingNotifier};
