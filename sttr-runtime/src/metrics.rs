//! Prometheus metrics for report runs
//!
//! A run is a short batch process, so nothing scrapes it directly. The CLI
//! can write [`gather_text`] to a file picked up by a textfile collector.

use crate::{Error, Result};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Duration of warehouse queries in seconds
    ///
    /// Labels:
    /// - query: catalog query name
    ///
    /// Buckets: 0.1s to 300s
    pub static ref QUERY_DURATION: HistogramVec = register_histogram_vec!(
        "sttr_query_duration_seconds",
        "Duration of warehouse queries",
        &["query"],
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    )
    .expect("sttr_query_duration_seconds metric registration");

    /// Total number of warehouse queries
    ///
    /// Labels:
    /// - query: catalog query name
    /// - status: "success", "failure"
    pub static ref QUERY_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sttr_query_total",
        "Total number of warehouse queries",
        &["query", "status"]
    )
    .expect("sttr_query_total metric registration");

    /// Rows returned by warehouse queries
    pub static ref ROWS_FETCHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sttr_rows_fetched_total",
        "Rows returned by warehouse queries",
        &["query"]
    )
    .expect("sttr_rows_fetched_total metric registration");

    /// Station override outcomes
    ///
    /// Labels:
    /// - window: "hourly", "shift_summary"
    /// - outcome: "applied", "skipped", "omitted"
    pub static ref OVERRIDE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sttr_override_total",
        "Station override outcomes",
        &["window", "outcome"]
    )
    .expect("sttr_override_total metric registration");

    /// Report deliveries
    ///
    /// Labels:
    /// - outcome: "delivered", "failed", "skipped"
    pub static ref DELIVERY_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sttr_delivery_total",
        "Report deliveries by outcome",
        &["outcome"]
    )
    .expect("sttr_delivery_total metric registration");
}

/// Render every registered metric in the text exposition format
pub fn gather_text() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| Error::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer).map_err(|e| Error::Internal(format!("Metrics are not UTF-8: {}", e)))
}
