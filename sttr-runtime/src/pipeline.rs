//! Report pipeline
//!
//! One invocation is one linear pass:
//!
//! 1. derive the hourly window (and the shift-summary window at summary hours)
//! 2. fetch failure, override and trace queries for each window
//! 3. aggregate the pareto and lineage tables
//! 4. render the payload
//! 5. deliver it, unless this is a dry run
//!
//! Fetch errors abort the run before anything is delivered. A lineage table
//! that cannot be read degrades to an empty lineage section. Delivery
//! failures are logged and reported, never propagated.

use crate::fetcher::ResultFetcher;
use crate::metrics::{DELIVERY_TOTAL, OVERRIDE_TOTAL};
use crate::notifier::{DeliveryOutcome, Notifier};
use crate::warehouse::Warehouse;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sttr_core::{
    Aggregator, Catalog, CatalogConfig, LineageRow, OverrideOutcome, ParetoReport, Payload,
    ReportGroup, ReportWindow, WindowPolicy,
};
use sttr_lineage::{default_traces, LineageAggregator, TraceQuery};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Whether the shift-summary window fetches its own station override
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryOverride {
    #[default]
    Fetch,
    Omit,
}

impl FromStr for SummaryOverride {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fetch" => Ok(SummaryOverride::Fetch),
            "omit" => Ok(SummaryOverride::Omit),
            other => Err(Error::Configuration(format!(
                "summary override must be 'fetch' or 'omit', got '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SummaryOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryOverride::Fetch => write!(f, "fetch"),
            SummaryOverride::Omit => write!(f, "omit"),
        }
    }
}

/// Settings of one pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub policy: WindowPolicy,
    pub catalog: CatalogConfig,
    pub summary_override: SummaryOverride,
    /// Render only, never deliver
    pub dry_run: bool,
}

/// Aggregated tables of one window
#[derive(Debug, Clone)]
pub struct WindowReport {
    pub window: ReportWindow,
    pub pareto: ParetoReport,
    pub lineage: Vec<LineageRow>,
}

impl WindowReport {
    pub fn group(&self) -> ReportGroup {
        ReportGroup::new(
            &self.window,
            &self.pareto.failures,
            &self.pareto.totals,
            &self.lineage,
        )
    }
}

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub windows: Vec<WindowReport>,
    pub payload: Payload,
    pub delivery: DeliveryOutcome,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn delivered(&self) -> bool {
        matches!(self.delivery, DeliveryOutcome::Delivered { .. })
    }
}

/// Runs the report end to end
pub struct ReportPipeline {
    fetcher: ResultFetcher,
    notifier: Option<Arc<dyn Notifier>>,
    catalog: Catalog,
    traces: Vec<TraceQuery>,
    config: PipelineConfig,
}

impl ReportPipeline {
    pub fn new(
        warehouse: Arc<dyn Warehouse>,
        notifier: Option<Arc<dyn Notifier>>,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.policy.validate()?;
        Ok(Self {
            fetcher: ResultFetcher::new(warehouse),
            notifier,
            catalog: Catalog::new(config.catalog.clone()),
            traces: default_traces(),
            config,
        })
    }

    /// Replace the default trace set
    pub fn with_traces(mut self, traces: Vec<TraceQuery>) -> Self {
        self.traces = traces;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// One full pass for the hour containing `now`
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("report_run", run_id = %run_id);
        self.run_inner(run_id, now).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, now: DateTime<Utc>) -> Result<RunReport> {
        let start = Instant::now();
        let policy = &self.config.policy;

        let hourly = policy.hourly(&now)?;
        info!(
            window_start = %hourly.start_param(),
            lookback_hours = hourly.lookback_hours,
            "Starting report run"
        );

        let mut windows = vec![self.report_window(hourly, true).await?];

        match policy.shift_summary(&now)? {
            Some(summary) => {
                let fetch_override = self.config.summary_override == SummaryOverride::Fetch;
                info!(
                    window_start = %summary.start_param(),
                    summary_override = %self.config.summary_override,
                    "Shift-summary hour, adding summary window"
                );
                windows.push(self.report_window(summary, fetch_override).await?);
            }
            None => debug!("Not a shift-summary hour"),
        }

        let groups: Vec<ReportGroup> = windows.iter().map(WindowReport::group).collect();
        let payload = Payload::from_groups(&groups);

        let delivery = self.deliver(&payload).await;
        DELIVERY_TOTAL.with_label_values(&[delivery.label()]).inc();

        let elapsed = start.elapsed();
        info!(
            windows = windows.len(),
            blocks = payload.blocks.len(),
            delivery = delivery.label(),
            duration_ms = elapsed.as_millis() as u64,
            "Report run finished"
        );

        Ok(RunReport {
            run_id,
            windows,
            payload,
            delivery,
            elapsed,
        })
    }

    async fn report_window(&self, window: ReportWindow, fetch_override: bool) -> Result<WindowReport> {
        let failure_queries = self.catalog.failure_queries(&window);
        let failure_tables = self.fetcher.fetch_all(&failure_queries).await?;

        let override_table = if fetch_override {
            Some(self.fetcher.fetch(&self.catalog.override_query(&window)).await?)
        } else {
            None
        };

        let trace_queries = self
            .traces
            .iter()
            .map(|trace| trace.to_query_spec(&window, self.catalog.config()))
            .collect::<sttr_lineage::Result<Vec<_>>>()?;
        let trace_tables = self.fetcher.fetch_all(&trace_queries).await?;

        let pareto = Aggregator::aggregate(failure_tables, override_table.as_ref())?;
        let kind = window.kind.to_string();
        OVERRIDE_TOTAL
            .with_label_values(&[kind.as_str(), override_label(&pareto.override_outcome)])
            .inc();

        let lineage = match LineageAggregator::aggregate(trace_tables) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    window = %window.kind,
                    error = %e,
                    "Lineage tables unreadable, omitting hairpin origins"
                );
                Vec::new()
            }
        };

        info!(
            window = %window.kind,
            failures = pareto.failures.len(),
            stations = pareto.totals.len(),
            origins = lineage.len(),
            "Window aggregated"
        );

        Ok(WindowReport {
            window,
            pareto,
            lineage,
        })
    }

    async fn deliver(&self, payload: &Payload) -> DeliveryOutcome {
        if self.config.dry_run {
            info!("Dry run, payload not delivered");
            return DeliveryOutcome::Skipped;
        }
        let notifier = match &self.notifier {
            Some(notifier) => notifier,
            None => {
                warn!("No notifier configured, payload not delivered");
                return DeliveryOutcome::Skipped;
            }
        };

        match notifier.deliver(payload).await {
            Ok(receipt) => {
                info!(status = receipt.status, "Report delivered");
                DeliveryOutcome::Delivered { receipt }
            }
            Err(e) => {
                error!(error = %e, "Report delivery failed");
                DeliveryOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

fn override_label(outcome: &OverrideOutcome) -> &'static str {
    match outcome {
        OverrideOutcome::Applied { .. } => "applied",
        OverrideOutcome::Skipped { .. } => "skipped",
        OverrideOutcome::Omitted => "omitted",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::DeliveryReceipt;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;
    use sttr_core::model::{COUNT, PARAMETER_NAME, STATION_NAME};
    use sttr_core::{QuerySpec, Table, WindowKind};

    /// Answers the 040 force query with one row, everything else empty
    struct OneRowWarehouse {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Warehouse for OneRowWarehouse {
        async fn execute(&self, query: &QuerySpec) -> Result<Table> {
            self.calls.lock().unwrap().push(query.name.clone());
            if query.name == "station_040_force" {
                return Ok(Table::from_columns_and_rows(
                    vec![COUNT.into(), STATION_NAME.into(), PARAMETER_NAME.into()],
                    vec![vec![json!("4"), json!("040"), json!("Force process value")]],
                ));
            }
            Ok(Table::empty())
        }
    }

    struct CountingNotifier {
        delivered: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn deliver(&self, _payload: &Payload) -> Result<DeliveryReceipt> {
            if self.fail {
                return Err(Error::Delivery("status 400: invalid_payload".to_string()));
            }
            *self.delivered.lock().unwrap() += 1;
            Ok(DeliveryReceipt {
                status: 200,
                body: "ok".to_string(),
            })
        }
    }

    fn at_chicago_hour(hour: u32) -> DateTime<Utc> {
        chrono_tz::America::Chicago
            .with_ymd_and_hms(2025, 6, 2, hour, 10, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn pipeline(
        config: PipelineConfig,
        fail_delivery: bool,
    ) -> (ReportPipeline, Arc<OneRowWarehouse>, Arc<CountingNotifier>) {
        let warehouse = Arc::new(OneRowWarehouse {
            calls: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(CountingNotifier {
            delivered: Mutex::new(0),
            fail: fail_delivery,
        });
        let sink: Arc<dyn Notifier> = notifier.clone();
        let pipeline = ReportPipeline::new(warehouse.clone(), Some(sink), config).unwrap();
        (pipeline, warehouse, notifier)
    }

    #[test]
    fn test_summary_override_parsing() {
        assert_eq!("fetch".parse::<SummaryOverride>().unwrap(), SummaryOverride::Fetch);
        assert_eq!("OMIT".parse::<SummaryOverride>().unwrap(), SummaryOverride::Omit);
        assert!("maybe".parse::<SummaryOverride>().is_err());
        assert_eq!(SummaryOverride::default(), SummaryOverride::Fetch);
    }

    #[tokio::test]
    async fn test_hourly_run_delivers_once() {
        let (pipeline, warehouse, notifier) = pipeline(PipelineConfig::default(), false);

        let report = pipeline.run(at_chicago_hour(10)).await.unwrap();

        assert_eq!(report.windows.len(), 1);
        assert_eq!(report.windows[0].window.kind, WindowKind::Hourly);
        assert!(report.delivered());
        assert_eq!(*notifier.delivered.lock().unwrap(), 1);
        // 7 failure queries, 1 override, 3 traces
        assert_eq!(warehouse.calls.lock().unwrap().len(), 11);
    }

    #[tokio::test]
    async fn test_summary_hour_with_omitted_override() {
        let config = PipelineConfig {
            summary_override: SummaryOverride::Omit,
            ..PipelineConfig::default()
        };
        let (pipeline, warehouse, _) = pipeline(config, false);

        let report = pipeline.run(at_chicago_hour(15)).await.unwrap();

        assert_eq!(report.windows.len(), 2);
        assert_eq!(report.windows[1].window.kind, WindowKind::ShiftSummary);
        assert_eq!(report.windows[1].pareto.override_outcome, OverrideOutcome::Omitted);
        assert_eq!(warehouse.calls.lock().unwrap().len(), 11 + 10);
    }

    #[tokio::test]
    async fn test_dry_run_skips_delivery() {
        let config = PipelineConfig {
            dry_run: true,
            ..PipelineConfig::default()
        };
        let (pipeline, _, notifier) = pipeline(config, false);

        let report = pipeline.run(at_chicago_hour(10)).await.unwrap();

        assert_eq!(report.delivery, DeliveryOutcome::Skipped);
        assert_eq!(*notifier.delivered.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported_not_raised() {
        let (pipeline, _, _) = pipeline(PipelineConfig::default(), true);

        let report = pipeline.run(at_chicago_hour(10)).await.unwrap();

        match report.delivery {
            DeliveryOutcome::Failed { error } => assert!(error.contains("invalid_payload")),
            other => panic!("expected failed delivery, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let config = PipelineConfig {
            policy: WindowPolicy {
                summary_lookback_hours: 0,
                ..WindowPolicy::default()
            },
            ..PipelineConfig::default()
        };
        let warehouse = Arc::new(OneRowWarehouse {
            calls: Mutex::new(Vec::new()),
        });
        assert!(ReportPipeline::new(warehouse, None, config).is_err());
    }
}
