//! Run command

use crate::config::Settings;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use sttr_cloud::{DatabricksConfig, DatabricksWarehouse, SlackWebhookNotifier};
use sttr_runtime::{
    metrics, DeliveryOutcome, Notifier, ReportPipeline, RunReport, UnconfiguredNotifier,
};

pub async fn execute(
    settings: &Settings,
    dry_run: bool,
    at: Option<&str>,
    metrics_file: Option<&Path>,
) -> Result<RunReport> {
    let now = super::resolve_now(at)?;
    let config = settings.pipeline_config(dry_run)?;
    let client = sttr_cloud::http_client()?;

    let warehouse = DatabricksWarehouse::new(
        DatabricksConfig::new(
            settings.warehouse_host.clone(),
            settings.warehouse_http_path.clone(),
            settings.warehouse_token.clone(),
        )?,
        client.clone(),
    );

    let notifier = webhook_notifier(settings, dry_run, client);

    let pipeline = ReportPipeline::new(Arc::new(warehouse), notifier, config)?;
    let report = pipeline.run(now).await?;

    if dry_run {
        println!("{}", report.payload.to_json_pretty()?);
    }

    if let DeliveryOutcome::Failed { error } = &report.delivery {
        tracing::warn!(run_id = %report.run_id, error = %error, "Run finished without delivery");
    }

    if let Some(path) = metrics_file {
        std::fs::write(path, metrics::gather_text()?)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Metrics written");
    }

    Ok(report)
}

/// The webhook notifier, or none in a dry run.
///
/// A missing or invalid webhook URL does not stop the run; it surfaces as a
/// failed delivery once the payload is ready.
fn webhook_notifier(
    settings: &Settings,
    dry_run: bool,
    client: reqwest::Client,
) -> Option<Arc<dyn Notifier>> {
    if dry_run {
        return None;
    }
    match SlackWebhookNotifier::new(settings.webhook_url(), client) {
        Ok(notifier) => Some(Arc::new(notifier)),
        Err(e) => {
            tracing::warn!(error = %e, "Webhook not configured, delivery will fail");
            let reason = match e {
                sttr_cloud::Error::Configuration(reason) => reason,
                other => other.to_string(),
            };
            Some(Arc::new(UnconfiguredNotifier::new(reason)))
        }
    }
}
