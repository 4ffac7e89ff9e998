//! CLI configuration
//!
//! Every setting is a flag with an environment fallback. Credentials stay
//! optional here; the component that needs one reports it missing.

use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use clap::Args;
use sttr_core::{CatalogConfig, WindowPolicy};
use sttr_runtime::{PipelineConfig, SummaryOverride};

/// Connection, credential and window settings
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Databricks workspace host
    #[arg(long, env = "DATABRICKS_SERVER_HOSTNAME")]
    pub warehouse_host: Option<String>,

    /// Databricks SQL warehouse HTTP path
    #[arg(long, env = "DATABRICKS_HTTP_PATH")]
    pub warehouse_http_path: Option<String>,

    /// Databricks access token
    #[arg(long, env = "DATABRICKS_ACCESS_TOKEN", hide_env_values = true)]
    pub warehouse_token: Option<String>,

    /// Slack bot token for chat.postMessage
    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    pub slack_token: Option<String>,

    /// Slack incoming webhook URL
    #[arg(long, env = "URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    #[arg(long, env = "SLACK_WEBHOOK_URL", hide = true, hide_env_values = true)]
    pub slack_webhook_url: Option<String>,

    /// Plant timezone (IANA name)
    #[arg(long, env = "STTR_TIMEZONE", default_value = "America/Chicago")]
    pub timezone: String,

    /// Lookback of the hourly window
    #[arg(long, env = "STTR_HOURLY_LOOKBACK_HOURS", default_value_t = sttr_core::window::DEFAULT_HOURLY_LOOKBACK_HOURS)]
    pub hourly_lookback_hours: i64,

    /// Lookback of the shift-summary window
    #[arg(long, env = "STTR_SUMMARY_LOOKBACK_HOURS", default_value_t = sttr_core::window::DEFAULT_SUMMARY_LOOKBACK_HOURS)]
    pub summary_lookback_hours: i64,

    /// Station override in the shift summary: fetch or omit
    #[arg(long, env = "STTR_SUMMARY_OVERRIDE", default_value = "fetch")]
    pub summary_override: String,
}

impl Settings {
    /// Webhook URL from `URL`, falling back to `SLACK_WEBHOOK_URL`
    pub fn webhook_url(&self) -> Option<String> {
        self.webhook_url
            .clone()
            .or_else(|| self.slack_webhook_url.clone())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid timezone '{}': {}", self.timezone, e))
    }

    pub fn window_policy(&self) -> Result<WindowPolicy> {
        let policy = WindowPolicy {
            timezone: self.timezone()?,
            hourly_lookback_hours: self.hourly_lookback_hours,
            summary_lookback_hours: self.summary_lookback_hours,
            ..WindowPolicy::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn pipeline_config(&self, dry_run: bool) -> Result<PipelineConfig> {
        Ok(PipelineConfig {
            policy: self.window_policy()?,
            catalog: CatalogConfig::default(),
            summary_override: self.summary_override.parse::<SummaryOverride>()?,
            dry_run,
        })
    }

    /// Log which credentials are present, never their values
    pub fn log_loaded(&self) {
        tracing::info!(
            warehouse_host = self.warehouse_host.is_some(),
            warehouse_http_path = self.warehouse_http_path.is_some(),
            warehouse_token = self.warehouse_token.is_some(),
            slack_token = self.slack_token.is_some(),
            webhook_url = self.webhook_url().is_some(),
            "Configuration loaded"
        );
    }
}
