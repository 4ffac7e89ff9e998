//! Warehouse connection settings

use crate::{required, Error, Result};
use std::time::Duration;

/// Connection settings for a Databricks SQL warehouse
#[derive(Clone)]
pub struct DatabricksConfig {
    /// Workspace host, e.g. `adb-123.4.azuredatabricks.net`
    pub host: String,
    /// Warehouse endpoint path, e.g. `/sql/1.0/warehouses/abc123`
    pub http_path: String,
    pub token: String,
    /// Server-side wait before a statement is returned as pending
    pub wait_timeout: String,
    /// Delay between polls of a pending statement
    pub poll_interval: Duration,
}

impl std::fmt::Debug for DatabricksConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabricksConfig")
            .field("host", &self.host)
            .field("http_path", &self.http_path)
            .field("token", &"<redacted>")
            .field("wait_timeout", &self.wait_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl DatabricksConfig {
    /// Build from optional sources; a missing value names its variable
    pub fn new(
        host: Option<String>,
        http_path: Option<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let cfg = Self {
            host: required(host, "DATABRICKS_SERVER_HOSTNAME")?,
            http_path: required(http_path, "DATABRICKS_HTTP_PATH")?,
            token: required(token, "DATABRICKS_ACCESS_TOKEN")?,
            wait_timeout: "30s".to_string(),
            poll_interval: Duration::from_secs(2),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.warehouse_id()?;
        Ok(())
    }

    /// Warehouse id: last segment of the HTTP path
    pub fn warehouse_id(&self) -> Result<&str> {
        self.http_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "cannot derive warehouse id from http path '{}'",
                    self.http_path
                ))
            })
    }

    /// Scheme and host, without trailing slash
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("https://") || host.starts_with("http://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }
}
