//! # Stator Cloud
//!
//! Adapters for the services the report talks to: the Databricks SQL
//! Statement Execution API as the [`sttr_runtime::Warehouse`], and Slack
//! (incoming webhook as the [`sttr_runtime::Notifier`], plus the chat API).

pub mod config;
pub mod databricks;
pub mod slack;

// Re-export commonly used types
pub use config::DatabricksConfig;
pub use databricks::DatabricksWarehouse;
pub use slack::{SlackChatClient, SlackWebhookNotifier};

/// Result type for cloud operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cloud operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API error: {0}")]
    Api(String),

    #[error("Query failed [{code}]: {message}")]
    Query { code: String, message: String },

    #[error("Delivery rejected with status {status}: {body}")]
    Delivery { status: u16, body: String },

    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Convert at the warehouse seam
    pub fn into_warehouse_error(self) -> sttr_runtime::Error {
        match self {
            Error::Configuration(msg) => sttr_runtime::Error::Configuration(msg),
            other => sttr_runtime::Error::Warehouse(other.to_string()),
        }
    }

    /// Convert at the notifier seam
    pub fn into_delivery_error(self) -> sttr_runtime::Error {
        match self {
            Error::Configuration(msg) => sttr_runtime::Error::Configuration(msg),
            other => sttr_runtime::Error::Delivery(other.to_string()),
        }
    }
}

/// Build the HTTP client shared by every adapter of one invocation
pub fn http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("sttr/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Fail with a configuration error naming the missing variable
pub(crate) fn required(value: Option<String>, variable: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::Configuration(format!("{} not set", variable))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_missing_and_blank() {
        assert!(required(None, "URL").is_err());
        assert!(required(Some("  ".into()), "URL").is_err());
        assert_eq!(required(Some("x".into()), "URL").unwrap(), "x");

        match required(None, "SLACK_TOKEN").unwrap_err() {
            Error::Configuration(msg) => assert_eq!(msg, "SLACK_TOKEN not set"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_seam_conversions() {
        let err = Error::Query {
            code: "TABLE_OR_VIEW_NOT_FOUND".into(),
            message: "missing".into(),
        };
        assert!(matches!(
            err.into_warehouse_error(),
            sttr_runtime::Error::Warehouse(msg) if msg.contains("TABLE_OR_VIEW_NOT_FOUND")
        ));

        let err = Error::Delivery {
            status: 400,
            body: "invalid_payload".into(),
        };
        assert!(matches!(
            err.into_delivery_error(),
            sttr_runtime::Error::Delivery(msg) if msg.contains("invalid_payload")
        ));

        let err = Error::Configuration("URL not set".into());
        assert!(matches!(
            err.into_delivery_error(),
            sttr_runtime::Error::Configuration(_)
        ));
    }
}
