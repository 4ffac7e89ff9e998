//! Notifier seam

use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sttr_core::Payload;

/// What the delivery endpoint answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub status: u16,
    pub body: String,
}

/// Result of the delivery step of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered { receipt: DeliveryReceipt },
    Failed { error: String },
    /// Dry run or no notifier configured
    Skipped,
}

impl DeliveryOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered { .. } => "delivered",
            DeliveryOutcome::Failed { .. } => "failed",
            DeliveryOutcome::Skipped => "skipped",
        }
    }
}

/// Delivers a rendered payload to the chat channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, payload: &Payload) -> Result<DeliveryReceipt>;
}

/// Stands in for a notifier whose settings are missing or invalid.
///
/// Every delivery fails with the configuration error, so the run still
/// queries and renders and only the delivery step reports the problem.
pub struct UnconfiguredNotifier {
    reason: String,
}

impl UnconfiguredNotifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Notifier for UnconfiguredNotifier {
    async fn deliver(&self, _payload: &Payload) -> Result<DeliveryReceipt> {
        Err(Error::Configuration(self.reason.clone()))
    }
}
