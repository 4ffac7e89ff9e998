//! Slack delivery
//!
//! The report goes to an incoming webhook. One-off messages go through the
//! `chat.postMessage` Web API with a bot token.

use crate::{required, Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use sttr_core::Payload;
use sttr_runtime::{DeliveryReceipt, Notifier};
use tracing::{error, info, warn};

pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Error codes meaning the token was rejected
const AUTH_ERRORS: &[&str] = &[
    "not_authed",
    "invalid_auth",
    "account_inactive",
    "token_revoked",
    "token_expired",
];

/// Posts report payloads to a Slack incoming webhook
pub struct SlackWebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl SlackWebhookNotifier {
    pub fn new(url: Option<String>, client: reqwest::Client) -> Result<Self> {
        let url = required(url, "URL")?;
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(Error::Configuration(
                "webhook URL must start with http:// or https://".to_string(),
            ));
        }
        Ok(Self { url, client })
    }

    /// POST the payload; non-2xx answers carry Slack's error code in the body
    pub async fn post(&self, payload: &Payload) -> Result<DeliveryReceipt> {
        let body = serde_json::to_vec(payload)?;
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(Error::Delivery { status, body: text });
        }

        Ok(DeliveryReceipt { status, body: text })
    }
}

#[async_trait]
impl Notifier for SlackWebhookNotifier {
    async fn deliver(&self, payload: &Payload) -> sttr_runtime::Result<DeliveryReceipt> {
        self.post(payload).await.map_err(Error::into_delivery_error)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

/// Slack Web API client for plain messages
pub struct SlackChatClient {
    token: String,
    api_base: String,
    client: reqwest::Client,
}

impl SlackChatClient {
    pub fn new(token: Option<String>, client: reqwest::Client) -> Result<Self> {
        Ok(Self {
            token: required(token, "SLACK_TOKEN")?,
            api_base: SLACK_API_BASE.to_string(),
            client,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Post `text` to `channel` and return the message timestamp
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<String> {
        let url = format!("{}/chat.postMessage", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "channel": channel, "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("chat.postMessage returned {}: {}", status, body)));
        }

        let reply: ChatResponse = response.json().await?;
        if !reply.ok {
            let code = reply.error.unwrap_or_else(|| "unknown_error".to_string());
            if AUTH_ERRORS.contains(&code.as_str()) {
                warn!(code = %code, channel = %channel, "Slack rejected the bot token");
                return Err(Error::Unauthenticated(code));
            }
            error!(code = %code, channel = %channel, "Slack API error");
            return Err(Error::SlackApi(code));
        }

        let ts = reply
            .ts
            .ok_or_else(|| Error::Api("chat.postMessage reply has no ts".to_string()))?;
        info!(channel = %channel, ts = %ts, "Message posted");
        Ok(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_url_is_required() {
        let client = reqwest::Client::new();
        let err = SlackWebhookNotifier::new(None, client.clone()).err().unwrap();
        assert_eq!(err.to_string(), "Configuration error: URL not set");

        assert!(SlackWebhookNotifier::new(Some("hooks.slack.com/x".into()), client).is_err());
    }

    #[test]
    fn test_chat_client_requires_token() {
        let err = SlackChatClient::new(None, reqwest::Client::new()).err().unwrap();
        assert!(err.to_string().contains("SLACK_TOKEN"));
    }

    #[test]
    fn test_chat_response_without_ts() {
        let reply: ChatResponse =
            serde_json::from_str(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.error.as_deref(), Some("channel_not_found"));
        assert!(reply.ts.is_none());
    }
}
