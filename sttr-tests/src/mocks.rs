//! Mock implementations of the warehouse and notifier seams
//!
//! [`MockWarehouse`] and [`RecordingNotifier`] run in process. The
//! [`MockDatabricksServer`] and [`MockSlackServer`] stand in for the real
//! HTTP endpoints so the cloud adapters can be exercised end to end.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use sttr_core::{Payload, Table};
use sttr_runtime::{DeliveryReceipt, Error, Notifier, Result, Warehouse};
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Warehouse answering queries by name
///
/// Unknown queries answer with an empty table.
#[derive(Default)]
pub struct MockWarehouse {
    tables: HashMap<String, Table>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MockWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, query: impl Into<String>, table: Table) -> Self {
        self.tables.insert(query.into(), table);
        self
    }

    /// Make `query` fail with a warehouse error
    pub fn with_failure(mut self, query: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(query.into(), message.into());
        self
    }

    /// Query names in execution order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Warehouse for MockWarehouse {
    async fn execute(&self, query: &sttr_core::QuerySpec) -> Result<Table> {
        self.calls.lock().unwrap().push(query.name.clone());
        if let Some(message) = self.failures.get(&query.name) {
            return Err(Error::Warehouse(message.clone()));
        }
        Ok(self.tables.get(&query.name).cloned().unwrap_or_default())
    }
}

/// Notifier that keeps every delivered payload
#[derive(Default)]
pub struct RecordingNotifier {
    payloads: Mutex<Vec<Payload>>,
    fail_with: Option<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose deliveries always fail
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            payloads: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    pub fn payloads(&self) -> Vec<Payload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, payload: &Payload) -> Result<DeliveryReceipt> {
        if let Some(message) = &self.fail_with {
            return Err(Error::Delivery(message.clone()));
        }
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(DeliveryReceipt {
            status: 200,
            body: "ok".to_string(),
        })
    }
}

/// Matches statement submissions by their exact SQL text
struct StatementMatcher(String);

impl Match for StatementMatcher {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|body| body["statement"].as_str().map(|sql| sql == self.0))
            .unwrap_or(false)
    }
}

/// Mock Databricks SQL Statement Execution API
pub struct MockDatabricksServer {
    server: MockServer,
}

impl MockDatabricksServer {
    /// Start a server answering every statement with an empty result
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/2.0/sql/statements"))
            .respond_with(ResponseTemplate::new(200).set_body_json(succeeded(&Table::empty())))
            .with_priority(10)
            .mount(&server)
            .await;

        Self { server }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Answer statements whose SQL equals `sql` with `table`
    pub async fn mount_result(&self, sql: &str, table: &Table) {
        Mock::given(method("POST"))
            .and(path("/api/2.0/sql/statements"))
            .and(StatementMatcher(sql.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(succeeded(table)))
            .mount(&self.server)
            .await;
    }

    /// Number of statements submitted so far
    pub async fn statements_received(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == "POST")
            .count()
    }
}

/// A `SUCCEEDED` statement response carrying `table` inline
fn succeeded(table: &Table) -> Value {
    let columns: Vec<Value> = table
        .columns()
        .iter()
        .map(|name| json!({ "name": name }))
        .collect();
    let rows: Vec<Value> = table
        .rows()
        .iter()
        .map(|row| Value::Array(row.values().cloned().collect()))
        .collect();

    json!({
        "statement_id": "stmt-mock",
        "status": { "state": "SUCCEEDED" },
        "manifest": { "schema": { "columns": columns } },
        "result": { "data_array": rows }
    })
}

/// Mock Slack incoming webhook
pub struct MockSlackServer {
    server: MockServer,
}

pub const WEBHOOK_PATH: &str = "/services/T000/B000/XXXX";

impl MockSlackServer {
    /// Start a webhook answering `200 ok`
    pub async fn start() -> Self {
        Self::start_with(ResponseTemplate::new(200).set_body_string("ok")).await
    }

    /// Start a webhook rejecting every post with `status` and `code`
    pub async fn start_failing(status: u16, code: &str) -> Self {
        Self::start_with(ResponseTemplate::new(status).set_body_string(code)).await
    }

    async fn start_with(response: ResponseTemplate) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(WEBHOOK_PATH))
            .respond_with(response)
            .mount(&server)
            .await;

        Self { server }
    }

    pub fn webhook_url(&self) -> String {
        format!("{}{}", self.server.uri(), WEBHOOK_PATH)
    }

    /// JSON bodies posted to the webhook
    pub async fn received_payloads(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}
