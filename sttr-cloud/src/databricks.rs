//! Databricks SQL warehouse client
//!
//! Statements go through the SQL Statement Execution API with inline JSON
//! results:
//!
//! 1. `POST /api/2.0/sql/statements` waits up to `wait_timeout` server-side
//! 2. a statement still `PENDING` or `RUNNING` is polled with
//!    `GET /api/2.0/sql/statements/{id}`
//! 3. extra result chunks are followed through `next_chunk_internal_link`
//!
//! Every cell arrives as a JSON string or null; typed reads happen in
//! [`sttr_core::Table`].

use crate::config::DatabricksConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sttr_core::{QueryParam, QuerySpec, Table};
use sttr_runtime::Warehouse;
use tracing::debug;

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    warehouse_id: &'a str,
    statement: &'a str,
    parameters: &'a [QueryParam],
    wait_timeout: &'a str,
    disposition: &'static str,
    format: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementStatus {
    state: StatementState,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct Column {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Schema {
    #[serde(default)]
    columns: Vec<Column>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    schema: Schema,
}

#[derive(Debug, Default, Deserialize)]
struct ResultChunk {
    #[serde(default)]
    data_array: Vec<Vec<Value>>,
    #[serde(default)]
    next_chunk_internal_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    statement_id: String,
    status: StatementStatus,
    #[serde(default)]
    manifest: Option<Manifest>,
    #[serde(default)]
    result: Option<ResultChunk>,
}

/// Warehouse backed by a Databricks SQL warehouse
pub struct DatabricksWarehouse {
    config: DatabricksConfig,
    client: reqwest::Client,
}

impl DatabricksWarehouse {
    pub fn new(config: DatabricksConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Run one statement to completion and collect every chunk
    pub async fn execute_statement(&self, query: &QuerySpec) -> Result<Table> {
        let request = StatementRequest {
            warehouse_id: self.config.warehouse_id()?,
            statement: &query.sql,
            parameters: &query.params,
            wait_timeout: &self.config.wait_timeout,
            disposition: "INLINE",
            format: "JSON_ARRAY",
        };

        let url = format!("{}/api/2.0/sql/statements", self.config.base_url());
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&request)
            .send()
            .await?;
        let mut statement: StatementResponse = read_json(response).await?;

        while matches!(
            statement.status.state,
            StatementState::Pending | StatementState::Running
        ) {
            debug!(
                statement_id = %statement.statement_id,
                state = ?statement.status.state,
                "Statement in progress, polling"
            );
            tokio::time::sleep(self.config.poll_interval).await;
            statement = self.get_statement(&statement.statement_id).await?;
        }

        if statement.status.state != StatementState::Succeeded {
            let error = statement.status.error.unwrap_or_default();
            return Err(Error::Query {
                code: error
                    .error_code
                    .unwrap_or_else(|| format!("{:?}", statement.status.state).to_uppercase()),
                message: error
                    .message
                    .unwrap_or_else(|| "statement did not succeed".to_string()),
            });
        }

        let columns: Vec<String> = statement
            .manifest
            .map(|m| m.schema.columns.into_iter().map(|c| c.name).collect())
            .unwrap_or_default();

        let mut chunk = statement.result.unwrap_or_default();
        let mut rows = std::mem::take(&mut chunk.data_array);
        let mut next = chunk.next_chunk_internal_link;
        while let Some(link) = next {
            let mut chunk = self.get_chunk(&link).await?;
            rows.append(&mut chunk.data_array);
            next = chunk.next_chunk_internal_link;
        }

        debug!(
            statement_id = %statement.statement_id,
            columns = columns.len(),
            rows = rows.len(),
            "Statement succeeded"
        );
        Ok(Table::from_columns_and_rows(columns, rows))
    }

    async fn get_statement(&self, statement_id: &str) -> Result<StatementResponse> {
        let url = format!(
            "{}/api/2.0/sql/statements/{}",
            self.config.base_url(),
            statement_id
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        read_json(response).await
    }

    async fn get_chunk(&self, link: &str) -> Result<ResultChunk> {
        let url = format!("{}{}", self.config.base_url(), link);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl Warehouse for DatabricksWarehouse {
    async fn execute(&self, query: &QuerySpec) -> sttr_runtime::Result<Table> {
        self.execute_statement(query)
            .await
            .map_err(Error::into_warehouse_error)
    }
}

/// Decode a success body, or turn an error status into a typed error
async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }

    let error: ServiceError = serde_json::from_str(&body).unwrap_or_default();
    let message = error.message.unwrap_or(body);
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Unauthenticated(message));
    }
    Err(Error::Api(format!(
        "{} {}: {}",
        status.as_u16(),
        error.error_code.unwrap_or_default(),
        message
    )))
}
