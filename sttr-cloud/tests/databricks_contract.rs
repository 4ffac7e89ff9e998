//! Databricks Statement Execution Contract Tests
//!
//! These tests run the warehouse client against a local HTTP mock and verify:
//! - the request body the API expects (warehouse id, bound parameters, inline JSON)
//! - polling of pending statements
//! - chunk following and column normalization
//! - error mapping for failed statements and rejected tokens

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use sttr_cloud::{DatabricksConfig, DatabricksWarehouse, Error};
use sttr_core::{QueryParam, QuerySpec};
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn warehouse(server: &MockServer) -> DatabricksWarehouse {
    let config = DatabricksConfig::new(
        Some(server.uri()),
        Some("/sql/1.0/warehouses/wh-42".to_string()),
        Some("dapi-test".to_string()),
    )
    .unwrap()
    .with_poll_interval(Duration::from_millis(5));
    DatabricksWarehouse::new(config, reqwest::Client::new())
}

fn query() -> QuerySpec {
    QuerySpec::new("station_040_force", "040", "SELECT 1")
        .with_param(QueryParam::string("window_start", "2025-06-02 09:00"))
}

fn succeeded(columns: &[&str], rows: Value, next: Option<&str>) -> Value {
    json!({
        "statement_id": "stmt-1",
        "status": {"state": "SUCCEEDED"},
        "manifest": {
            "schema": {
                "columns": columns.iter().map(|c| json!({"name": c})).collect::<Vec<_>>()
            }
        },
        "result": {
            "data_array": rows,
            "next_chunk_internal_link": next,
        }
    })
}

#[tokio::test]
async fn test_statement_request_matches_api_contract() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/2.0/sql/statements"))
        .and(bearer_token("dapi-test"))
        .and(body_partial_json(json!({
            "warehouse_id": "wh-42",
            "statement": "SELECT 1",
            "parameters": [{"name": "window_start", "value": "2025-06-02 09:00", "type": "STRING"}],
            "wait_timeout": "30s",
            "disposition": "INLINE",
            "format": "JSON_ARRAY"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(succeeded(
            &["count", "station_name", "parameter_name"],
            json!([["5", "040", "Force process value"]]),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let table = warehouse(&server).execute_statement(&query()).await.unwrap();

    assert_eq!(table.columns(), &["COUNT", "STATION_NAME", "PARAMETER_NAME"]);
    assert_eq!(table.len(), 1);
    assert_eq!(table.cell_u64(0, "COUNT").unwrap(), 5);
}

#[tokio::test]
async fn test_pending_statement_is_polled_until_done() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/2.0/sql/statements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statement_id": "stmt-1",
            "status": {"state": "PENDING"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/2.0/sql/statements/stmt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(succeeded(
            &["COUNT", "STATION_NAME"],
            json!([["7", "210"]]),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let table = warehouse(&server).execute_statement(&query()).await.unwrap();
    assert_eq!(table.cell_str(0, "STATION_NAME").as_deref(), Some("210"));
}

#[tokio::test]
async fn test_result_chunks_are_followed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/2.0/sql/statements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(succeeded(
            &["COUNT", "STATION_NAME"],
            json!([["1", "040"]]),
            Some("/api/2.0/sql/statements/stmt-1/result/chunks/1"),
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/2.0/sql/statements/stmt-1/result/chunks/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data_array": [["2", "090"], [null, "100"]]
        })))
        .mount(&server)
        .await;

    let table = warehouse(&server).execute_statement(&query()).await.unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.cell_u64(1, "COUNT").unwrap(), 2);
    assert_eq!(table.cell_u64(2, "COUNT").unwrap(), 0);
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/2.0/sql/statements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statement_id": "stmt-1",
            "status": {"state": "SUCCEEDED"},
            "manifest": {"schema": {"columns": [{"name": "COUNT"}, {"name": "STATION_NAME"}]}},
            "result": {}
        })))
        .mount(&server)
        .await;

    let table = warehouse(&server).execute_statement(&query()).await.unwrap();

    assert!(table.is_empty());
    assert!(table.has_columns(&["COUNT", "STATION_NAME"]));
}

#[tokio::test]
async fn test_failed_statement_maps_to_query_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/2.0/sql/statements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statement_id": "stmt-1",
            "status": {
                "state": "FAILED",
                "error": {"error_code": "TABLE_OR_VIEW_NOT_FOUND", "message": "no such table"}
            }
        })))
        .mount(&server)
        .await;

    let err = warehouse(&server)
        .execute_statement(&query())
        .await
        .unwrap_err();

    match err {
        Error::Query { code, message } => {
            assert_eq!(code, "TABLE_OR_VIEW_NOT_FOUND");
            assert_eq!(message, "no such table");
        }
        other => panic!("expected query error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_token_is_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/2.0/sql/statements"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error_code": "UNAUTHENTICATED",
            "message": "Invalid access token."
        })))
        .mount(&server)
        .await;

    let err = warehouse(&server)
        .execute_statement(&query())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Unauthenticated(msg) if msg == "Invalid access token."));
}

#[tokio::test]
async fn test_warehouse_seam_reports_warehouse_errors() {
    use sttr_runtime::Warehouse;

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/2.0/sql/statements"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = warehouse(&server).execute(&query()).await.unwrap_err();
    assert!(matches!(err, sttr_runtime::Error::Warehouse(_)));
}
