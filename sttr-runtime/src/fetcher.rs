//! Sequential result fetching
//!
//! Queries run strictly one after another on the same warehouse handle. The
//! first failure aborts the batch: there is no retry and no partial result.

use crate::metrics::{QUERY_DURATION, QUERY_TOTAL, ROWS_FETCHED_TOTAL};
use crate::warehouse::Warehouse;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use sttr_core::{QuerySpec, Table};
use tracing::{error, info, instrument};

/// Executes catalog queries against a [`Warehouse`]
#[derive(Clone)]
pub struct ResultFetcher {
    warehouse: Arc<dyn Warehouse>,
}

impl ResultFetcher {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }

    /// Execute one query
    #[instrument(skip(self, query), fields(query = %query.name, station = %query.station))]
    pub async fn fetch(&self, query: &QuerySpec) -> Result<Table> {
        let start = Instant::now();
        let result = self.warehouse.execute(query).await;
        let elapsed = start.elapsed();

        QUERY_DURATION
            .with_label_values(&[query.name.as_str()])
            .observe(elapsed.as_secs_f64());

        match result {
            Ok(table) => {
                QUERY_TOTAL
                    .with_label_values(&[query.name.as_str(), "success"])
                    .inc();
                ROWS_FETCHED_TOTAL
                    .with_label_values(&[query.name.as_str()])
                    .inc_by(table.len() as u64);
                info!(
                    rows = table.len(),
                    duration_ms = elapsed.as_millis() as u64,
                    "Query executed"
                );
                Ok(table)
            }
            Err(e) => {
                QUERY_TOTAL
                    .with_label_values(&[query.name.as_str(), "failure"])
                    .inc();
                error!(
                    error = %e,
                    duration_ms = elapsed.as_millis() as u64,
                    "Query failed"
                );
                Err(e)
            }
        }
    }

    /// Execute queries in order, stopping at the first failure
    pub async fn fetch_all(&self, queries: &[QuerySpec]) -> Result<Vec<Table>> {
        let mut tables = Vec::with_capacity(queries.len());
        for query in queries {
            tables.push(self.fetch(query).await?);
        }
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records call order; fails on the named query
    struct ScriptedWarehouse {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl Warehouse for ScriptedWarehouse {
        async fn execute(&self, query: &QuerySpec) -> Result<Table> {
            self.calls.lock().unwrap().push(query.name.clone());
            if self.fail_on == Some(query.name.as_str()) {
                return Err(Error::Warehouse(format!("{} exploded", query.name)));
            }
            Ok(Table::empty())
        }
    }

    fn queries() -> Vec<QuerySpec> {
        ["a", "b", "c"]
            .into_iter()
            .map(|name| QuerySpec::new(name, "000", "SELECT 1"))
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_all_runs_in_order() {
        let warehouse = Arc::new(ScriptedWarehouse {
            calls: Mutex::new(Vec::new()),
            fail_on: None,
        });
        let fetcher = ResultFetcher::new(warehouse.clone());

        let tables = fetcher.fetch_all(&queries()).await.unwrap();

        assert_eq!(tables.len(), 3);
        assert_eq!(*warehouse.calls.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_first_failure_aborts() {
        let warehouse = Arc::new(ScriptedWarehouse {
            calls: Mutex::new(Vec::new()),
            fail_on: Some("b"),
        });
        let fetcher = ResultFetcher::new(warehouse.clone());

        let err = fetcher.fetch_all(&queries()).await.unwrap_err();

        assert!(matches!(err, Error::Warehouse(_)));
        assert_eq!(*warehouse.calls.lock().unwrap(), vec!["a", "b"]);
    }
}
