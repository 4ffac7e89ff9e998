//! Warehouse seam

use crate::Result;
use async_trait::async_trait;
use sttr_core::{QuerySpec, Table};

/// Query-in, rows-out service
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Execute one query and materialize its full result.
    ///
    /// Column names of the returned table are uppercase.
    async fn execute(&self, query: &QuerySpec) -> Result<Table>;
}
