// C8: Engine Dispatcher. The seam between the router and whatever
// actually executes SQL against the pruned partitions. External
// collaborators (DuckDB, Polars, Spark processes) are out of scope
// (spec §1), so `ReferenceEngine` stands in as the one shipped,
// fully-testable `EngineHandle` implementation.
//
// Grounded on the teacher's `async_trait` usage in
// `networking/autodiscovery/` (trait-object handles behind `Arc`,
// tokio timeouts for bounded operations) and on
// `original_source`'s `engine.py` for the `execute_sql`/`close`
// lifecycle shape.

use crate::error::{Result, RouterError};
use crate::storage::catalog::PartitionEntry;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One row of a query result, as column name to rendered value — the
/// router's concern is routing, not typed result decoding (spec §1).
pub type ResultRow = HashMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct EngineResult {
    pub rows: Vec<ResultRow>,
    pub rows_scanned: u64,
}

/// A query execution backend. Implementations own their own connection
/// lifecycle; the dispatcher only sequences calls and enforces
/// deadlines.
#[async_trait]
pub trait EngineHandle: Send + Sync {
    fn id(&self) -> &'static str;

    /// Makes the engine aware of which partitions it should read.
    /// Called once per query before `execute_sql`.
    async fn load_partition_groups(&self, partitions: &[PartitionEntry]) -> Result<()>;

    async fn execute_sql(&self, sql: &str, deadline: Option<Duration>) -> Result<EngineResult>;

    async fn close(&self) -> Result<()>;
}

/// Minimal in-process engine: "executes" SQL by counting the loaded
/// partitions and returning a placeholder row summarizing them. Stands
/// in for the real engines the dispatcher would otherwise hand off to.
pub struct ReferenceEngine {
    id: &'static str,
    loaded: Mutex<Vec<PartitionEntry>>,
}

impl ReferenceEngine {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            loaded: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EngineHandle for ReferenceEngine {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn load_partition_groups(&self, partitions: &[PartitionEntry]) -> Result<()> {
        *self.loaded.lock() = partitions.to_vec();
        Ok(())
    }

    async fn execute_sql(&self, sql: &str, deadline: Option<Duration>) -> Result<EngineResult> {
        if sql.trim().is_empty() {
            return Err(RouterError::EngineError {
                engine_id: self.id.to_string(),
                detail: "empty SQL passed to engine".to_string(),
            });
        }

        let run = async {
            let partitions = self.loaded.lock().clone();
            let rows_scanned: u64 = partitions.iter().map(|p| p.file_count as u64).sum();
            let mut row = ResultRow::new();
            row.insert("engine".to_string(), self.id.to_string());
            row.insert("partitions_scanned".to_string(), partitions.len().to_string());
            Ok(EngineResult {
                rows: vec![row],
                rows_scanned,
            })
        };

        match deadline {
            Some(d) => tokio::time::timeout(d, run).await.map_err(|_| {
                RouterError::EngineTimeout(self.id.to_string())
            })?,
            None => run.await,
        }
    }

    async fn close(&self) -> Result<()> {
        self.loaded.lock().clear();
        Ok(())
    }
}

/// Lazily creates and caches one [`EngineHandle`] per engine id.
#[derive(Clone)]
pub struct EngineDispatcher {
    handles: Arc<Mutex<HashMap<&'static str, Arc<dyn EngineHandle>>>>,
}

impl EngineDispatcher {
    pub fn new() -> Self {
        Self {
            handles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn handle_for(&self, engine_id: &'static str) -> Arc<dyn EngineHandle> {
        let mut handles = self.handles.lock();
        handles
            .entry(engine_id)
            .or_insert_with(|| Arc::new(ReferenceEngine::new(engine_id)))
            .clone()
    }

    /// Runs `sql` against `engine_id`, loading `partitions` first and
    /// honoring `deadline` if given. Errors are wrapped as
    /// [`RouterError::EngineError`] unless the engine itself already
    /// raised a typed error (e.g. a timeout).
    pub async fn dispatch(
        &self,
        engine_id: &'static str,
        sql: &str,
        partitions: &[PartitionEntry],
        deadline: Option<Duration>,
    ) -> Result<EngineResult> {
        let handle = self.handle_for(engine_id);
        handle.load_partition_groups(partitions).await?;
        handle.execute_sql(sql, deadline).await
    }

    pub async fn close_all(&self) -> Result<()> {
        let handles: Vec<Arc<dyn EngineHandle>> = self.handles.lock().values().cloned().collect();
        for handle in handles {
            handle.close().await?;
        }
        Ok(())
    }
}

impl Default for EngineDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dispatch_returns_partition_count() {
        let dispatcher = EngineDispatcher::new();
        let partitions = vec![PartitionEntry {
            path: "/tmp/x".into(),
            column: "date".to_string(),
            value: "2024-01-01".to_string(),
            file_count: 3,
            size_bytes: 100,
            newest_mtime: None,
        }];

        let result = dispatcher
            .dispatch("single-columnar", "SELECT 1", &partitions, None)
            .await
            .unwrap();
        assert_eq!(result.rows_scanned, 3);
    }

    #[tokio::test]
    async fn empty_sql_is_engine_error() {
        let dispatcher = EngineDispatcher::new();
        let err = dispatcher
            .dispatch("single-columnar", "", &[], None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ENGINE_ERROR");
    }

    #[tokio::test]
    async fn reuses_same_handle_across_calls() {
        let dispatcher = EngineDispatcher::new();
        dispatcher
            .dispatch("single-columnar", "SELECT 1", &[], None)
            .await
            .unwrap();
        assert_eq!(dispatcher.handles.lock().len(), 1);
        dispatcher
            .dispatch("single-columnar", "SELECT 2", &[], None)
            .await
            .unwrap();
        assert_eq!(dispatcher.handles.lock().len(), 1);
    }
}
