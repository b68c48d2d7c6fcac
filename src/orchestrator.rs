// C10: Orchestrator. Wires C1-C9 into the pipeline spec §4.10 describes:
// cache check -> parse/optimize -> prune -> extract features -> cost
// estimate -> select -> dispatch -> cache put.
//
// Grounded on `original_source`'s `engine.py` `QueryEngine.execute`/
// `explain`: same step ordering, same early-return-on-cache-hit shape,
// same "steps 2-6 only, multi-section text report" contract for
// `explain`.

use crate::cache::QueryCache;
use crate::config::RouterConfig;
use crate::cost::{self, default_profiles};
use crate::engine::EngineDispatcher;
use crate::error::{Result, RouterError};
use crate::features::{self, QueryFeatures};
use crate::result::QueryResult;
use crate::schema::{ColumnType, SchemaMap, SchemaRegistry};
use crate::selector::{self, BackendChoice};
use crate::sql::predicate;
use crate::sql::SqlFacade;
use crate::storage::catalog::PartitionCatalog;
use crate::storage::pruning::{self, PruningResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cheap to clone: every field is `Arc`-backed or itself a cheap-clone
/// type, matching the teacher's `Catalog`/`QueryCache` "shared innards"
/// pattern (spec §5).
#[derive(Clone)]
pub struct RouterOrchestrator {
    config: RouterConfig,
    facade: SqlFacade,
    schemas: SchemaRegistry,
    cache: Option<Arc<QueryCache>>,
    dispatcher: EngineDispatcher,
}

impl RouterOrchestrator {
    pub fn new(config: RouterConfig) -> Result<Self> {
        config.validate()?;
        let cache = config.cache_enabled.then(|| {
            Arc::new(QueryCache::new(
                config.cache_capacity,
                config.cache_ttl_seconds,
                config.cache_track_mtimes,
            ))
        });

        Ok(Self {
            facade: SqlFacade::new(config.sql_dialect.clone()),
            schemas: SchemaRegistry::new(),
            dispatcher: EngineDispatcher::new(),
            cache,
            config,
        })
    }

    pub fn register_schema(&self, table: impl Into<String>, columns: std::collections::HashMap<String, ColumnType>) {
        self.schemas.register(table, columns);
    }

    pub fn cache_stats(&self) -> Option<crate::cache::CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub async fn close(&self) -> Result<()> {
        self.dispatcher.close_all().await
    }

    pub async fn execute(
        &self,
        sql: &str,
        schema: Option<&SchemaMap>,
        force_engine: Option<&str>,
        bypass_cache: bool,
    ) -> Result<QueryResult> {
        if let Some(cache) = &self.cache {
            if !bypass_cache {
                if let Some(cached) = cache.get(sql) {
                    return Ok(cached);
                }
            }
        }

        let total_start = Instant::now();
        let plan = self.plan(sql, schema, force_engine)?;

        let deadline = Some(Duration::from_secs(30));
        let dispatch_start = Instant::now();
        let mut choice = plan.choice.clone();
        let mut dispatch_result = self
            .dispatcher
            .dispatch(
                choice.engine_id,
                &plan.optimized_sql,
                &plan.pruning.kept,
                deadline,
            )
            .await;

        // Single retry, per spec §7.3: if the chosen engine fails and no
        // engine was forced, fall back to the next-cheapest feasible
        // estimate and annotate the reasoning string.
        if dispatch_result.is_err() && force_engine.is_none() {
            if let Some(fallback) = next_cheapest(&plan.choice) {
                let failure_detail = dispatch_result
                    .as_ref()
                    .err()
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                tracing::warn!(
                    engine = choice.engine_id,
                    fallback = fallback.engine_id,
                    "engine dispatch failed, retrying once"
                );
                let retried = self
                    .dispatcher
                    .dispatch(
                        fallback.engine_id,
                        &plan.optimized_sql,
                        &plan.pruning.kept,
                        deadline,
                    )
                    .await;
                if retried.is_ok() {
                    choice = BackendChoice {
                        engine_id: fallback.engine_id,
                        cost_estimate: fallback.clone(),
                        all_estimates: plan.choice.all_estimates.clone(),
                        reasoning: format!(
                            "{} (retried after {} failed: {})",
                            plan.choice.reasoning, plan.choice.engine_id, failure_detail
                        ),
                    };
                    dispatch_result = retried;
                }
            }
        }

        let engine_result = dispatch_result?;
        let wall_time_sec = dispatch_start.elapsed().as_secs_f64();
        let _ = total_start; // total time currently mirrors dispatch time; retained for future breakdown

        let result = QueryResult {
            rows: engine_result.rows.clone(),
            engine_used: choice.engine_id,
            wall_time_sec,
            rows_processed: engine_result.rows.len(),
            partitions_scanned: plan.pruning.kept.len(),
            total_partitions: plan.pruning.total_count,
            from_cache: false,
            sql_optimized: plan.optimized_sql.clone(),
            actual_data_size_gb: plan.scan_size_gb,
        };

        if let Some(cache) = &self.cache {
            if !bypass_cache {
                let source_files: Vec<_> = plan
                    .pruning
                    .kept
                    .iter()
                    .map(|p| p.path.clone())
                    .collect();
                cache.put(sql, result.clone(), &source_files);
            }
        }

        Ok(result)
    }

    pub fn explain(&self, sql: &str, schema: Option<&SchemaMap>) -> String {
        match self.plan(sql, schema, None) {
            Ok(plan) => selector::explain_selection(
                &plan.tables,
                &plan.query_features,
                &plan.pruning,
                &plan.choice,
            ),
            Err(e) => format!("error explaining query: {e}"),
        }
    }

    /// Steps 2-6 of spec §4.10, shared by `execute` and `explain`.
    /// `explain` always calls this with `force_engine = None`, matching
    /// spec §4.10's "steps 2-6 only" contract for the report.
    fn plan(&self, sql: &str, schema: Option<&SchemaMap>, force_engine: Option<&str>) -> Result<Plan> {
        let stmt = self.facade.parse(sql)?;
        let tables = self.facade.tables(&stmt);
        let table = tables.first().cloned().ok_or(RouterError::NoTables)?;

        let optimized = self.facade.optimize(&stmt, schema);
        let optimized_sql = self.facade.render(&optimized);

        let catalog = PartitionCatalog::scan(
            &self.config.data_root,
            &table,
            &self.config.partition_file_extension,
        )?;

        let partition_column = catalog.partition_column.clone().unwrap_or_default();

        let column_type = schema
            .and_then(|s| s.get(&table))
            .and_then(|cols| cols.get(&partition_column))
            .copied()
            .or_else(|| self.schemas.get(&table).and_then(|s| s.column_type(&partition_column)))
            .unwrap_or(ColumnType::Varchar);

        let predicates = self
            .facade
            .where_of(&optimized)
            .map(|w| predicate::lift_predicates(&w, &partition_column))
            .unwrap_or_default();

        let pruning = pruning::prune(&catalog, &partition_column, &predicates, column_type);
        let scan_size_gb = pruning.kept_size_bytes() as f64 / 1_073_741_824.0;

        let query_features = features::extract_features(&optimized, scan_size_gb);
        let choice = selector::select(&default_profiles(), &query_features, force_engine)
            .ok_or(RouterError::NoTables)?;

        Ok(Plan {
            tables,
            optimized_sql,
            pruning,
            scan_size_gb,
            query_features,
            choice,
        })
    }
}

struct Plan {
    tables: Vec<String>,
    optimized_sql: String,
    pruning: PruningResult,
    scan_size_gb: f64,
    query_features: QueryFeatures,
    choice: BackendChoice,
}

fn next_cheapest(choice: &BackendChoice) -> Option<&cost::CostEstimate> {
    choice
        .all_estimates
        .iter()
        .filter(|e| e.engine_id != choice.engine_id && e.feasible)
        .min_by(|a, b| a.estimated_time_sec.total_cmp(&b.estimated_time_sec))
}
