// Query result type shared by the orchestrator (C10) and the cache
// (C9). Kept in its own module rather than on either side so the cache
// can store and return the exact value the orchestrator produced on a
// miss, per spec §8's cache law: `put(k, v); get(k) = v` (with
// `from_cache` flipped to `true`).

/// Outcome of a single `execute()` call: result rows plus the routing
/// metadata a caller needs to judge how the query was served.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub rows: Vec<crate::engine::ResultRow>,
    pub engine_used: &'static str,
    pub wall_time_sec: f64,
    pub rows_processed: usize,
    pub partitions_scanned: usize,
    pub total_partitions: usize,
    pub from_cache: bool,
    pub sql_optimized: String,
    pub actual_data_size_gb: f64,
}
