// C9: Query Cache. LRU + TTL + mtime-invalidated cache of query
// results, keyed by normalized SQL text.
//
// Grounded on `original_source`'s `query_cache.py`: same normalization
// (lowercase, whitespace-collapsed) hashed with SHA-256 truncated to 16
// hex chars, same eviction/hit/miss/expiration/invalidation counters,
// same `OrderedDict`-style LRU (here a `HashMap` plus a `VecDeque`
// recency queue, matching the shape the teacher's own in-memory caches
// use elsewhere in the crate) behind a single `parking_lot::Mutex`.

use crate::result::QueryResult;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::{Instant, SystemTime};

#[derive(Debug, Clone)]
struct CacheEntry {
    result: QueryResult,
    created_at: Instant,
    ttl_seconds: u64,
    source_mtimes: Vec<(PathBuf, SystemTime)>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed().as_secs() > self.ttl_seconds
    }

    fn is_invalidated(&self) -> bool {
        self.source_mtimes.iter().any(|(path, cached_mtime)| {
            match std::fs::metadata(path).and_then(|m| m.modified()) {
                Ok(current) => current > *cached_mtime,
                Err(_) => true, // file gone: treat as changed
            }
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub invalidations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of query results keyed by normalized SQL.
pub struct QueryCache {
    capacity: usize,
    default_ttl_seconds: u64,
    track_mtimes: bool,
    entries: parking_lot::Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    map: HashMap<String, CacheEntry>,
    // Front = least recently used, back = most recently used.
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
    invalidations: u64,
}

impl QueryCache {
    pub fn new(capacity: usize, default_ttl_seconds: u64, track_mtimes: bool) -> Self {
        Self {
            capacity,
            default_ttl_seconds,
            track_mtimes,
            entries: parking_lot::Mutex::new(Inner::default()),
        }
    }

    /// SHA-256(lowercased, whitespace-collapsed SQL), truncated to 16
    /// hex characters.
    pub fn normalize_key(sql: &str) -> String {
        let normalized = sql.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
        let digest = Sha256::digest(normalized.as_bytes());
        hex_prefix(&digest, 16)
    }

    /// Returns the cached result with `from_cache` set to `true`, or
    /// `None` on a miss/expiration/invalidation. The stored value is
    /// otherwise untouched — per spec §8's cache law, a hit returns
    /// exactly what was `put`, not a reconstruction with any field
    /// dropped or zeroed.
    pub fn get(&self, sql: &str) -> Option<QueryResult> {
        let key = Self::normalize_key(sql);
        let mut inner = self.entries.lock();

        let Some(entry) = inner.map.get(&key) else {
            inner.misses += 1;
            return None;
        };

        if entry.is_expired() {
            inner.map.remove(&key);
            remove_from_order(&mut inner.order, &key);
            inner.expirations += 1;
            inner.misses += 1;
            return None;
        }

        if self.track_mtimes && entry.is_invalidated() {
            inner.map.remove(&key);
            remove_from_order(&mut inner.order, &key);
            inner.invalidations += 1;
            inner.misses += 1;
            return None;
        }

        let mut result = entry.result.clone();
        remove_from_order(&mut inner.order, &key);
        inner.order.push_back(key);
        inner.hits += 1;
        result.from_cache = true;
        Some(result)
    }

    pub fn put(&self, sql: &str, result: QueryResult, source_files: &[PathBuf]) {
        let key = Self::normalize_key(sql);
        let mut inner = self.entries.lock();

        if inner.map.len() >= self.capacity && !inner.map.contains_key(&key) {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
                inner.evictions += 1;
            }
        }

        let source_mtimes = if self.track_mtimes {
            source_files
                .iter()
                .filter_map(|p| std::fs::metadata(p).and_then(|m| m.modified()).ok().map(|m| (p.clone(), m)))
                .collect()
        } else {
            Vec::new()
        };

        remove_from_order(&mut inner.order, &key);
        inner.order.push_back(key.clone());
        inner.map.insert(
            key,
            CacheEntry {
                result,
                created_at: Instant::now(),
                ttl_seconds: self.default_ttl_seconds,
                source_mtimes,
            },
        );
    }

    pub fn invalidate(&self, sql: &str) {
        let key = Self::normalize_key(sql);
        let mut inner = self.entries.lock();
        if inner.map.remove(&key).is_some() {
            remove_from_order(&mut inner.order, &key);
            inner.invalidations += 1;
        }
    }

    pub fn clear(&self) {
        let mut inner = self.entries.lock();
        *inner = Inner::default();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.entries.lock();
        CacheStats {
            size: inner.map.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
            invalidations: inner.invalidations,
        }
    }
}

fn remove_from_order(order: &mut VecDeque<String>, key: &str) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        order.remove(pos);
    }
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()[..len].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn result() -> QueryResult {
        QueryResult {
            rows: Vec::new(),
            engine_used: "single-columnar",
            wall_time_sec: 0.1,
            rows_processed: 0,
            partitions_scanned: 1,
            total_partitions: 1,
            from_cache: false,
            sql_optimized: "SELECT 1".to_string(),
            actual_data_size_gb: 0.0,
        }
    }

    #[test]
    fn normalization_ignores_case_and_whitespace() {
        let a = QueryCache::normalize_key("SELECT  *  FROM t");
        let b = QueryCache::normalize_key("select * from t");
        assert_eq!(a, b);
    }

    #[test]
    fn miss_then_hit() {
        let cache = QueryCache::new(10, 300, false);
        assert!(cache.get("SELECT 1").is_none());
        cache.put("SELECT 1", result(), &[]);
        assert!(cache.get("SELECT 1").is_some());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn hit_returns_the_stored_result_verbatim_with_from_cache_flipped() {
        let cache = QueryCache::new(10, 300, false);
        let put_result = result();
        cache.put("SELECT 1", put_result.clone(), &[]);

        let hit = cache.get("SELECT 1").unwrap();
        assert!(hit.from_cache);
        assert_eq!(hit.partitions_scanned, put_result.partitions_scanned);
        assert_eq!(hit.total_partitions, put_result.total_partitions);
        assert_eq!(hit.sql_optimized, put_result.sql_optimized);
        assert_eq!(hit.actual_data_size_gb, put_result.actual_data_size_gb);
    }

    #[test]
    fn evicts_least_recently_used_at_capacity() {
        let cache = QueryCache::new(2, 300, false);
        cache.put("SELECT 1", result(), &[]);
        cache.put("SELECT 2", result(), &[]);
        cache.get("SELECT 1"); // bump 1 to most-recently-used
        cache.put("SELECT 3", result(), &[]); // evicts 2

        assert!(cache.get("SELECT 1").is_some());
        assert!(cache.get("SELECT 2").is_none());
        assert!(cache.get("SELECT 3").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn expires_after_ttl() {
        let cache = QueryCache::new(10, 0, false);
        cache.put("SELECT 1", result(), &[]);
        sleep(Duration::from_millis(1100));
        assert!(cache.get("SELECT 1").is_none());
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn invalidates_on_mtime_change() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.parquet");
        std::fs::write(&file, b"data").unwrap();

        let cache = QueryCache::new(10, 300, true);
        cache.put("SELECT 1", result(), &[file.clone()]);
        assert!(cache.get("SELECT 1").is_some());

        sleep(Duration::from_millis(50));
        std::fs::write(&file, b"more data").unwrap();

        assert!(cache.get("SELECT 1").is_none());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn hit_rate_computed_from_totals() {
        let cache = QueryCache::new(10, 300, false);
        cache.put("SELECT 1", result(), &[]);
        cache.get("SELECT 1");
        cache.get("SELECT 1");
        cache.get("SELECT missing");
        let stats = cache.stats();
        assert!((stats.hit_rate() - (2.0 / 3.0)).abs() < 1e-9);
    }
}
