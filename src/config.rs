// Router configuration. Mirrors the teacher's `CacheConfig::validate`
// pattern: a plain record plus an explicit `validate()` rather than
// validating piecemeal at each call site.

use crate::error::{Result, RouterError};

pub const MIN_TTL_SECONDS: u64 = 1;
pub const MAX_TTL_SECONDS: u64 = 86_400;
pub const DEFAULT_PARTITION_EXTENSION: &str = "parquet";

/// Top-level configuration for a [`crate::orchestrator::RouterOrchestrator`].
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Root directory under which `<table>/<key>=<value>/*.<ext>` lives.
    pub data_root: String,

    /// SQL dialect tag passed through to the facade's parser.
    pub sql_dialect: String,

    /// File extension (without leading dot) that counts toward
    /// partition size/file-count, and that the dispatcher globs for.
    pub partition_file_extension: String,

    pub cache_enabled: bool,
    pub cache_capacity: usize,
    pub cache_ttl_seconds: u64,

    /// Whether the cache also invalidates on source file mtime changes.
    pub cache_track_mtimes: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            data_root: "./data".to_string(),
            sql_dialect: "generic".to_string(),
            partition_file_extension: DEFAULT_PARTITION_EXTENSION.to_string(),
            cache_enabled: true,
            cache_capacity: 1_000,
            cache_ttl_seconds: 300,
            cache_track_mtimes: true,
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data_root.trim().is_empty() {
            return Err(RouterError::Config("data_root must not be empty".to_string()));
        }
        if self.partition_file_extension.trim().is_empty() {
            return Err(RouterError::Config(
                "partition_file_extension must not be empty".to_string(),
            ));
        }
        if self.cache_enabled {
            if self.cache_capacity == 0 {
                return Err(RouterError::Config(
                    "cache_capacity must be greater than 0 when caching is enabled".to_string(),
                ));
            }
            if self.cache_ttl_seconds < MIN_TTL_SECONDS || self.cache_ttl_seconds > MAX_TTL_SECONDS {
                return Err(RouterError::Config(format!(
                    "cache_ttl_seconds must be between {MIN_TTL_SECONDS} and {MAX_TTL_SECONDS}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RouterConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_empty_data_root() {
        let mut cfg = RouterConfig::default();
        cfg.data_root = "  ".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_capacity_when_cache_enabled() {
        let mut cfg = RouterConfig::default();
        cfg.cache_capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn allows_zero_capacity_when_cache_disabled() {
        let mut cfg = RouterConfig::default();
        cfg.cache_capacity = 0;
        cfg.cache_enabled = false;
        assert!(cfg.validate().is_ok());
    }
}
