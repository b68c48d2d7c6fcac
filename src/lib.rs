//! Cost-based query router for analytical SQL over Hive-style
//! partitioned columnar datasets: parses and validates SQL, prunes
//! partitions against WHERE predicates, estimates execution cost
//! across a small set of declarative engine profiles, and caches
//! results by normalized query text.

pub mod cache;
pub mod config;
pub mod cost;
pub mod engine;
pub mod error;
pub mod features;
pub mod orchestrator;
pub mod result;
pub mod schema;
pub mod selector;
pub mod sql;
pub mod storage;
pub mod testutil;

pub use config::RouterConfig;
pub use error::{Result, RouterError};
pub use orchestrator::RouterOrchestrator;
pub use result::QueryResult;
pub use schema::{ColumnType, SchemaMap, SchemaRegistry};
