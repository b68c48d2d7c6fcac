pub mod catalog;
pub mod pruning;

pub use catalog::{PartitionCatalog, PartitionEntry};
pub use pruning::PruningResult;
