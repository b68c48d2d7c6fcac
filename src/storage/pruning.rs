// C4: Partition Pruner. Applies lifted predicates (C2) to a
// [`PartitionCatalog`] (C3) entry by entry.
//
// Grounded on the teacher's `PartitionPruner` (storage/partitioning/
// pruning.rs): predicates are matched against partition bounds and
// non-matching partitions are dropped, keeping everything when the
// predicate doesn't apply to the partitioning column. Here "bounds"
// collapse to a single value per partition (filesystem directories
// carry no ranges), so matching is direct value comparison rather than
// range-overlap arithmetic.

use crate::schema::ColumnType;
use crate::sql::predicate::{Operator, Predicate, PredicateValue};
use crate::storage::catalog::{PartitionCatalog, PartitionEntry};

/// Outcome of applying predicates to a catalog.
#[derive(Debug, Clone)]
pub struct PruningResult {
    pub kept: Vec<PartitionEntry>,
    pub total_count: usize,
    pub total_size_bytes: u64,
    pub total_files: usize,
    /// The predicates that were actually observed to exclude at least
    /// one partition — not merely the predicates present in the WHERE
    /// clause. A range that doesn't exclude anything inside a
    /// fully-contained catalog doesn't belong here.
    pub predicates_applied: Vec<Predicate>,
}

impl PruningResult {
    /// Fraction of partitions eliminated, in `[0.0, 1.0]`.
    pub fn pruning_ratio(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        1.0 - (self.kept.len() as f64 / self.total_count as f64)
    }

    /// Rough scan-time speedup implied by the pruning ratio: scanning
    /// half the partitions is roughly a 2x speedup.
    pub fn speedup_estimate(&self) -> f64 {
        if self.kept.is_empty() {
            return self.total_count.max(1) as f64;
        }
        self.total_count as f64 / self.kept.len() as f64
    }

    pub fn kept_size_bytes(&self) -> u64 {
        self.kept.iter().map(|e| e.size_bytes).sum()
    }

    pub fn kept_files(&self) -> usize {
        self.kept.iter().map(|e| e.file_count).sum()
    }
}

/// Applies `predicates` (all implicitly AND-ed, as produced by lifting
/// a conjunctive WHERE clause) against `catalog`'s partitions, using
/// `column_type` to coerce textual partition directory values for
/// ordered comparisons. A predicate whose value fails to coerce is
/// skipped for that entry — kept, never dropped, per spec §4.4's
/// "never incorrectly exclude" rule.
pub fn prune(
    catalog: &PartitionCatalog,
    partition_column: &str,
    predicates: &[Predicate],
    column_type: ColumnType,
) -> PruningResult {
    let applicable: Vec<&PartitionEntry> = catalog
        .entries
        .iter()
        .filter(|e| e.column == partition_column)
        .collect();

    let kept: Vec<PartitionEntry> = catalog
        .entries
        .iter()
        .filter(|entry| {
            if entry.column != partition_column {
                return true;
            }
            predicates
                .iter()
                .all(|p| matches(&entry.value, p, column_type))
        })
        .cloned()
        .collect();

    // A predicate only "applied" if it actually excluded something: a
    // bound that every entry already satisfies contributed nothing to
    // the kept set, even though it was present in the WHERE clause.
    let predicates_applied: Vec<Predicate> = predicates
        .iter()
        .filter(|p| applicable.iter().any(|entry| !matches(&entry.value, p, column_type)))
        .cloned()
        .collect();

    PruningResult {
        total_count: catalog.entries.len(),
        total_size_bytes: catalog.total_size_bytes(),
        total_files: catalog.total_files(),
        predicates_applied,
        kept,
    }
}

fn matches(entry_value: &str, predicate: &Predicate, column_type: ColumnType) -> bool {
    match (&predicate.operator, &predicate.value) {
        (Operator::Eq, PredicateValue::Single(v)) => compare(entry_value, v, column_type) == Some(std::cmp::Ordering::Equal),
        (Operator::Neq, PredicateValue::Single(v)) => {
            compare(entry_value, v, column_type).map(|o| o != std::cmp::Ordering::Equal).unwrap_or(true)
        }
        (Operator::Lt, PredicateValue::Single(v)) => {
            compare(entry_value, v, column_type).map(|o| o.is_lt()).unwrap_or(true)
        }
        (Operator::Lte, PredicateValue::Single(v)) => {
            compare(entry_value, v, column_type).map(|o| o.is_le()).unwrap_or(true)
        }
        (Operator::Gt, PredicateValue::Single(v)) => {
            compare(entry_value, v, column_type).map(|o| o.is_gt()).unwrap_or(true)
        }
        (Operator::Gte, PredicateValue::Single(v)) => {
            compare(entry_value, v, column_type).map(|o| o.is_ge()).unwrap_or(true)
        }
        (Operator::In, PredicateValue::Multiple(values)) => values
            .iter()
            .any(|v| compare(entry_value, v, column_type) == Some(std::cmp::Ordering::Equal)),
        (Operator::Between, PredicateValue::Range(lo, hi)) => {
            let lo_ok = compare(entry_value, lo, column_type).map(|o| o.is_ge()).unwrap_or(true);
            let hi_ok = compare(entry_value, hi, column_type).map(|o| o.is_le()).unwrap_or(true);
            lo_ok && hi_ok
        }
        (Operator::IsNull, PredicateValue::None) => true, // directory-based partitions never encode NULL; keep
        _ => true,
    }
}

fn compare(entry_value: &str, predicate_value: &str, column_type: ColumnType) -> Option<std::cmp::Ordering> {
    match column_type {
        ColumnType::Integer => {
            let a: i64 = entry_value.parse().ok()?;
            let b: i64 = predicate_value.parse().ok()?;
            Some(a.cmp(&b))
        }
        ColumnType::Float => {
            let a: f64 = entry_value.parse().ok()?;
            let b: f64 = predicate_value.parse().ok()?;
            a.partial_cmp(&b)
        }
        // Date strings in `YYYY-MM-DD` form and plain varchars both
        // order correctly as lexicographic string comparisons.
        ColumnType::Date | ColumnType::Varchar | ColumnType::Boolean => {
            Some(entry_value.cmp(predicate_value))
        }
    }
}
