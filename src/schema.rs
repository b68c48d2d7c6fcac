// Table schema registry.
//
// Grounded on `catalog/mod.rs`'s `Schema`/`Catalog` shape (a
// `HashMap` behind a lock, no persistence) but scoped down to just the
// column-type map the router needs: predicate-value coercion (spec
// §4.4) and `optimize()`'s column-existence check (SPEC_FULL §9).

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Column types the router understands. `Date`/`Integer`/`Varchar` are
/// the partition-coercion types named in spec §4.4; `Boolean`/`Float`
/// round out the set so non-partition columns referenced in a query
/// have something to validate against too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ColumnType {
    Date,
    Integer,
    Varchar,
    Boolean,
    Float,
}

/// Ad hoc, per-call schema hint accepted by `optimize`/`execute`
/// (spec §4.10's `schema?` parameter) — distinct from the persistent
/// [`SchemaRegistry`] populated by `register_schema`.
pub type SchemaMap = HashMap<String, HashMap<String, ColumnType>>;

#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    pub columns: HashMap<String, ColumnType>,
}

impl TableSchema {
    pub fn new(columns: HashMap<String, ColumnType>) -> Self {
        Self { columns }
    }

    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns.get(column).copied()
    }
}

/// In-memory registry of table schemas. Cheap to clone (shared innards),
/// matching the teacher's `Catalog` shape.
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    tables: Arc<RwLock<HashMap<String, TableSchema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, table: impl Into<String>, columns: HashMap<String, ColumnType>) {
        self.tables
            .write()
            .insert(table.into(), TableSchema::new(columns));
    }

    pub fn get(&self, table: &str) -> Option<TableSchema> {
        self.tables.read().get(table).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup() {
        let registry = SchemaRegistry::new();
        let mut cols = HashMap::new();
        cols.insert("date".to_string(), ColumnType::Date);
        registry.register("sales", cols);

        let schema = registry.get("sales").unwrap();
        assert_eq!(schema.column_type("date"), Some(ColumnType::Date));
        assert_eq!(schema.column_type("missing"), None);
    }

    #[test]
    fn unknown_table_is_none() {
        let registry = SchemaRegistry::new();
        assert!(registry.get("nope").is_none());
    }
}
