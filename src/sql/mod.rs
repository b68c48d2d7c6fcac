// C1: SQL Facade. Thin wrapper over `sqlparser` that the rest of the
// router depends on instead of depending on `sqlparser` directly —
// swapping dialects or parser versions stays a one-file change.

pub mod predicate;
pub mod walk;

use crate::error::{Result, RouterError};
use crate::schema::SchemaMap;
use sqlparser::ast::Statement;
use sqlparser::dialect::{
    Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SnowflakeDialect,
};
use sqlparser::parser::Parser;

fn resolve_dialect(tag: &str) -> Box<dyn Dialect> {
    match tag.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Box::new(PostgreSqlDialect {}),
        "mysql" => Box::new(MySqlDialect {}),
        "snowflake" => Box::new(SnowflakeDialect {}),
        _ => Box::new(GenericDialect {}),
    }
}

/// Parses, validates, and renders SQL for a single dialect. Cheap to
/// clone: it only stores the dialect tag and re-resolves the `Dialect`
/// object per call.
#[derive(Debug, Clone)]
pub struct SqlFacade {
    dialect_tag: String,
}

impl SqlFacade {
    pub fn new(dialect_tag: impl Into<String>) -> Self {
        Self {
            dialect_tag: dialect_tag.into(),
        }
    }

    pub fn parse(&self, sql: &str) -> Result<Statement> {
        let dialect = resolve_dialect(&self.dialect_tag);
        let mut statements = Parser::parse_sql(dialect.as_ref(), sql)
            .map_err(|e| RouterError::ParseError(e.to_string()))?;
        if statements.is_empty() {
            return Err(RouterError::ParseError("empty statement".to_string()));
        }
        if statements.len() > 1 {
            return Err(RouterError::ParseError(
                "only a single statement is supported".to_string(),
            ));
        }
        Ok(statements.remove(0))
    }

    /// Validates referenced columns against an optional schema hint and
    /// returns the statement unchanged. `sqlparser` has no rule-based
    /// rewriter of its own, so "optimize" here means exactly what spec
    /// §4.1 asks for: surface unknown columns, not rewrite the query.
    pub fn optimize(&self, stmt: &Statement, schema: Option<&SchemaMap>) -> Statement {
        if let Some(schema) = schema {
            for table in walk::tables(stmt) {
                let Some(columns) = schema.get(&table) else {
                    continue;
                };
                for predicate in collect_identifiers(stmt) {
                    if !columns.contains_key(&predicate) {
                        tracing::warn!(
                            table = %table,
                            column = %predicate,
                            "column referenced in query not present in schema hint"
                        );
                    }
                }
            }
        }
        stmt.clone()
    }

    pub fn tables(&self, stmt: &Statement) -> Vec<String> {
        walk::tables(stmt)
    }

    pub fn where_of(&self, stmt: &Statement) -> Option<sqlparser::ast::Expr> {
        walk::where_of(stmt)
    }

    pub fn render(&self, stmt: &Statement) -> String {
        stmt.to_string()
    }
}

impl Default for SqlFacade {
    fn default() -> Self {
        Self::new("generic")
    }
}

/// Column identifiers appearing anywhere in the WHERE clause, for the
/// schema-hint warning pass above. Best-effort: only bare and
/// compound identifiers are collected, consistent with
/// `predicate::is_column`'s notion of "a column reference".
fn collect_identifiers(stmt: &Statement) -> Vec<String> {
    use sqlparser::ast::Expr;

    fn walk_expr(expr: &Expr, out: &mut Vec<String>) {
        match expr {
            Expr::Identifier(ident) => out.push(ident.value.clone()),
            Expr::CompoundIdentifier(parts) => {
                if let Some(last) = parts.last() {
                    out.push(last.value.clone());
                }
            }
            Expr::Nested(inner) | Expr::UnaryOp { expr: inner, .. } | Expr::IsNull(inner) => {
                walk_expr(inner, out)
            }
            Expr::BinaryOp { left, right, .. } => {
                walk_expr(left, out);
                walk_expr(right, out);
            }
            Expr::Between { expr, low, high, .. } => {
                walk_expr(expr, out);
                walk_expr(low, out);
                walk_expr(high, out);
            }
            Expr::InList { expr, list, .. } => {
                walk_expr(expr, out);
                for item in list {
                    walk_expr(item, out);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    if let Some(where_expr) = walk::where_of(stmt) {
        walk_expr(&where_expr, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_select() {
        let facade = SqlFacade::default();
        let stmt = facade.parse("SELECT * FROM sales WHERE date = '2024-01-01'").unwrap();
        assert_eq!(facade.tables(&stmt), vec!["sales".to_string()]);
        assert!(facade.where_of(&stmt).is_some());
    }

    #[test]
    fn rejects_unparseable_sql() {
        let facade = SqlFacade::default();
        assert!(facade.parse("SELECT FROM WHERE").is_err());
    }

    #[test]
    fn rejects_multiple_statements() {
        let facade = SqlFacade::default();
        assert!(facade
            .parse("SELECT * FROM a; SELECT * FROM b;")
            .is_err());
    }

    #[test]
    fn renders_back_to_sql() {
        let facade = SqlFacade::default();
        let stmt = facade.parse("SELECT * FROM sales").unwrap();
        assert!(facade.render(&stmt).to_uppercase().contains("SELECT"));
    }

    #[test]
    fn resolves_join_tables() {
        let facade = SqlFacade::default();
        let stmt = facade
            .parse("SELECT * FROM sales s JOIN regions r ON s.region_id = r.id")
            .unwrap();
        assert_eq!(facade.tables(&stmt), vec!["sales".to_string(), "regions".to_string()]);
    }
}
