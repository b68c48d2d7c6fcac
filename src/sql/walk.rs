// Shared AST-walking helpers. The router keeps the raw `sqlparser` AST
// as the working representation (Design Notes §9: "only small
// projections cross into the typed core") rather than converting to an
// intermediate statement enum, so both the facade (C1) and the feature
// extractor (C5) walk it directly through this module.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor};

/// All `SELECT` blocks reachable from a statement's top-level query,
/// including both sides of set operations (UNION/INTERSECT/EXCEPT).
/// Subqueries nested inside FROM/WHERE are intentionally not descended
/// into — multi-table/subquery pruning is out of scope (spec §1).
pub fn selects_of(stmt: &Statement) -> Vec<&Select> {
    let mut out = Vec::new();
    if let Statement::Query(query) = stmt {
        collect_from_set_expr(&query.body, &mut out);
    }
    out
}

pub fn top_query(stmt: &Statement) -> Option<&Query> {
    match stmt {
        Statement::Query(q) => Some(q),
        _ => None,
    }
}

fn collect_from_set_expr<'a>(set_expr: &'a SetExpr, out: &mut Vec<&'a Select>) {
    match set_expr {
        SetExpr::Select(select) => out.push(select),
        SetExpr::Query(query) => collect_from_set_expr(&query.body, out),
        SetExpr::SetOperation { left, right, .. } => {
            collect_from_set_expr(left, out);
            collect_from_set_expr(right, out);
        }
        _ => {}
    }
}

/// Base table names referenced by the statement, in source (left to
/// right, depth-first) order, including join targets.
pub fn tables(stmt: &Statement) -> Vec<String> {
    let mut names = Vec::new();
    for select in selects_of(stmt) {
        for twj in &select.from {
            collect_table_factor(&twj.relation, &mut names);
            for join in &twj.joins {
                collect_table_factor(&join.relation, &mut names);
            }
        }
    }
    names
}

fn collect_table_factor(relation: &TableFactor, out: &mut Vec<String>) {
    if let TableFactor::Table { name, .. } = relation {
        out.push(name.to_string());
    }
}

/// The WHERE clause of the first `SELECT` block, if any.
pub fn where_of(stmt: &Statement) -> Option<sqlparser::ast::Expr> {
    selects_of(stmt).first().and_then(|s| s.selection.clone())
}

/// Total number of JOIN clauses across all FROM items in all SELECT
/// blocks, any flavor (inner, left, right, full, cross).
pub fn count_joins(stmt: &Statement) -> u32 {
    selects_of(stmt)
        .iter()
        .flat_map(|s| s.from.iter())
        .map(|twj| twj.joins.len() as u32)
        .sum()
}
