// C5: Feature Extractor. Walks the optimized AST and the pruning
// result into the complexity signal the cost estimator (C6) consumes.
//
// Grounded on `original_source`'s `feature_extractor.py`: the counting
// rules (joins, aggregations, window functions, DISTINCT, ORDER BY) and
// the selectivity heuristic (0.1^e for e equality predicates, 0.5 for
// range-only, clamped to [0.01, 1.0]) are carried over verbatim, walked
// against `sqlparser`'s AST instead of `sqlglot`'s.

use crate::sql::walk;
use sqlparser::ast::{DuplicateTreatment, Expr, FunctionArguments, GroupByExpr, Select, SelectItem, Statement};

/// Query complexity signal used by [`crate::cost`] to estimate
/// per-engine execution time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryFeatures {
    pub estimated_scan_size_gb: f64,
    pub num_joins: u32,
    pub num_aggregations: u32,
    pub num_window_functions: u32,
    pub has_distinct: bool,
    pub has_order_by: bool,
    pub selectivity: f64,
}

impl QueryFeatures {
    /// Weighted complexity score: joins and window functions dominate,
    /// aggregations and result-shaping ops contribute less.
    pub fn complexity_score(&self) -> f64 {
        let mut score = 0.0;
        score += self.num_joins as f64 * 2.0;
        score += self.num_aggregations as f64 * 1.0;
        score += self.num_window_functions as f64 * 3.0;
        score += if self.has_distinct { 1.0 } else { 0.0 };
        score += if self.has_order_by { 0.5 } else { 0.0 };
        score
    }
}

const AGGREGATE_FUNCTION_NAMES: &[&str] = &[
    "count", "sum", "avg", "min", "max", "group_concat", "array_agg", "stddev", "variance",
    "stddev_samp", "var_samp",
];

/// Extracts complexity features from a statement already passed
/// through [`crate::sql::SqlFacade::optimize`], using `scan_size_gb`
/// from the pruning result (C4) as the data-volume input.
pub fn extract_features(stmt: &Statement, scan_size_gb: f64) -> QueryFeatures {
    let selects = walk::selects_of(stmt);

    let num_joins = walk::count_joins(stmt);
    let num_aggregations = count_aggregations(&selects);
    let num_window_functions = count_window_functions(&selects);
    let has_distinct = has_distinct(&selects);
    let has_order_by = walk::top_query(stmt)
        .map(|q| q.order_by.is_some())
        .unwrap_or(false);
    let selectivity = estimate_selectivity(stmt);

    QueryFeatures {
        estimated_scan_size_gb: scan_size_gb,
        num_joins,
        num_aggregations,
        num_window_functions,
        has_distinct,
        has_order_by,
        selectivity,
    }
}

fn count_aggregations(selects: &[&Select]) -> u32 {
    let mut count = 0u32;
    let mut has_group_by = false;

    for select in selects {
        if has_group_by_clause(&select.group_by) {
            has_group_by = true;
        }
        for item in &select.projection {
            count += count_agg_in_select_item(item);
        }
    }

    if has_group_by {
        count.max(1)
    } else {
        count
    }
}

/// `GroupByExpr` is an enum, not a collection: `All` covers `GROUP BY
/// ALL`, `Expressions` carries the explicit column list.
fn has_group_by_clause(group_by: &GroupByExpr) -> bool {
    match group_by {
        GroupByExpr::All(_) => true,
        GroupByExpr::Expressions(exprs, _) => !exprs.is_empty(),
    }
}

fn count_agg_in_select_item(item: &SelectItem) -> u32 {
    match item {
        SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
            count_agg_in_expr(expr)
        }
        _ => 0,
    }
}

fn count_agg_in_expr(expr: &Expr) -> u32 {
    match expr {
        Expr::Function(f) => {
            let name = f.name.to_string().to_ascii_lowercase();
            let mut count = if AGGREGATE_FUNCTION_NAMES.contains(&name.as_str()) {
                1
            } else {
                0
            };
            if let FunctionArguments::List(list) = &f.args {
                for arg in &list.args {
                    if let sqlparser::ast::FunctionArg::Unnamed(
                        sqlparser::ast::FunctionArgExpr::Expr(inner),
                    ) = arg
                    {
                        count += count_agg_in_expr(inner);
                    }
                }
            }
            count
        }
        Expr::Nested(inner) | Expr::UnaryOp { expr: inner, .. } => count_agg_in_expr(inner),
        Expr::BinaryOp { left, right, .. } => count_agg_in_expr(left) + count_agg_in_expr(right),
        Expr::Cast { expr: inner, .. } => count_agg_in_expr(inner),
        _ => 0,
    }
}

fn count_window_functions(selects: &[&Select]) -> u32 {
    let mut count = 0u32;
    for select in selects {
        for item in &select.projection {
            if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } = item {
                count += count_windows_in_expr(expr);
            }
        }
    }
    count
}

fn count_windows_in_expr(expr: &Expr) -> u32 {
    match expr {
        Expr::Function(f) if f.over.is_some() => 1,
        Expr::Nested(inner) | Expr::UnaryOp { expr: inner, .. } => count_windows_in_expr(inner),
        Expr::BinaryOp { left, right, .. } => {
            count_windows_in_expr(left) + count_windows_in_expr(right)
        }
        _ => 0,
    }
}

/// True for top-level `SELECT DISTINCT` as well as `COUNT(DISTINCT
/// col)` anywhere in the projection — both force the engine to
/// deduplicate rows, which matters for cost estimation the same way.
fn has_distinct(selects: &[&Select]) -> bool {
    selects.iter().any(|s| {
        s.distinct.is_some() || s.projection.iter().any(projection_item_has_distinct_count)
    })
}

fn projection_item_has_distinct_count(item: &SelectItem) -> bool {
    match item {
        SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
            expr_has_distinct_count(expr)
        }
        _ => false,
    }
}

fn expr_has_distinct_count(expr: &Expr) -> bool {
    match expr {
        Expr::Function(f) => {
            if f.name.to_string().eq_ignore_ascii_case("count") {
                if let FunctionArguments::List(list) = &f.args {
                    if matches!(list.duplicate_treatment, Some(DuplicateTreatment::Distinct)) {
                        return true;
                    }
                }
            }
            false
        }
        Expr::Nested(inner) | Expr::UnaryOp { expr: inner, .. } => expr_has_distinct_count(inner),
        Expr::BinaryOp { left, right, .. } => {
            expr_has_distinct_count(left) || expr_has_distinct_count(right)
        }
        Expr::Cast { expr: inner, .. } => expr_has_distinct_count(inner),
        _ => false,
    }
}

/// Heuristic estimate of the fraction of rows a query returns,
/// independent of partition pruning: equality predicates are assumed
/// highly selective (10% each, compounding), bare range predicates
/// assumed to let half the rows through, and a WHERE clause with
/// neither assumed 50% as a conservative default.
fn estimate_selectivity(stmt: &Statement) -> f64 {
    let Some(where_expr) = walk::where_of(stmt) else {
        return 1.0;
    };

    let mut num_eq = 0u32;
    let mut num_range = 0u32;
    count_comparisons(&where_expr, &mut num_eq, &mut num_range);

    let selectivity = if num_eq > 0 {
        0.1f64.powi(num_eq as i32)
    } else if num_range > 0 {
        0.5
    } else {
        0.5
    };

    selectivity.clamp(0.01, 1.0)
}

fn count_comparisons(expr: &Expr, num_eq: &mut u32, num_range: &mut u32) {
    use sqlparser::ast::BinaryOperator as Op;
    match expr {
        Expr::Nested(inner) => count_comparisons(inner, num_eq, num_range),
        Expr::BinaryOp {
            left,
            op: Op::And | Op::Or,
            right,
        } => {
            count_comparisons(left, num_eq, num_range);
            count_comparisons(right, num_eq, num_range);
        }
        Expr::BinaryOp { op: Op::Eq, .. } => *num_eq += 1,
        Expr::BinaryOp {
            op: Op::Gt | Op::GtEq | Op::Lt | Op::LtEq,
            ..
        } => *num_range += 1,
        _ => {}
    }
}
