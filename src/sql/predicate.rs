// Predicate data model (spec §3) and the predicate lifter (C2, spec §4.2).
//
// The lifter translates a WHERE subtree into a normalized, conservative
// list of [`Predicate`]s restricted to a single partition column. Every
// rule in spec §4.2 errs toward *keeping* partitions: anything that
// can't be confidently expressed is dropped rather than guessed at.

use sqlparser::ast::{BinaryOperator, Expr, UnaryOperator, Value};

/// Comparison/membership operator of a lifted predicate, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Between,
    IsNull,
}

/// The value(s) a predicate compares against. `In`/`Between` carry more
/// than one literal; `IsNull` carries none.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    Single(String),
    Multiple(Vec<String>),
    Range(String, String),
    None,
}

/// An atomic, immutable predicate over a single partition column.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    pub value: PredicateValue,
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator: Operator::Eq,
            value: PredicateValue::Single(value.into()),
        }
    }
}

impl Operator {
    /// SQL-ish rendering for explain reports, e.g. `Operator::Gte.symbol() == ">="`.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::In => "IN",
            Operator::Between => "BETWEEN",
            Operator::IsNull => "IS NULL",
        }
    }
}

impl std::fmt::Display for PredicateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredicateValue::Single(v) => write!(f, "{v}"),
            PredicateValue::Multiple(vs) => write!(f, "({})", vs.join(", ")),
            PredicateValue::Range(lo, hi) => write!(f, "{lo} AND {hi}"),
            PredicateValue::None => Ok(()),
        }
    }
}

/// Lift a WHERE subtree into the predicates applicable to `column`.
/// Non-applicable or ambiguous sub-expressions are silently dropped —
/// dropping is always safe because the pruner treats a column with no
/// applicable predicates as "keep everything".
pub fn lift_predicates(where_expr: &Expr, column: &str) -> Vec<Predicate> {
    let mut out = Vec::new();
    lift(where_expr, column, &mut out);
    out
}

fn lift(expr: &Expr, column: &str, out: &mut Vec<Predicate>) {
    match expr {
        Expr::Nested(inner) => lift(inner, column, out),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            lift(left, column, out);
            lift(right, column, out);
        }
        Expr::BinaryOp {
            op: BinaryOperator::Or,
            ..
        } => {
            if let Some(values) = union_or_disjuncts(expr, column) {
                out.push(Predicate {
                    column: column.to_string(),
                    operator: Operator::In,
                    value: PredicateValue::Multiple(values),
                });
            }
            // Every disjunct didn't agree on this column: drop the whole
            // node, which conservatively keeps all partitions.
        }
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: inner,
        } => {
            if let Some(p) = lift_not(inner, column) {
                out.push(p);
            }
        }
        Expr::Between {
            expr: e,
            negated,
            low,
            high,
        } => {
            if !negated && is_column(e, column) {
                if let (Some(l), Some(h)) = (literal(low), literal(high)) {
                    out.push(Predicate {
                        column: column.to_string(),
                        operator: Operator::Between,
                        value: PredicateValue::Range(l, h),
                    });
                }
            }
        }
        Expr::InList {
            expr: e,
            list,
            negated,
        } => {
            if !negated && is_column(e, column) {
                let values: Option<Vec<String>> = list.iter().map(literal).collect();
                if let Some(values) = values {
                    out.push(Predicate {
                        column: column.to_string(),
                        operator: Operator::In,
                        value: PredicateValue::Multiple(values),
                    });
                }
            }
        }
        Expr::IsNull(e) => {
            if is_column(e, column) {
                out.push(Predicate {
                    column: column.to_string(),
                    operator: Operator::IsNull,
                    value: PredicateValue::None,
                });
            }
        }
        Expr::BinaryOp { left, op, right } => {
            if let Some(operator) = comparison_operator(op) {
                if is_column(left, column) {
                    if let Some(value) = literal(right) {
                        out.push(Predicate {
                            column: column.to_string(),
                            operator,
                            value: PredicateValue::Single(value),
                        });
                    }
                } else if is_column(right, column) {
                    if let Some(value) = literal(left) {
                        out.push(Predicate {
                            column: column.to_string(),
                            operator: flip(operator),
                            value: PredicateValue::Single(value),
                        });
                    }
                }
            }
        }
        // Anything else (function calls, subqueries, casts over the
        // column, ...) cannot be safely lifted.
        _ => {}
    }
}

/// NOT(cmp) normalization: NOT(col=x) -> col!=x, NOT(col<x) -> col>=x, etc.
fn lift_not(inner: &Expr, column: &str) -> Option<Predicate> {
    match inner {
        Expr::Nested(e) => lift_not(e, column),
        Expr::IsNull(e) if is_column(e, column) => None, // NOT IS NULL: not useful to lift
        Expr::BinaryOp { left, op, right } => {
            let operator = comparison_operator(op)?;
            let (col_side_is_left, literal_expr) = if is_column(left, column) {
                (true, right.as_ref())
            } else if is_column(right, column) {
                (false, left.as_ref())
            } else {
                return None;
            };
            let value = literal(literal_expr)?;
            let operator = if col_side_is_left {
                operator
            } else {
                flip(operator)
            };
            let negated = match operator {
                Operator::Eq => Operator::Neq,
                Operator::Neq => Operator::Eq,
                Operator::Lt => Operator::Gte,
                Operator::Lte => Operator::Gt,
                Operator::Gt => Operator::Lte,
                Operator::Gte => Operator::Lt,
                _ => return None,
            };
            Some(Predicate {
                column: column.to_string(),
                operator: negated,
                value: PredicateValue::Single(value),
            })
        }
        _ => None,
    }
}

/// Flatten a chain of OR nodes and union the matching values, provided
/// every disjunct constrains `column` alone (via EQ or IN).
fn union_or_disjuncts(expr: &Expr, column: &str) -> Option<Vec<String>> {
    match expr {
        Expr::Nested(inner) => union_or_disjuncts(inner, column),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => {
            let mut l = union_or_disjuncts(left, column)?;
            let r = union_or_disjuncts(right, column)?;
            l.extend(r);
            Some(l)
        }
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } => {
            if is_column(left, column) {
                literal(right).map(|v| vec![v])
            } else if is_column(right, column) {
                literal(left).map(|v| vec![v])
            } else {
                None
            }
        }
        Expr::InList {
            expr: e,
            list,
            negated: false,
        } => {
            if is_column(e, column) {
                list.iter().map(literal).collect()
            } else {
                None
            }
        }
        _ => None,
    }
}

fn comparison_operator(op: &BinaryOperator) -> Option<Operator> {
    match op {
        BinaryOperator::Eq => Some(Operator::Eq),
        BinaryOperator::NotEq => Some(Operator::Neq),
        BinaryOperator::Lt => Some(Operator::Lt),
        BinaryOperator::LtEq => Some(Operator::Lte),
        BinaryOperator::Gt => Some(Operator::Gt),
        BinaryOperator::GtEq => Some(Operator::Gte),
        _ => None,
    }
}

fn flip(op: Operator) -> Operator {
    match op {
        Operator::Lt => Operator::Gt,
        Operator::Gt => Operator::Lt,
        Operator::Lte => Operator::Gte,
        Operator::Gte => Operator::Lte,
        other => other,
    }
}

fn is_column(expr: &Expr, column: &str) -> bool {
    match expr {
        Expr::Identifier(ident) => ident.value.eq_ignore_ascii_case(column),
        Expr::CompoundIdentifier(parts) => parts
            .last()
            .is_some_and(|p| p.value.eq_ignore_ascii_case(column)),
        _ => false,
    }
}

fn literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Nested(inner) => literal(inner),
        Expr::Value(v) => value_to_string(&v.value),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr: inner,
        } => literal(inner).map(|s| format!("-{s}")),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(s, _) => Some(s.clone()),
        Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => Some(s.clone()),
        Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    fn where_of(sql: &str) -> Expr {
        let stmts = Parser::parse_sql(&GenericDialect {}, sql).unwrap();
        match &stmts[0] {
            sqlparser::ast::Statement::Query(q) => match q.body.as_ref() {
                sqlparser::ast::SetExpr::Select(s) => s.selection.clone().unwrap(),
                _ => panic!("expected select"),
            },
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn lifts_simple_equality() {
        let w = where_of("SELECT * FROM t WHERE date = '2024-11-02'");
        let preds = lift_predicates(&w, "date");
        assert_eq!(preds, vec![Predicate::eq("date", "2024-11-02")]);
    }

    #[test]
    fn drops_predicates_on_other_columns() {
        let w = where_of("SELECT * FROM t WHERE other_col = 'x'");
        let preds = lift_predicates(&w, "date");
        assert!(preds.is_empty());
    }

    #[test]
    fn flattens_conjunctions() {
        let w = where_of("SELECT * FROM t WHERE date >= '2024-01-01' AND date < '2024-02-01'");
        let preds = lift_predicates(&w, "date");
        assert_eq!(preds.len(), 2);
    }

    #[test]
    fn normalizes_not_equal() {
        let w = where_of("SELECT * FROM t WHERE NOT (date = '2024-01-01')");
        let preds = lift_predicates(&w, "date");
        assert_eq!(preds[0].operator, Operator::Neq);
    }

    #[test]
    fn normalizes_not_less_than() {
        let w = where_of("SELECT * FROM t WHERE NOT (date < '2024-01-01')");
        let preds = lift_predicates(&w, "date");
        assert_eq!(preds[0].operator, Operator::Gte);
    }

    #[test]
    fn expands_between() {
        let w = where_of("SELECT * FROM t WHERE date BETWEEN '2024-01-01' AND '2024-02-01'");
        let preds = lift_predicates(&w, "date");
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].operator, Operator::Between);
    }

    #[test]
    fn expands_in_list() {
        let w = where_of("SELECT * FROM t WHERE date IN ('2024-01-01', '2024-01-02')");
        let preds = lift_predicates(&w, "date");
        assert_eq!(preds.len(), 1);
        match &preds[0].value {
            PredicateValue::Multiple(v) => assert_eq!(v.len(), 2),
            _ => panic!("expected Multiple"),
        }
    }

    #[test]
    fn unions_or_over_same_column() {
        let w = where_of("SELECT * FROM t WHERE region = 'CA' OR region = 'OR'");
        let preds = lift_predicates(&w, "region");
        assert_eq!(preds.len(), 1);
        match &preds[0].value {
            PredicateValue::Multiple(v) => assert_eq!(v.len(), 2),
            _ => panic!("expected Multiple"),
        }
    }

    #[test]
    fn drops_or_over_different_columns() {
        let w = where_of("SELECT * FROM t WHERE region = 'CA' OR other = 'x'");
        let preds = lift_predicates(&w, "region");
        assert!(preds.is_empty());
    }

    #[test]
    fn drops_function_wrapped_column() {
        let w = where_of("SELECT * FROM t WHERE year(date) = 2024");
        let preds = lift_predicates(&w, "date");
        assert!(preds.is_empty());
    }
}
