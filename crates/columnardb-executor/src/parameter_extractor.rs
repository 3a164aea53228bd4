//! Parameter extraction: rewriting an LQP's literals into placeholders plus
//! an ordered value vector, so two statements that differ only in their
//! literal values can share one cache template.
//!
//! The reference executor dedups repeated literals by pointer identity on a
//! shared `Arc`-based AST (`replaced_by` back-pointers in its parameter
//! binder). This crate's `LogicalPlan`/`Expr` trees are plain owned trees
//! with no node sharing, so that scenario cannot arise here: every literal
//! occurrence gets its own fresh parameter id, assigned in traversal order.
//! That also makes the pass trivially idempotent — a plan with all literals
//! already extracted has none left for a second pass to find.
//!
//! Traversal order is plan nodes top-down, and within each node's own
//! expressions, arguments before the expression that contains them (mirrors
//! `columnardb_ir::expr`'s documented convention), so parameter ids are
//! stable and reproducible for a given plan shape.
//!
//! A `NULL` literal is left in place rather than parameterized: binding a
//! placeholder to a different, non-`NULL` value later would silently change
//! a plan's `IS NULL`-style shape, so `NULL` is never a candidate for
//! extraction.

use columnardb_common::Value;
use columnardb_common::error::{Error, Result};
use columnardb_ir::{Expr, LogicalPlan};

/// A plan with every literal replaced by a `Placeholder`, plus the values
/// those placeholders stood in for, in ascending `parameter_id` order.
#[derive(Debug, Clone)]
pub struct ExtractedParameters {
    pub plan: LogicalPlan,
    pub values: Vec<Value>,
}

pub fn extract_parameters(plan: LogicalPlan) -> ExtractedParameters {
    let mut values = Vec::new();
    let plan = extract_plan(plan, &mut values);
    ExtractedParameters { plan, values }
}

fn extract_plan(plan: LogicalPlan, values: &mut Vec<Value>) -> LogicalPlan {
    match plan {
        LogicalPlan::Scan { .. }
        | LogicalPlan::CreateTable { .. }
        | LogicalPlan::DropTable { .. }
        | LogicalPlan::DropView { .. }
        | LogicalPlan::Import { .. } => plan,
        LogicalPlan::Filter { input, predicate } => LogicalPlan::Filter {
            input: Box::new(extract_plan(*input, values)),
            predicate: extract_expr(predicate, values),
        },
        LogicalPlan::Project {
            input,
            expressions,
            schema,
        } => LogicalPlan::Project {
            input: Box::new(extract_plan(*input, values)),
            expressions: expressions.into_iter().map(|e| extract_expr(e, values)).collect(),
            schema,
        },
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggregates,
            schema,
        } => LogicalPlan::Aggregate {
            input: Box::new(extract_plan(*input, values)),
            group_by: group_by.into_iter().map(|e| extract_expr(e, values)).collect(),
            aggregates: aggregates.into_iter().map(|e| extract_expr(e, values)).collect(),
            schema,
        },
        LogicalPlan::Join {
            left,
            right,
            join_type,
            condition,
        } => LogicalPlan::Join {
            left: Box::new(extract_plan(*left, values)),
            right: Box::new(extract_plan(*right, values)),
            join_type,
            condition: condition.map(|e| extract_expr(e, values)),
        },
        LogicalPlan::Sort { input, sort_exprs } => LogicalPlan::Sort {
            input: Box::new(extract_plan(*input, values)),
            sort_exprs,
        },
        LogicalPlan::Limit { input, limit, offset } => LogicalPlan::Limit {
            input: Box::new(extract_plan(*input, values)),
            limit,
            offset,
        },
        LogicalPlan::Distinct { input } => LogicalPlan::Distinct {
            input: Box::new(extract_plan(*input, values)),
        },
        LogicalPlan::Values { rows, schema } => LogicalPlan::Values {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|e| extract_expr(e, values)).collect())
                .collect(),
            schema,
        },
        LogicalPlan::Insert {
            table_name,
            columns,
            source,
        } => LogicalPlan::Insert {
            table_name,
            columns,
            source: Box::new(extract_plan(*source, values)),
        },
        LogicalPlan::CreateView {
            name,
            query,
            if_not_exists,
        } => LogicalPlan::CreateView {
            name,
            query: Box::new(extract_plan(*query, values)),
            if_not_exists,
        },
        LogicalPlan::CreatePreparedPlan { name, query } => LogicalPlan::CreatePreparedPlan {
            name,
            query: Box::new(extract_plan(*query, values)),
        },
        LogicalPlan::Explain { input } => LogicalPlan::Explain {
            input: Box::new(extract_plan(*input, values)),
        },
    }
}

fn extract_expr(expr: Expr, values: &mut Vec<Value>) -> Expr {
    match expr {
        Expr::Literal(value) if value.is_null() => Expr::Literal(value),
        Expr::Literal(value) => {
            let data_type = value.data_type();
            let parameter_id = values.len();
            values.push(value);
            Expr::Placeholder { parameter_id, data_type }
        }
        Expr::Placeholder { .. } | Expr::Column { .. } => expr,
        Expr::BinaryOp { op, left, right } => Expr::BinaryOp {
            op,
            left: Box::new(extract_expr(*left, values)),
            right: Box::new(extract_expr(*right, values)),
        },
        Expr::UnaryOp { op, expr } => Expr::UnaryOp {
            op,
            expr: Box::new(extract_expr(*expr, values)),
        },
        Expr::Function { name, args } => Expr::Function {
            name,
            args: args.into_iter().map(|a| extract_expr(a, values)).collect(),
        },
        Expr::Alias { expr, name } => Expr::Alias {
            expr: Box::new(extract_expr(*expr, values)),
            name,
        },
    }
}

/// Binds `values` into `plan`'s placeholders, producing a plan with no
/// `Placeholder` nodes left. Used by prepared-statement execution
/// (`prepared_plan.rs`) to turn a cache template back into an executable
/// plan for a particular set of bind values.
pub fn bind_parameters(plan: LogicalPlan, values: &[Value]) -> Result<LogicalPlan> {
    bind_plan(plan, values)
}

fn bind_plan(plan: LogicalPlan, values: &[Value]) -> Result<LogicalPlan> {
    Ok(match plan {
        LogicalPlan::Scan { .. }
        | LogicalPlan::CreateTable { .. }
        | LogicalPlan::DropTable { .. }
        | LogicalPlan::DropView { .. }
        | LogicalPlan::Import { .. } => plan,
        LogicalPlan::Filter { input, predicate } => LogicalPlan::Filter {
            input: Box::new(bind_plan(*input, values)?),
            predicate: bind_expr(predicate, values)?,
        },
        LogicalPlan::Project {
            input,
            expressions,
            schema,
        } => LogicalPlan::Project {
            input: Box::new(bind_plan(*input, values)?),
            expressions: expressions
                .into_iter()
                .map(|e| bind_expr(e, values))
                .collect::<Result<_>>()?,
            schema,
        },
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggregates,
            schema,
        } => LogicalPlan::Aggregate {
            input: Box::new(bind_plan(*input, values)?),
            group_by: group_by.into_iter().map(|e| bind_expr(e, values)).collect::<Result<_>>()?,
            aggregates: aggregates
                .into_iter()
                .map(|e| bind_expr(e, values))
                .collect::<Result<_>>()?,
            schema,
        },
        LogicalPlan::Join {
            left,
            right,
            join_type,
            condition,
        } => LogicalPlan::Join {
            left: Box::new(bind_plan(*left, values)?),
            right: Box::new(bind_plan(*right, values)?),
            join_type,
            condition: condition.map(|e| bind_expr(e, values)).transpose()?,
        },
        LogicalPlan::Sort { input, sort_exprs } => LogicalPlan::Sort {
            input: Box::new(bind_plan(*input, values)?),
            sort_exprs,
        },
        LogicalPlan::Limit { input, limit, offset } => LogicalPlan::Limit {
            input: Box::new(bind_plan(*input, values)?),
            limit,
            offset,
        },
        LogicalPlan::Distinct { input } => LogicalPlan::Distinct {
            input: Box::new(bind_plan(*input, values)?),
        },
        LogicalPlan::Values { rows, schema } => LogicalPlan::Values {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|e| bind_expr(e, values)).collect::<Result<_>>())
                .collect::<Result<_>>()?,
            schema,
        },
        LogicalPlan::Insert {
            table_name,
            columns,
            source,
        } => LogicalPlan::Insert {
            table_name,
            columns,
            source: Box::new(bind_plan(*source, values)?),
        },
        LogicalPlan::CreateView {
            name,
            query,
            if_not_exists,
        } => LogicalPlan::CreateView {
            name,
            query: Box::new(bind_plan(*query, values)?),
            if_not_exists,
        },
        LogicalPlan::CreatePreparedPlan { name, query } => LogicalPlan::CreatePreparedPlan {
            name,
            query: Box::new(bind_plan(*query, values)?),
        },
        LogicalPlan::Explain { input } => LogicalPlan::Explain {
            input: Box::new(bind_plan(*input, values)?),
        },
    })
}

fn bind_expr(expr: Expr, values: &[Value]) -> Result<Expr> {
    Ok(match expr {
        Expr::Placeholder { parameter_id, data_type } => {
            let value = values.get(parameter_id).ok_or_else(|| Error::ArityMismatch {
                expected: parameter_id + 1,
                actual: values.len(),
            })?;
            if value.data_type() != data_type && !value.is_null() {
                return Err(Error::TypeMismatch {
                    expected: data_type.to_string(),
                    actual: value.data_type().to_string(),
                });
            }
            Expr::Literal(value.clone())
        }
        Expr::Literal(_) | Expr::Column { .. } => expr,
        Expr::BinaryOp { op, left, right } => Expr::BinaryOp {
            op,
            left: Box::new(bind_expr(*left, values)?),
            right: Box::new(bind_expr(*right, values)?),
        },
        Expr::UnaryOp { op, expr } => Expr::UnaryOp {
            op,
            expr: Box::new(bind_expr(*expr, values)?),
        },
        Expr::Function { name, args } => Expr::Function {
            name,
            args: args.into_iter().map(|a| bind_expr(a, values)).collect::<Result<_>>()?,
        },
        Expr::Alias { expr, name } => Expr::Alias {
            expr: Box::new(bind_expr(*expr, values)?),
            name,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnardb_common::DataType;
    use columnardb_ir::{BinaryOperator, PlanSchema};

    fn scan() -> LogicalPlan {
        LogicalPlan::Scan {
            table_name: "t".into(),
            schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
        }
    }

    #[test]
    fn extract_replaces_literal_with_placeholder() {
        let plan = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::binary(BinaryOperator::Eq, Expr::column("a"), Expr::literal(Value::Int64(7))),
        };
        let extracted = extract_parameters(plan);
        assert_eq!(extracted.values, vec![Value::Int64(7)]);
        match extracted.plan {
            LogicalPlan::Filter { predicate, .. } => match predicate {
                Expr::BinaryOp { right, .. } => {
                    assert!(matches!(*right, Expr::Placeholder { parameter_id: 0, .. }));
                }
                _ => panic!("expected BinaryOp"),
            },
            _ => panic!("expected Filter"),
        }
    }

    #[test]
    fn extract_assigns_ids_in_traversal_order_across_two_literals() {
        let plan = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::binary(
                BinaryOperator::And,
                Expr::binary(BinaryOperator::Gt, Expr::column("a"), Expr::literal(Value::Int64(1))),
                Expr::binary(BinaryOperator::Lt, Expr::column("a"), Expr::literal(Value::Int64(10))),
            ),
        };
        let extracted = extract_parameters(plan);
        assert_eq!(extracted.values, vec![Value::Int64(1), Value::Int64(10)]);
    }

    #[test]
    fn bind_parameters_round_trips_the_original_literal() {
        let plan = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::binary(BinaryOperator::Eq, Expr::column("a"), Expr::literal(Value::Int64(7))),
        };
        let extracted = extract_parameters(plan);
        let bound = bind_parameters(extracted.plan, &[Value::Int64(99)]).unwrap();
        match bound {
            LogicalPlan::Filter { predicate, .. } => match predicate {
                Expr::BinaryOp { right, .. } => {
                    assert_eq!(*right, Expr::Literal(Value::Int64(99)));
                }
                _ => panic!("expected BinaryOp"),
            },
            _ => panic!("expected Filter"),
        }
    }

    #[test]
    fn bind_parameters_rejects_too_few_values() {
        let plan = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::binary(BinaryOperator::Eq, Expr::column("a"), Expr::literal(Value::Int64(7))),
        };
        let extracted = extract_parameters(plan);
        let err = bind_parameters(extracted.plan, &[]).unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { .. }));
    }

    #[test]
    fn bind_parameters_rejects_mismatched_type() {
        let plan = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::binary(BinaryOperator::Eq, Expr::column("a"), Expr::literal(Value::Int64(7))),
        };
        let extracted = extract_parameters(plan);
        let err = bind_parameters(extracted.plan, &[Value::String("oops".into())]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn null_literal_is_left_in_place_and_not_parameterized() {
        let plan = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::binary(BinaryOperator::Eq, Expr::column("a"), Expr::literal(Value::Null)),
        };
        let extracted = extract_parameters(plan);
        assert!(extracted.values.is_empty());
        match extracted.plan {
            LogicalPlan::Filter { predicate, .. } => match predicate {
                Expr::BinaryOp { right, .. } => {
                    assert_eq!(*right, Expr::Literal(Value::Null));
                }
                _ => panic!("expected BinaryOp"),
            },
            _ => panic!("expected Filter"),
        }
    }

    #[test]
    fn plan_with_no_literals_is_unchanged_by_extraction() {
        let plan = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::column("a"),
        };
        let extracted = extract_parameters(plan.clone());
        assert!(extracted.values.is_empty());
        assert_eq!(format!("{extracted:?}", extracted = extracted.plan), format!("{plan:?}"));
    }
}
