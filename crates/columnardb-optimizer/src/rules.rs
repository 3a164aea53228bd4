//! Individual rewrite rules, each a pure `LogicalPlan -> LogicalPlan`
//! transform applied bottom-up. Grounded on the shape of the reference
//! optimizer's `apply_*` pass functions (`fold_constants`,
//! `apply_trivial_predicate_removal`, `apply_empty_propagation`,
//! `apply_filter_merging`), reworked to operate on this crate's simpler LQP
//! instead of producing a `PhysicalPlan` directly.

use columnardb_common::Value;
use columnardb_ir::{BinaryOperator, Expr, LogicalPlan};

/// Folds binary expressions whose operands are both literals into a single
/// literal. Leaves placeholders untouched, which is what keeps this rule
/// safe to run on a cache template before parameter binding.
pub fn fold_constants(plan: LogicalPlan) -> LogicalPlan {
    map_exprs(plan, &fold_constants_expr)
}

fn fold_constants_expr(expr: Expr) -> Expr {
    match expr {
        Expr::BinaryOp { op, left, right } => {
            let left = fold_constants_expr(*left);
            let right = fold_constants_expr(*right);
            if let (Expr::Literal(l), Expr::Literal(r)) = (&left, &right) {
                if let Some(folded) = evaluate_binary(op, l, r) {
                    return Expr::Literal(folded);
                }
            }
            Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        Expr::UnaryOp { op, expr } => Expr::UnaryOp {
            op,
            expr: Box::new(fold_constants_expr(*expr)),
        },
        Expr::Function { name, args } => Expr::Function {
            name,
            args: args.into_iter().map(fold_constants_expr).collect(),
        },
        Expr::Alias { expr, name } => Expr::Alias {
            expr: Box::new(fold_constants_expr(*expr)),
            name,
        },
        other => other,
    }
}

fn evaluate_binary(op: BinaryOperator, l: &Value, r: &Value) -> Option<Value> {
    use BinaryOperator::*;
    match op {
        Eq | NotEq | Lt | LtEq | Gt | GtEq => {
            let ordering = l.partial_compare(r)?;
            let result = match op {
                Eq => ordering.is_eq(),
                NotEq => !ordering.is_eq(),
                Lt => ordering.is_lt(),
                LtEq => ordering.is_le(),
                Gt => ordering.is_gt(),
                GtEq => ordering.is_ge(),
                _ => unreachable!(),
            };
            Some(Value::Boolean(result))
        }
        And => match (l, r) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(Value::Boolean(*a && *b)),
            _ => None,
        },
        Or => match (l, r) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(Value::Boolean(*a || *b)),
            _ => None,
        },
        Plus | Minus | Multiply | Divide => match (l, r) {
            (Value::Int64(a), Value::Int64(b)) => match op {
                Plus => Some(Value::Int64(a + b)),
                Minus => Some(Value::Int64(a - b)),
                Multiply => Some(Value::Int64(a * b)),
                Divide if *b != 0 => Some(Value::Int64(a / b)),
                _ => None,
            },
            (Value::Float64(a), Value::Float64(b)) => match op {
                Plus => Some(Value::Float64(a + b)),
                Minus => Some(Value::Float64(a - b)),
                Multiply => Some(Value::Float64(a * b)),
                Divide => Some(Value::Float64(a / b)),
                _ => None,
            },
            _ => None,
        },
    }
}

/// Removes a `Filter` whose predicate folded down to the literal `true`.
pub fn apply_trivial_predicate_removal(plan: LogicalPlan) -> LogicalPlan {
    map_plan_bottom_up(plan, &|node| match node {
        LogicalPlan::Filter { input, predicate } => {
            if matches!(predicate, Expr::Literal(Value::Boolean(true))) {
                *input
            } else {
                LogicalPlan::Filter { input, predicate }
            }
        }
        other => other,
    })
}

/// Replaces a subtree rooted at a `Filter` whose predicate folded down to
/// the literal `false` with an empty `Values` node of the same schema, so
/// the rest of the plan (and the operators that run it) never sees rows it
/// can statically prove will not exist.
pub fn apply_empty_propagation(plan: LogicalPlan) -> LogicalPlan {
    map_plan_bottom_up(plan, &|node| match node {
        LogicalPlan::Filter { input, predicate } => {
            if matches!(predicate, Expr::Literal(Value::Boolean(false))) {
                LogicalPlan::Values {
                    rows: Vec::new(),
                    schema: input.schema(),
                }
            } else {
                LogicalPlan::Filter { input, predicate }
            }
        }
        other => other,
    })
}

/// Merges two directly-nested filters into one conjunction, so the
/// scheduler only has to run a single filter operator instead of two.
pub fn apply_filter_merging(plan: LogicalPlan) -> LogicalPlan {
    map_plan_bottom_up(plan, &|node| match node {
        LogicalPlan::Filter { input, predicate } => match *input {
            LogicalPlan::Filter {
                input: inner_input,
                predicate: inner_predicate,
            } => LogicalPlan::Filter {
                input: inner_input,
                predicate: Expr::binary(BinaryOperator::And, inner_predicate, predicate),
            },
            other_input => LogicalPlan::Filter {
                input: Box::new(other_input),
                predicate,
            },
        },
        other => other,
    })
}

/// Drops a `Project` whose expressions are exactly its input's columns, in
/// order: it contributes nothing but an extra operator to schedule.
pub fn apply_redundant_project_elimination(plan: LogicalPlan) -> LogicalPlan {
    map_plan_bottom_up(plan, &|node| match node {
        LogicalPlan::Project {
            input,
            expressions,
            schema,
        } => {
            let input_schema = input.schema();
            let is_identity = expressions.len() == input_schema.len()
                && expressions.iter().zip(input_schema.columns()).all(|(e, (name, _))| {
                    matches!(e, Expr::Column { table: None, name: col_name } if col_name == name)
                });
            if is_identity {
                *input
            } else {
                LogicalPlan::Project {
                    input,
                    expressions,
                    schema,
                }
            }
        }
        other => other,
    })
}

/// Applies `f` to every expression reachable from `plan`'s nodes, without
/// changing plan shape.
fn map_exprs(plan: LogicalPlan, f: &impl Fn(Expr) -> Expr) -> LogicalPlan {
    map_plan_bottom_up(plan, &|node| rewrite_node_exprs(node, f))
}

fn rewrite_node_exprs(node: LogicalPlan, f: &impl Fn(Expr) -> Expr) -> LogicalPlan {
    match node {
        LogicalPlan::Filter { input, predicate } => LogicalPlan::Filter {
            input,
            predicate: f(predicate),
        },
        LogicalPlan::Project {
            input,
            expressions,
            schema,
        } => LogicalPlan::Project {
            input,
            expressions: expressions.into_iter().map(f).collect(),
            schema,
        },
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggregates,
            schema,
        } => LogicalPlan::Aggregate {
            input,
            group_by: group_by.into_iter().map(f).collect(),
            aggregates: aggregates.into_iter().map(f).collect(),
            schema,
        },
        LogicalPlan::Join {
            left,
            right,
            join_type,
            condition,
        } => LogicalPlan::Join {
            left,
            right,
            join_type,
            condition: condition.map(f),
        },
        LogicalPlan::Values { rows, schema } => LogicalPlan::Values {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(&f).collect())
                .collect(),
            schema,
        },
        other => other,
    }
}

/// Post-order traversal applying `f` to every node, from the leaves up.
/// Bottom-up order matters: rules like filter merging need their child
/// already rewritten before they inspect its shape.
fn map_plan_bottom_up(plan: LogicalPlan, f: &impl Fn(LogicalPlan) -> LogicalPlan) -> LogicalPlan {
    let rewritten = match plan {
        LogicalPlan::Filter { input, predicate } => LogicalPlan::Filter {
            input: Box::new(map_plan_bottom_up(*input, f)),
            predicate,
        },
        LogicalPlan::Project {
            input,
            expressions,
            schema,
        } => LogicalPlan::Project {
            input: Box::new(map_plan_bottom_up(*input, f)),
            expressions,
            schema,
        },
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggregates,
            schema,
        } => LogicalPlan::Aggregate {
            input: Box::new(map_plan_bottom_up(*input, f)),
            group_by,
            aggregates,
            schema,
        },
        LogicalPlan::Join {
            left,
            right,
            join_type,
            condition,
        } => LogicalPlan::Join {
            left: Box::new(map_plan_bottom_up(*left, f)),
            right: Box::new(map_plan_bottom_up(*right, f)),
            join_type,
            condition,
        },
        LogicalPlan::Sort { input, sort_exprs } => LogicalPlan::Sort {
            input: Box::new(map_plan_bottom_up(*input, f)),
            sort_exprs,
        },
        LogicalPlan::Limit {
            input,
            limit,
            offset,
        } => LogicalPlan::Limit {
            input: Box::new(map_plan_bottom_up(*input, f)),
            limit,
            offset,
        },
        LogicalPlan::Distinct { input } => LogicalPlan::Distinct {
            input: Box::new(map_plan_bottom_up(*input, f)),
        },
        LogicalPlan::Insert {
            table_name,
            columns,
            source,
        } => LogicalPlan::Insert {
            table_name,
            columns,
            source: Box::new(map_plan_bottom_up(*source, f)),
        },
        LogicalPlan::CreateView {
            name,
            query,
            if_not_exists,
        } => LogicalPlan::CreateView {
            name,
            query: Box::new(map_plan_bottom_up(*query, f)),
            if_not_exists,
        },
        LogicalPlan::CreatePreparedPlan { name, query } => LogicalPlan::CreatePreparedPlan {
            name,
            query: Box::new(map_plan_bottom_up(*query, f)),
        },
        LogicalPlan::Explain { input } => LogicalPlan::Explain {
            input: Box::new(map_plan_bottom_up(*input, f)),
        },
        leaf @ (LogicalPlan::Scan { .. }
        | LogicalPlan::Values { .. }
        | LogicalPlan::CreateTable { .. }
        | LogicalPlan::DropTable { .. }
        | LogicalPlan::DropView { .. }
        | LogicalPlan::Import { .. }) => leaf,
    };
    f(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnardb_ir::PlanSchema;
    use columnardb_common::DataType;

    fn scan() -> LogicalPlan {
        LogicalPlan::Scan {
            table_name: "t".into(),
            schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
        }
    }

    #[test]
    fn fold_constants_collapses_literal_comparison() {
        let plan = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::binary(
                BinaryOperator::Eq,
                Expr::literal(Value::Int64(1)),
                Expr::literal(Value::Int64(1)),
            ),
        };
        let folded = fold_constants(plan);
        match folded {
            LogicalPlan::Filter { predicate, .. } => {
                assert_eq!(predicate, Expr::Literal(Value::Boolean(true)));
            }
            _ => panic!("expected Filter"),
        }
    }

    #[test]
    fn trivial_predicate_removal_drops_always_true_filter() {
        let plan = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::Literal(Value::Boolean(true)),
        };
        let result = apply_trivial_predicate_removal(plan);
        assert!(matches!(result, LogicalPlan::Scan { .. }));
    }

    #[test]
    fn empty_propagation_replaces_always_false_filter_with_empty_values() {
        let plan = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::Literal(Value::Boolean(false)),
        };
        let result = apply_empty_propagation(plan);
        match result {
            LogicalPlan::Values { rows, .. } => assert!(rows.is_empty()),
            _ => panic!("expected empty Values"),
        }
    }

    #[test]
    fn filter_merging_combines_nested_filters_with_and() {
        let plan = LogicalPlan::Filter {
            input: Box::new(LogicalPlan::Filter {
                input: Box::new(scan()),
                predicate: Expr::binary(BinaryOperator::Gt, Expr::column("a"), Expr::literal(Value::Int64(0))),
            }),
            predicate: Expr::binary(BinaryOperator::Lt, Expr::column("a"), Expr::literal(Value::Int64(10))),
        };
        let merged = apply_filter_merging(plan);
        match merged {
            LogicalPlan::Filter { input, predicate } => {
                assert!(matches!(*input, LogicalPlan::Scan { .. }));
                assert!(matches!(predicate, Expr::BinaryOp { op: BinaryOperator::And, .. }));
            }
            _ => panic!("expected single merged Filter"),
        }
    }

    #[test]
    fn redundant_project_elimination_drops_identity_projection() {
        let plan = LogicalPlan::Project {
            input: Box::new(scan()),
            expressions: vec![Expr::column("a")],
            schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
        };
        let result = apply_redundant_project_elimination(plan);
        assert!(matches!(result, LogicalPlan::Scan { .. }));
    }
}
