//! Canonical textual form of an LQP, used as the logical plan cache key.
//!
//! Two statements that differ only in literal values produce the same
//! canonical form once their literals have been replaced by placeholders
//! (see `columnardb-executor::parameter_extractor`), which is exactly what
//! makes the logical cache reusable across literal variations.

use std::fmt::Write;

use crate::expr::{BinaryOperator, Expr, UnaryOperator};
use crate::plan::LogicalPlan;

pub fn canonicalize(plan: &LogicalPlan) -> String {
    let mut out = String::new();
    write_plan(plan, &mut out);
    out
}

fn write_plan(plan: &LogicalPlan, out: &mut String) {
    match plan {
        LogicalPlan::Scan { table_name, .. } => {
            let _ = write!(out, "(scan {table_name})");
        }
        LogicalPlan::Filter { input, predicate } => {
            out.push_str("(filter ");
            write_plan(input, out);
            out.push(' ');
            write_expr(predicate, out);
            out.push(')');
        }
        LogicalPlan::Project {
            input, expressions, ..
        } => {
            out.push_str("(project ");
            write_plan(input, out);
            for e in expressions {
                out.push(' ');
                write_expr(e, out);
            }
            out.push(')');
        }
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggregates,
            ..
        } => {
            out.push_str("(aggregate ");
            write_plan(input, out);
            out.push_str(" group[");
            for e in group_by {
                write_expr(e, out);
                out.push(',');
            }
            out.push_str("] agg[");
            for e in aggregates {
                write_expr(e, out);
                out.push(',');
            }
            out.push_str("])");
        }
        LogicalPlan::Join {
            left,
            right,
            join_type,
            condition,
        } => {
            let _ = write!(out, "(join {join_type:?} ");
            write_plan(left, out);
            out.push(' ');
            write_plan(right, out);
            if let Some(c) = condition {
                out.push(' ');
                write_expr(c, out);
            }
            out.push(')');
        }
        LogicalPlan::Sort { input, sort_exprs } => {
            out.push_str("(sort ");
            write_plan(input, out);
            for s in sort_exprs {
                out.push(' ');
                write_expr(&s.expr, out);
                out.push_str(if s.ascending { "+" } else { "-" });
            }
            out.push(')');
        }
        LogicalPlan::Limit {
            input,
            limit,
            offset,
        } => {
            out.push_str("(limit ");
            write_plan(input, out);
            let _ = write!(out, " {limit:?} {offset:?})");
        }
        LogicalPlan::Distinct { input } => {
            out.push_str("(distinct ");
            write_plan(input, out);
            out.push(')');
        }
        LogicalPlan::Values { rows, .. } => {
            let _ = write!(out, "(values rows={})", rows.len());
        }
        LogicalPlan::Insert {
            table_name, source, ..
        } => {
            let _ = write!(out, "(insert {table_name} ");
            write_plan(source, out);
            out.push(')');
        }
        LogicalPlan::CreateTable {
            table_name,
            if_not_exists,
            ..
        } => {
            let _ = write!(out, "(create_table {table_name} {if_not_exists})");
        }
        LogicalPlan::DropTable {
            table_names,
            if_exists,
        } => {
            let _ = write!(out, "(drop_table {table_names:?} {if_exists})");
        }
        LogicalPlan::CreateView {
            name,
            query,
            if_not_exists,
        } => {
            let _ = write!(out, "(create_view {name} {if_not_exists} ");
            write_plan(query, out);
            out.push(')');
        }
        LogicalPlan::DropView { name, if_exists } => {
            let _ = write!(out, "(drop_view {name} {if_exists})");
        }
        LogicalPlan::CreatePreparedPlan { name, query } => {
            let _ = write!(out, "(prepare {name} ");
            write_plan(query, out);
            out.push(')');
        }
        LogicalPlan::Import {
            table_name,
            file_path,
        } => {
            let _ = write!(out, "(import {table_name} {file_path})");
        }
        LogicalPlan::Explain { input } => {
            out.push_str("(explain ");
            write_plan(input, out);
            out.push(')');
        }
    }
}

fn write_expr(expr: &Expr, out: &mut String) {
    match expr {
        Expr::Literal(v) => {
            let _ = write!(out, "{v:?}");
        }
        Expr::Placeholder { parameter_id, .. } => {
            let _ = write!(out, "?{parameter_id}");
        }
        Expr::Column { table, name } => {
            if let Some(t) = table {
                let _ = write!(out, "{t}.{name}");
            } else {
                out.push_str(name);
            }
        }
        Expr::BinaryOp { op, left, right } => {
            out.push('(');
            write_expr(left, out);
            let _ = write!(out, " {} ", binary_op_symbol(*op));
            write_expr(right, out);
            out.push(')');
        }
        Expr::UnaryOp { op, expr } => {
            let sym = match op {
                UnaryOperator::Not => "NOT",
                UnaryOperator::Negate => "-",
            };
            let _ = write!(out, "({sym} ");
            write_expr(expr, out);
            out.push(')');
        }
        Expr::Function { name, args } => {
            let _ = write!(out, "{name}(");
            for (i, a) in args.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_expr(a, out);
            }
            out.push(')');
        }
        Expr::Alias { expr, name } => {
            write_expr(expr, out);
            let _ = write!(out, " AS {name}");
        }
    }
}

fn binary_op_symbol(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Eq => "=",
        BinaryOperator::NotEq => "<>",
        BinaryOperator::Lt => "<",
        BinaryOperator::LtEq => "<=",
        BinaryOperator::Gt => ">",
        BinaryOperator::GtEq => ">=",
        BinaryOperator::And => "AND",
        BinaryOperator::Or => "OR",
        BinaryOperator::Plus => "+",
        BinaryOperator::Minus => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => "/",
    }
}

#[cfg(test)]
mod tests {
    use columnardb_common::{DataType, Value};

    use super::*;
    use crate::schema::PlanSchema;

    fn scan() -> LogicalPlan {
        LogicalPlan::Scan {
            table_name: "t".into(),
            schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
        }
    }

    #[test]
    fn templates_with_different_parameter_ids_are_still_equal_in_shape() {
        let a = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::binary(
                BinaryOperator::Eq,
                Expr::column("a"),
                Expr::Placeholder {
                    parameter_id: 0,
                    data_type: DataType::Int64,
                },
            ),
        };
        assert_eq!(canonicalize(&a), canonicalize(&a.clone()));
    }

    #[test]
    fn literal_values_do_not_leak_into_templates_after_extraction() {
        let with_literal = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::binary(BinaryOperator::Eq, Expr::column("a"), Expr::literal(Value::Int64(6))),
        };
        let with_placeholder = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::binary(
                BinaryOperator::Eq,
                Expr::column("a"),
                Expr::Placeholder {
                    parameter_id: 0,
                    data_type: DataType::Int64,
                },
            ),
        };
        assert_ne!(canonicalize(&with_literal), canonicalize(&with_placeholder));
    }
}
