//! Translates a `ParsedStatement` into a `TranslatedPlan`. Mirrors the
//! reference translator's constructor taking a
//! `use_mvcc` flag: that flag only ever affects `TranslatedPlan::validated_for_mvcc`,
//! never the shape of the plan itself.

use sqlparser::ast::{
    BinaryOperator as SqlBinaryOp, Expr as SqlExpr, Query, SelectItem, SetExpr, TableFactor,
    UnaryOperator as SqlUnaryOp, Value as SqlValue,
};

use columnardb_common::error::{Error, Result};
use columnardb_common::{DataType, Value};

use crate::expr::{BinaryOperator, Expr, UnaryOperator};
use crate::parser::ParsedStatement;
use crate::plan::{LogicalPlan, TranslatedPlan};
use crate::schema::PlanSchema;

/// Schema lookups the translator needs from the storage layer. Kept as a
/// trait so `columnardb-ir` does not depend on `columnardb-storage`
/// directly (the reference translator takes its catalog the same way,
/// as a narrow interface rather than a concrete manager).
pub trait CatalogProvider {
    fn get_table_schema(&self, name: &str) -> Option<PlanSchema>;
    fn get_view_query(&self, name: &str) -> Option<LogicalPlan>;
}

pub fn translate(
    stmt: &ParsedStatement,
    catalog: &dyn CatalogProvider,
    use_mvcc: bool,
) -> Result<TranslatedPlan> {
    let plan = match stmt {
        ParsedStatement::Select(query) => translate_query(query, catalog)?,
        ParsedStatement::CreateTable {
            name,
            columns,
            if_not_exists,
        } => LogicalPlan::CreateTable {
            table_name: name.clone(),
            columns: columns.clone(),
            if_not_exists: *if_not_exists,
        },
        ParsedStatement::DropTable { names, if_exists } => LogicalPlan::DropTable {
            table_names: names.clone(),
            if_exists: *if_exists,
        },
        ParsedStatement::CreateView {
            name,
            query,
            if_not_exists,
        } => LogicalPlan::CreateView {
            name: name.clone(),
            query: Box::new(translate_query(query, catalog)?),
            if_not_exists: *if_not_exists,
        },
        ParsedStatement::DropView { name, if_exists } => LogicalPlan::DropView {
            name: name.clone(),
            if_exists: *if_exists,
        },
        ParsedStatement::Insert {
            table,
            columns,
            values,
        } => {
            let schema = catalog
                .get_table_schema(table)
                .ok_or_else(|| Error::translation_error(format!("table '{table}' not found")))?;
            let rows = values
                .iter()
                .map(|row| row.iter().cloned().map(Expr::literal).collect())
                .collect();
            LogicalPlan::Insert {
                table_name: table.clone(),
                columns: if columns.is_empty() {
                    schema.column_names().iter().map(|s| s.to_string()).collect()
                } else {
                    columns.clone()
                },
                source: Box::new(LogicalPlan::Values {
                    rows,
                    schema: schema.clone(),
                }),
            }
        }
        ParsedStatement::Import { table, file_path } => LogicalPlan::Import {
            table_name: table.clone(),
            file_path: file_path.clone(),
        },
        ParsedStatement::Prepare { name, query } => LogicalPlan::CreatePreparedPlan {
            name: name.clone(),
            query: Box::new(translate_query(query, catalog)?),
        },
    };
    Ok(TranslatedPlan::new(plan, use_mvcc))
}

fn translate_query(query: &Query, catalog: &dyn CatalogProvider) -> Result<LogicalPlan> {
    match query.body.as_ref() {
        SetExpr::Select(select) => {
            if select.from.is_empty() {
                return Err(Error::translation_error("SELECT without FROM is not supported"));
            }
            if select.from.len() > 1 {
                return Err(Error::translation_error(
                    "multiple FROM items require an explicit JOIN",
                ));
            }
            let table_with_joins = &select.from[0];
            if !table_with_joins.joins.is_empty() {
                return Err(Error::translation_error("JOIN translation is not supported yet"));
            }
            let table_name = match &table_with_joins.relation {
                TableFactor::Table { name, .. } => name.to_string(),
                other => {
                    return Err(Error::translation_error(format!(
                        "unsupported FROM clause: {other}"
                    )))
                }
            };
            let schema = catalog
                .get_view_query(&table_name)
                .map(|p| p.schema())
                .or_else(|| catalog.get_table_schema(&table_name))
                .ok_or_else(|| {
                    Error::translation_error(format!("table '{table_name}' not found"))
                })?;

            let mut plan = LogicalPlan::Scan {
                table_name: table_name.clone(),
                schema: schema.clone(),
            };

            if let Some(selection) = &select.selection {
                let predicate = translate_sql_expr(selection)?;
                plan = LogicalPlan::Filter {
                    input: Box::new(plan),
                    predicate,
                };
            }

            let (expressions, out_schema) = translate_projection(&select.projection, &schema)?;
            let is_star = select.projection.len() == 1
                && matches!(select.projection[0], SelectItem::Wildcard(_));
            if !is_star {
                plan = LogicalPlan::Project {
                    input: Box::new(plan),
                    expressions,
                    schema: out_schema,
                };
            }
            Ok(plan)
        }
        other => Err(Error::translation_error(format!(
            "unsupported query body: {other}"
        ))),
    }
}

fn translate_projection(
    items: &[SelectItem],
    input_schema: &PlanSchema,
) -> Result<(Vec<Expr>, PlanSchema)> {
    let mut exprs = Vec::new();
    let mut cols = Vec::new();
    for item in items {
        match item {
            SelectItem::Wildcard(_) => {
                for (name, ty) in input_schema.columns() {
                    exprs.push(Expr::column(name.clone()));
                    cols.push((name.clone(), *ty));
                }
            }
            SelectItem::UnnamedExpr(e) => {
                let expr = translate_sql_expr(e)?;
                let name = expr_display_name(&expr);
                let ty = infer_type(&expr, input_schema);
                cols.push((name, ty));
                exprs.push(expr);
            }
            SelectItem::ExprWithAlias { expr, alias } => {
                let inner = translate_sql_expr(expr)?;
                let ty = infer_type(&inner, input_schema);
                let aliased = Expr::Alias {
                    expr: Box::new(inner),
                    name: alias.value.clone(),
                };
                cols.push((alias.value.clone(), ty));
                exprs.push(aliased);
            }
            other => {
                return Err(Error::translation_error(format!(
                    "unsupported select item: {other}"
                )))
            }
        }
    }
    Ok((exprs, PlanSchema::new(cols)))
}

fn expr_display_name(expr: &Expr) -> String {
    match expr {
        Expr::Column { name, .. } => name.clone(),
        Expr::Alias { name, .. } => name.clone(),
        _ => "?column?".to_string(),
    }
}

fn infer_type(expr: &Expr, schema: &PlanSchema) -> DataType {
    match expr {
        Expr::Column { name, .. } => schema.data_type_of(name).unwrap_or(DataType::Null),
        Expr::Literal(v) => v.data_type(),
        Expr::BinaryOp { op, .. } if matches!(op, BinaryOperator::And | BinaryOperator::Or) => {
            DataType::Boolean
        }
        Expr::BinaryOp {
            op:
                BinaryOperator::Eq
                | BinaryOperator::NotEq
                | BinaryOperator::Lt
                | BinaryOperator::LtEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq,
            ..
        } => DataType::Boolean,
        _ => DataType::Null,
    }
}

fn translate_sql_expr(expr: &SqlExpr) -> Result<Expr> {
    match expr {
        SqlExpr::Identifier(ident) => Ok(Expr::column(ident.value.clone())),
        SqlExpr::CompoundIdentifier(parts) => {
            if parts.len() == 2 {
                Ok(Expr::Column {
                    table: Some(parts[0].value.clone()),
                    name: parts[1].value.clone(),
                })
            } else {
                Err(Error::translation_error("unsupported compound identifier"))
            }
        }
        SqlExpr::Value(v) => translate_sql_value(v),
        SqlExpr::Nested(inner) => translate_sql_expr(inner),
        SqlExpr::BinaryOp { left, op, right } => {
            let op = translate_binary_op(op)?;
            Ok(Expr::binary(
                op,
                translate_sql_expr(left)?,
                translate_sql_expr(right)?,
            ))
        }
        SqlExpr::UnaryOp { op, expr } => {
            let op = match op {
                SqlUnaryOp::Not => UnaryOperator::Not,
                SqlUnaryOp::Minus => UnaryOperator::Negate,
                other => {
                    return Err(Error::translation_error(format!(
                        "unsupported unary operator: {other}"
                    )))
                }
            };
            Ok(Expr::UnaryOp {
                op,
                expr: Box::new(translate_sql_expr(expr)?),
            })
        }
        other => Err(Error::translation_error(format!(
            "unsupported expression: {other}"
        ))),
    }
}

fn translate_sql_value(v: &SqlValue) -> Result<Expr> {
    let value = match v {
        SqlValue::Number(n, _) => {
            if let Ok(i) = n.parse::<i64>() {
                Value::Int64(i)
            } else {
                let f = n
                    .parse::<f64>()
                    .map_err(|_| Error::translation_error(format!("invalid numeric literal: {n}")))?;
                Value::Float64(f)
            }
        }
        SqlValue::SingleQuotedString(s) | SqlValue::DoubleQuotedString(s) => {
            Value::String(s.clone())
        }
        SqlValue::Boolean(b) => Value::Boolean(*b),
        SqlValue::Null => Value::Null,
        other => {
            return Err(Error::translation_error(format!(
                "unsupported literal: {other}"
            )))
        }
    };
    Ok(Expr::literal(value))
}

fn translate_binary_op(op: &SqlBinaryOp) -> Result<BinaryOperator> {
    Ok(match op {
        SqlBinaryOp::Eq => BinaryOperator::Eq,
        SqlBinaryOp::NotEq => BinaryOperator::NotEq,
        SqlBinaryOp::Lt => BinaryOperator::Lt,
        SqlBinaryOp::LtEq => BinaryOperator::LtEq,
        SqlBinaryOp::Gt => BinaryOperator::Gt,
        SqlBinaryOp::GtEq => BinaryOperator::GtEq,
        SqlBinaryOp::And => BinaryOperator::And,
        SqlBinaryOp::Or => BinaryOperator::Or,
        SqlBinaryOp::Plus => BinaryOperator::Plus,
        SqlBinaryOp::Minus => BinaryOperator::Minus,
        SqlBinaryOp::Multiply => BinaryOperator::Multiply,
        SqlBinaryOp::Divide => BinaryOperator::Divide,
        other => {
            return Err(Error::translation_error(format!(
                "unsupported binary operator: {other}"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_statement;

    struct FakeCatalog;
    impl CatalogProvider for FakeCatalog {
        fn get_table_schema(&self, name: &str) -> Option<PlanSchema> {
            if name == "t" {
                Some(PlanSchema::new(vec![
                    ("a".into(), DataType::Int64),
                    ("b".into(), DataType::String),
                ]))
            } else {
                None
            }
        }

        fn get_view_query(&self, _name: &str) -> Option<LogicalPlan> {
            None
        }
    }

    #[test]
    fn translates_select_with_where_into_scan_filter_project() {
        let stmt = parse_statement("SELECT a FROM t WHERE a = 6").unwrap();
        let translated = translate(&stmt, &FakeCatalog, false).unwrap();
        assert!(translated.cacheable);
        match translated.plan {
            LogicalPlan::Project { input, .. } => match *input {
                LogicalPlan::Filter { input, .. } => {
                    assert!(matches!(*input, LogicalPlan::Scan { .. }));
                }
                _ => panic!("expected Filter"),
            },
            _ => panic!("expected Project"),
        }
    }

    #[test]
    fn missing_table_is_a_translation_error() {
        let stmt = parse_statement("SELECT a FROM missing").unwrap();
        let err = translate(&stmt, &FakeCatalog, false).unwrap_err();
        assert!(matches!(err, Error::TranslationError(_)));
    }

    #[test]
    fn create_table_is_never_cacheable() {
        let stmt = parse_statement("CREATE TABLE t (a INT)").unwrap();
        let translated = translate(&stmt, &FakeCatalog, false).unwrap();
        assert!(!translated.cacheable);
    }

    #[test]
    fn select_star_skips_the_project_node() {
        let stmt = parse_statement("SELECT * FROM t").unwrap();
        let translated = translate(&stmt, &FakeCatalog, false).unwrap();
        assert!(matches!(translated.plan, LogicalPlan::Scan { .. }));
    }
}
