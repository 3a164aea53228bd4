//! The physical operator tree.
//!
//! Every node is a `PhysicalOperator` wrapping an `OperatorKind`. `execute`
//! is idempotent (a second call is a no-op once `output` is populated,
//! mirroring the reference operator base class's guarded `_on_execute`),
//! `get_output` exposes the cached result, and `deep_copy` produces a fresh,
//! unexecuted copy of the same tree — the piece that lets a cached PQP
//! template be re-used by re-copying and re-running it rather than mutating
//! the cached tree in place.

use std::collections::HashSet;

use columnardb_common::error::{Error, Result};
use columnardb_common::{ColumnInfo, QueryResult, Row, TransactionContext, Value};
use columnardb_ir::{Expr, JoinType, LogicalPlan, PlanSchema, SortExpr};
use columnardb_storage::StorageManager;

use crate::eval::{eval, eval_is_truthy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorType {
    TableScan,
    Filter,
    Projection,
    Aggregate,
    Join,
    Sort,
    Limit,
    Distinct,
    ValuesScan,
    Insert,
    CreateTable,
    DropTable,
    CreateView,
    DropView,
    CreatePreparedPlan,
    Import,
    Explain,
}

#[derive(Debug, Clone)]
pub enum OperatorKind {
    TableScan {
        table_name: String,
        schema: PlanSchema,
    },
    Filter {
        input: Box<PhysicalOperator>,
        predicate: Expr,
    },
    Projection {
        input: Box<PhysicalOperator>,
        expressions: Vec<Expr>,
        schema: PlanSchema,
    },
    Aggregate {
        input: Box<PhysicalOperator>,
        group_by: Vec<Expr>,
        aggregates: Vec<Expr>,
        schema: PlanSchema,
    },
    Join {
        left: Box<PhysicalOperator>,
        right: Box<PhysicalOperator>,
        join_type: JoinType,
        condition: Option<Expr>,
    },
    Sort {
        input: Box<PhysicalOperator>,
        sort_exprs: Vec<SortExpr>,
    },
    Limit {
        input: Box<PhysicalOperator>,
        limit: Option<usize>,
        offset: Option<usize>,
    },
    Distinct {
        input: Box<PhysicalOperator>,
    },
    ValuesScan {
        rows: Vec<Vec<Expr>>,
        schema: PlanSchema,
    },
    Insert {
        table_name: String,
        columns: Vec<String>,
        source: Box<PhysicalOperator>,
    },
    CreateTable {
        table_name: String,
        columns: Vec<(String, columnardb_common::DataType)>,
        if_not_exists: bool,
    },
    DropTable {
        table_names: Vec<String>,
        if_exists: bool,
    },
    CreateView {
        name: String,
        query: LogicalPlan,
        if_not_exists: bool,
    },
    DropView {
        name: String,
        if_exists: bool,
    },
    CreatePreparedPlan {
        name: String,
        query: LogicalPlan,
    },
    Import {
        table_name: String,
        file_path: String,
    },
    Explain {
        input: Box<PhysicalOperator>,
    },
}

#[derive(Debug, Clone)]
pub struct PhysicalOperator {
    pub kind: OperatorKind,
    output: Option<QueryResult>,
    transaction_context: Option<TransactionContext>,
}

impl PhysicalOperator {
    pub fn new(kind: OperatorKind) -> Self {
        Self {
            kind,
            output: None,
            transaction_context: None,
        }
    }

    pub fn operator_type(&self) -> OperatorType {
        match &self.kind {
            OperatorKind::TableScan { .. } => OperatorType::TableScan,
            OperatorKind::Filter { .. } => OperatorType::Filter,
            OperatorKind::Projection { .. } => OperatorType::Projection,
            OperatorKind::Aggregate { .. } => OperatorType::Aggregate,
            OperatorKind::Join { .. } => OperatorType::Join,
            OperatorKind::Sort { .. } => OperatorType::Sort,
            OperatorKind::Limit { .. } => OperatorType::Limit,
            OperatorKind::Distinct { .. } => OperatorType::Distinct,
            OperatorKind::ValuesScan { .. } => OperatorType::ValuesScan,
            OperatorKind::Insert { .. } => OperatorType::Insert,
            OperatorKind::CreateTable { .. } => OperatorType::CreateTable,
            OperatorKind::DropTable { .. } => OperatorType::DropTable,
            OperatorKind::CreateView { .. } => OperatorType::CreateView,
            OperatorKind::DropView { .. } => OperatorType::DropView,
            OperatorKind::CreatePreparedPlan { .. } => OperatorType::CreatePreparedPlan,
            OperatorKind::Import { .. } => OperatorType::Import,
            OperatorKind::Explain { .. } => OperatorType::Explain,
        }
    }

    /// The left (or only) input operator, if any.
    pub fn left_input(&self) -> Option<&PhysicalOperator> {
        match &self.kind {
            OperatorKind::Filter { input, .. }
            | OperatorKind::Projection { input, .. }
            | OperatorKind::Aggregate { input, .. }
            | OperatorKind::Sort { input, .. }
            | OperatorKind::Limit { input, .. }
            | OperatorKind::Distinct { input }
            | OperatorKind::Insert { source: input, .. }
            | OperatorKind::Explain { input } => Some(input),
            OperatorKind::Join { left, .. } => Some(left),
            _ => None,
        }
    }

    pub fn right_input(&self) -> Option<&PhysicalOperator> {
        match &self.kind {
            OperatorKind::Join { right, .. } => Some(right),
            _ => None,
        }
    }

    pub fn get_output(&self) -> Option<&QueryResult> {
        self.output.as_ref()
    }

    /// Sets the same transaction context on this node and every descendant,
    /// so MVCC-aware table access sees a single, consistent context no
    /// matter which subtree touches storage first.
    pub fn set_transaction_context_recursively(&mut self, ctx: TransactionContext) {
        self.transaction_context = Some(ctx.clone());
        match &mut self.kind {
            OperatorKind::Filter { input, .. }
            | OperatorKind::Projection { input, .. }
            | OperatorKind::Aggregate { input, .. }
            | OperatorKind::Sort { input, .. }
            | OperatorKind::Limit { input, .. }
            | OperatorKind::Distinct { input }
            | OperatorKind::Insert { source: input, .. }
            | OperatorKind::Explain { input } => input.set_transaction_context_recursively(ctx),
            OperatorKind::Join { left, right, .. } => {
                left.set_transaction_context_recursively(ctx.clone());
                right.set_transaction_context_recursively(ctx);
            }
            _ => {}
        }
    }

    /// A fresh, unexecuted copy of this operator tree: the instantiated PQP
    /// for a cache hit is always run through `deep_copy` first so the
    /// cached template itself never accumulates execution state.
    pub fn deep_copy(&self) -> PhysicalOperator {
        let kind = match &self.kind {
            OperatorKind::TableScan { table_name, schema } => OperatorKind::TableScan {
                table_name: table_name.clone(),
                schema: schema.clone(),
            },
            OperatorKind::Filter { input, predicate } => OperatorKind::Filter {
                input: Box::new(input.deep_copy()),
                predicate: predicate.clone(),
            },
            OperatorKind::Projection {
                input,
                expressions,
                schema,
            } => OperatorKind::Projection {
                input: Box::new(input.deep_copy()),
                expressions: expressions.clone(),
                schema: schema.clone(),
            },
            OperatorKind::Aggregate {
                input,
                group_by,
                aggregates,
                schema,
            } => OperatorKind::Aggregate {
                input: Box::new(input.deep_copy()),
                group_by: group_by.clone(),
                aggregates: aggregates.clone(),
                schema: schema.clone(),
            },
            OperatorKind::Join {
                left,
                right,
                join_type,
                condition,
            } => OperatorKind::Join {
                left: Box::new(left.deep_copy()),
                right: Box::new(right.deep_copy()),
                join_type: *join_type,
                condition: condition.clone(),
            },
            OperatorKind::Sort { input, sort_exprs } => OperatorKind::Sort {
                input: Box::new(input.deep_copy()),
                sort_exprs: sort_exprs.clone(),
            },
            OperatorKind::Limit {
                input,
                limit,
                offset,
            } => OperatorKind::Limit {
                input: Box::new(input.deep_copy()),
                limit: *limit,
                offset: *offset,
            },
            OperatorKind::Distinct { input } => OperatorKind::Distinct {
                input: Box::new(input.deep_copy()),
            },
            OperatorKind::ValuesScan { rows, schema } => OperatorKind::ValuesScan {
                rows: rows.clone(),
                schema: schema.clone(),
            },
            OperatorKind::Insert {
                table_name,
                columns,
                source,
            } => OperatorKind::Insert {
                table_name: table_name.clone(),
                columns: columns.clone(),
                source: Box::new(source.deep_copy()),
            },
            OperatorKind::CreateTable {
                table_name,
                columns,
                if_not_exists,
            } => OperatorKind::CreateTable {
                table_name: table_name.clone(),
                columns: columns.clone(),
                if_not_exists: *if_not_exists,
            },
            OperatorKind::DropTable {
                table_names,
                if_exists,
            } => OperatorKind::DropTable {
                table_names: table_names.clone(),
                if_exists: *if_exists,
            },
            OperatorKind::CreateView {
                name,
                query,
                if_not_exists,
            } => OperatorKind::CreateView {
                name: name.clone(),
                query: query.clone(),
                if_not_exists: *if_not_exists,
            },
            OperatorKind::DropView { name, if_exists } => OperatorKind::DropView {
                name: name.clone(),
                if_exists: *if_exists,
            },
            OperatorKind::CreatePreparedPlan { name, query } => OperatorKind::CreatePreparedPlan {
                name: name.clone(),
                query: query.clone(),
            },
            OperatorKind::Import {
                table_name,
                file_path,
            } => OperatorKind::Import {
                table_name: table_name.clone(),
                file_path: file_path.clone(),
            },
            OperatorKind::Explain { input } => OperatorKind::Explain {
                input: Box::new(input.deep_copy()),
            },
        };
        PhysicalOperator::new(kind)
    }

    /// Runs this node (recursively executing its inputs first) and caches
    /// the result. A second call is a no-op, matching the reference
    /// operator base class's execute-once guarantee.
    pub fn execute(&mut self, storage: &StorageManager) -> Result<()> {
        if self.output.is_some() {
            return Ok(());
        }
        let output = match &mut self.kind {
            OperatorKind::TableScan { table_name, schema } => {
                let rows = storage
                    .get_table_rows(table_name)
                    .ok_or_else(|| Error::TableNotFound(table_name.clone()))?;
                QueryResult::new(schema_to_columns(schema), rows)
            }
            OperatorKind::Filter { input, predicate } => {
                input.execute(storage)?;
                let in_result = input.get_output().expect("just executed");
                let schema = columns_to_schema(&in_result.schema);
                let mut rows = Vec::new();
                for row in &in_result.rows {
                    if eval_is_truthy(predicate, row, &schema)? {
                        rows.push(row.clone());
                    }
                }
                QueryResult::new(in_result.schema.clone(), rows)
            }
            OperatorKind::Projection {
                input,
                expressions,
                schema,
            } => {
                input.execute(storage)?;
                let in_result = input.get_output().expect("just executed");
                let in_schema = columns_to_schema(&in_result.schema);
                let mut rows = Vec::with_capacity(in_result.rows.len());
                for row in &in_result.rows {
                    let mut values = Vec::with_capacity(expressions.len());
                    for e in expressions.iter() {
                        values.push(eval(e, row, &in_schema)?);
                    }
                    rows.push(Row::new(values));
                }
                QueryResult::new(schema_to_columns(schema), rows)
            }
            OperatorKind::Aggregate {
                input,
                group_by,
                aggregates,
                schema,
            } => {
                input.execute(storage)?;
                let in_result = input.get_output().expect("just executed");
                let in_schema = columns_to_schema(&in_result.schema);
                let rows = crate::aggregate::run(&in_result.rows, &in_schema, group_by, aggregates)?;
                QueryResult::new(schema_to_columns(schema), rows)
            }
            OperatorKind::Join {
                left,
                right,
                join_type,
                condition,
            } => {
                left.execute(storage)?;
                right.execute(storage)?;
                let left_result = left.get_output().expect("just executed").clone();
                let right_result = right.get_output().expect("just executed").clone();
                crate::join::run(&left_result, &right_result, *join_type, condition.as_ref())?
            }
            OperatorKind::Sort { input, sort_exprs } => {
                input.execute(storage)?;
                let in_result = input.get_output().expect("just executed");
                let in_schema = columns_to_schema(&in_result.schema);
                let mut rows = in_result.rows.clone();
                let keys: Vec<Vec<Value>> = rows
                    .iter()
                    .map(|row| {
                        sort_exprs
                            .iter()
                            .map(|s| eval(&s.expr, row, &in_schema))
                            .collect::<Result<Vec<Value>>>()
                    })
                    .collect::<Result<Vec<Vec<Value>>>>()?;
                let mut indices: Vec<usize> = (0..rows.len()).collect();
                indices.sort_by(|&a, &b| {
                    for (i, s) in sort_exprs.iter().enumerate() {
                        let ord = keys[a][i]
                            .partial_compare(&keys[b][i])
                            .unwrap_or(std::cmp::Ordering::Equal);
                        let ord = if s.ascending { ord } else { ord.reverse() };
                        if ord != std::cmp::Ordering::Equal {
                            return ord;
                        }
                    }
                    std::cmp::Ordering::Equal
                });
                rows = indices.into_iter().map(|i| rows[i].clone()).collect();
                QueryResult::new(in_result.schema.clone(), rows)
            }
            OperatorKind::Limit {
                input,
                limit,
                offset,
            } => {
                input.execute(storage)?;
                let in_result = input.get_output().expect("just executed");
                let start = offset.unwrap_or(0).min(in_result.rows.len());
                let rows: Vec<Row> = match limit {
                    Some(n) => in_result.rows[start..].iter().take(*n).cloned().collect(),
                    None => in_result.rows[start..].to_vec(),
                };
                QueryResult::new(in_result.schema.clone(), rows)
            }
            OperatorKind::Distinct { input } => {
                input.execute(storage)?;
                let in_result = input.get_output().expect("just executed");
                let mut seen = HashSet::new();
                let mut rows = Vec::new();
                for row in &in_result.rows {
                    let key: Vec<String> = row.values().iter().map(|v| format!("{v:?}")).collect();
                    if seen.insert(key) {
                        rows.push(row.clone());
                    }
                }
                QueryResult::new(in_result.schema.clone(), rows)
            }
            OperatorKind::ValuesScan { rows, schema } => {
                let empty_schema = PlanSchema::empty();
                let empty_row = Row::new(Vec::new());
                let mut out_rows = Vec::with_capacity(rows.len());
                for row_exprs in rows.iter() {
                    let mut values = Vec::with_capacity(row_exprs.len());
                    for e in row_exprs {
                        values.push(eval(e, &empty_row, &empty_schema)?);
                    }
                    out_rows.push(Row::new(values));
                }
                QueryResult::new(schema_to_columns(schema), out_rows)
            }
            OperatorKind::Insert {
                table_name,
                source,
                ..
            } => {
                source.execute(storage)?;
                let in_result = source.get_output().expect("just executed");
                storage.insert_rows(table_name, in_result.rows.clone())?;
                QueryResult::empty()
            }
            OperatorKind::CreateTable {
                table_name,
                columns,
                if_not_exists,
            } => {
                storage.create_table(table_name, columns.clone(), *if_not_exists)?;
                QueryResult::empty()
            }
            OperatorKind::DropTable {
                table_names,
                if_exists,
            } => {
                storage.drop_table(table_names, *if_exists)?;
                QueryResult::empty()
            }
            OperatorKind::CreateView {
                name,
                query,
                if_not_exists,
            } => {
                storage.create_view(name, query.clone(), *if_not_exists)?;
                QueryResult::empty()
            }
            OperatorKind::DropView { name, if_exists } => {
                storage.drop_view(name, *if_exists)?;
                QueryResult::empty()
            }
            OperatorKind::CreatePreparedPlan { name, query } => {
                storage.register_prepared_plan(name, query.clone())?;
                QueryResult::empty()
            }
            OperatorKind::Import {
                table_name,
                file_path,
            } => {
                let rows = storage.import_file(table_name, file_path)?;
                storage.insert_rows(table_name, rows)?;
                QueryResult::empty()
            }
            OperatorKind::Explain { input } => {
                QueryResult::new(
                    vec![ColumnInfo::new("plan", "STRING")],
                    vec![Row::new(vec![Value::String(format!("{:#?}", input.kind))])],
                )
            }
        };
        self.output = Some(output);
        Ok(())
    }
}

fn schema_to_columns(schema: &PlanSchema) -> Vec<ColumnInfo> {
    schema
        .columns()
        .iter()
        .map(|(name, ty)| ColumnInfo::new(name.clone(), ty.to_string()))
        .collect()
}

fn columns_to_schema(columns: &[ColumnInfo]) -> PlanSchema {
    PlanSchema::new(
        columns
            .iter()
            .map(|c| (c.name.clone(), parse_data_type(&c.data_type)))
            .collect(),
    )
}

fn parse_data_type(name: &str) -> columnardb_common::DataType {
    use columnardb_common::DataType;
    match name {
        "INT64" => DataType::Int64,
        "FLOAT64" => DataType::Float64,
        "BOOLEAN" => DataType::Boolean,
        "NULL" => DataType::Null,
        _ => DataType::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnardb_common::DataType;
    use columnardb_ir::{BinaryOperator, Expr};

    fn storage_with_table() -> StorageManager {
        let storage = StorageManager::new();
        storage
            .create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        storage.insert_rows("t", vec![Row::new(vec![Value::Int64(1)]), Row::new(vec![Value::Int64(2)])]).unwrap();
        storage
    }

    #[test]
    fn execute_is_idempotent() {
        let storage = storage_with_table();
        let mut op = PhysicalOperator::new(OperatorKind::TableScan {
            table_name: "t".into(),
            schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
        });
        op.execute(&storage).unwrap();
        let first_len = op.get_output().unwrap().row_count();
        op.execute(&storage).unwrap();
        assert_eq!(op.get_output().unwrap().row_count(), first_len);
    }

    #[test]
    fn filter_keeps_only_matching_rows() {
        let storage = storage_with_table();
        let scan = PhysicalOperator::new(OperatorKind::TableScan {
            table_name: "t".into(),
            schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
        });
        let mut filter = PhysicalOperator::new(OperatorKind::Filter {
            input: Box::new(scan),
            predicate: Expr::binary(BinaryOperator::Eq, Expr::column("a"), Expr::literal(Value::Int64(2))),
        });
        filter.execute(&storage).unwrap();
        assert_eq!(filter.get_output().unwrap().row_count(), 1);
    }

    #[test]
    fn deep_copy_produces_unexecuted_tree() {
        let storage = storage_with_table();
        let mut scan = PhysicalOperator::new(OperatorKind::TableScan {
            table_name: "t".into(),
            schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
        });
        scan.execute(&storage).unwrap();
        assert!(scan.get_output().is_some());
        let copy = scan.deep_copy();
        assert!(copy.get_output().is_none());
    }
}
