//! Nested-loop join. Cost-based join algorithm selection is out of scope;
//! every join type in the IR is supported, just not quickly.

use columnardb_common::error::Result;
use columnardb_common::{ColumnInfo, QueryResult, Row, Value};
use columnardb_ir::{Expr, JoinType, PlanSchema};

use crate::eval::eval_is_truthy;

pub fn run(
    left: &QueryResult,
    right: &QueryResult,
    join_type: JoinType,
    condition: Option<&Expr>,
) -> Result<QueryResult> {
    let mut schema_cols = left.schema.clone();
    schema_cols.extend(right.schema.clone());
    let combined_schema = columns_to_schema(&schema_cols);

    let mut out_rows = Vec::new();
    let mut right_matched = vec![false; right.rows.len()];
    let mut left_matched;

    for l in &left.rows {
        left_matched = false;
        for (ri, r) in right.rows.iter().enumerate() {
            let combined = combine(l, r);
            let matches = match condition {
                Some(expr) => eval_is_truthy(expr, &combined, &combined_schema)?,
                None => true,
            };
            if matches {
                out_rows.push(combined);
                left_matched = true;
                right_matched[ri] = true;
            }
        }
        if !left_matched && matches!(join_type, JoinType::Left | JoinType::Full) {
            out_rows.push(pad_right(l, right.schema.len()));
        }
    }

    if matches!(join_type, JoinType::Right | JoinType::Full) {
        for (ri, r) in right.rows.iter().enumerate() {
            if !right_matched[ri] {
                out_rows.push(pad_left(left.schema.len(), r));
            }
        }
    }

    Ok(QueryResult::new(schema_cols, out_rows))
}

fn combine(left: &Row, right: &Row) -> Row {
    let mut values = left.values().to_vec();
    values.extend(right.values().iter().cloned());
    Row::new(values)
}

fn pad_right(left: &Row, right_len: usize) -> Row {
    let mut values = left.values().to_vec();
    values.extend(std::iter::repeat(Value::Null).take(right_len));
    Row::new(values)
}

fn pad_left(left_len: usize, right: &Row) -> Row {
    let mut values: Vec<Value> = std::iter::repeat(Value::Null).take(left_len).collect();
    values.extend(right.values().iter().cloned());
    Row::new(values)
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
    use columnardb_ir::BinaryOperator;

    fn result(col: &str, values: Vec<i64>) -> QueryResult {
        QueryResult::new(
            vec![ColumnInfo::new(col, "INT64")],
            values.into_iter().map(|v| Row::new(vec![Value::Int64(v)])).collect(),
        )
    }

    #[test]
    fn inner_join_keeps_only_matches() {
        let left = result("a", vec![1, 2]);
        let right = result("b", vec![2, 3]);
        let condition = Expr::binary(
            BinaryOperator::Eq,
            Expr::column("a"),
            Expr::column("b"),
        );
        let out = run(&left, &right, JoinType::Inner, Some(&condition)).unwrap();
        assert_eq!(out.row_count(), 1);
    }

    #[test]
    fn left_join_pads_unmatched_left_rows_with_null() {
        let left = result("a", vec![1, 2]);
        let right = result("b", vec![2]);
        let condition = Expr::binary(BinaryOperator::Eq, Expr::column("a"), Expr::column("b"));
        let out = run(&left, &right, JoinType::Left, Some(&condition)).unwrap();
        assert_eq!(out.row_count(), 2);
        assert!(out.rows.iter().any(|r| r.get(1) == Some(&Value::Null)));
    }

    #[test]
    fn cross_join_has_no_condition() {
        let left = result("a", vec![1, 2]);
        let right = result("b", vec![10, 20]);
        let out = run(&left, &right, JoinType::Cross, None).unwrap();
        assert_eq!(out.row_count(), 4);
    }
}
