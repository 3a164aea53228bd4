//! Grouped aggregation. `aggregates` are `Expr::Function` nodes (`COUNT`,
//! `SUM`, `AVG`, `MIN`, `MAX`); every other expression shape is rejected at
//! this boundary rather than the translator's, since aggregate validity is
//! an execution-time concern here (a dedicated aggregate-binding pass is
//! out of scope).

use columnardb_common::error::{Error, Result};
use columnardb_common::{Row, Value};
use columnardb_ir::{Expr, PlanSchema};

use crate::eval::eval;

pub fn run(rows: &[Row], schema: &PlanSchema, group_by: &[Expr], aggregates: &[Expr]) -> Result<Vec<Row>> {
    let mut groups: Vec<(Vec<Value>, Vec<Row>)> = Vec::new();
    for row in rows {
        let key: Vec<Value> = group_by
            .iter()
            .map(|e| eval(e, row, schema))
            .collect::<Result<Vec<Value>>>()?;
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, bucket)) => bucket.push(row.clone()),
            None => groups.push((key, vec![row.clone()])),
        }
    }
    if groups.is_empty() && group_by.is_empty() {
        groups.push((Vec::new(), Vec::new()));
    }

    let mut out = Vec::with_capacity(groups.len());
    for (key, bucket) in &groups {
        let mut values = key.clone();
        for agg in aggregates {
            values.push(eval_aggregate(agg, bucket, schema)?);
        }
        out.push(Row::new(values));
    }
    Ok(out)
}

fn eval_aggregate(expr: &Expr, bucket: &[Row], schema: &PlanSchema) -> Result<Value> {
    let (name, args) = match expr {
        Expr::Function { name, args } => (name.to_uppercase(), args),
        other => return Err(Error::UnsupportedStatement(format!("not an aggregate function: {other:?}"))),
    };

    if name == "COUNT" && matches!(args.first(), None) {
        return Ok(Value::Int64(bucket.len() as i64));
    }

    let arg = args
        .first()
        .ok_or_else(|| Error::UnsupportedStatement(format!("{name} requires an argument")))?;
    let values: Vec<Value> = bucket
        .iter()
        .map(|r| eval(arg, r, schema))
        .collect::<Result<Vec<Value>>>()?;
    let non_null: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();

    match name.as_str() {
        "COUNT" => Ok(Value::Int64(non_null.len() as i64)),
        "MIN" => Ok(non_null
            .iter()
            .min_by(|a, b| a.partial_compare(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|v| (*v).clone())
            .unwrap_or(Value::Null)),
        "MAX" => Ok(non_null
            .iter()
            .max_by(|a, b| a.partial_compare(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|v| (*v).clone())
            .unwrap_or(Value::Null)),
        "SUM" => sum_values(&non_null),
        "AVG" => {
            if non_null.is_empty() {
                return Ok(Value::Null);
            }
            let sum = sum_values(&non_null)?;
            let count = non_null.len() as f64;
            match sum {
                Value::Int64(i) => Ok(Value::Float64(i as f64 / count)),
                Value::Float64(f) => Ok(Value::Float64(f / count)),
                _ => Ok(Value::Null),
            }
        }
        other => Err(Error::UnsupportedStatement(format!("unsupported aggregate function: {other}"))),
    }
}

fn sum_values(values: &[&Value]) -> Result<Value> {
    if values.is_empty() {
        return Ok(Value::Null);
    }
    let mut int_sum = 0i64;
    let mut float_sum = 0.0f64;
    let mut is_float = false;
    for v in values {
        match v {
            Value::Int64(i) => int_sum += i,
            Value::Float64(f) => {
                is_float = true;
                float_sum += f;
            }
            other => {
                return Err(Error::TypeMismatch {
                    expected: "numeric".into(),
                    actual: other.data_type().to_string(),
                })
            }
        }
    }
    if is_float {
        Ok(Value::Float64(float_sum + int_sum as f64))
    } else {
        Ok(Value::Int64(int_sum))
    }
}
