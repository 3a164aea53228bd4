//! Row-at-a-time expression evaluation. Operators call this once per row;
//! there is no vectorized/segment-at-a-time execution here, unlike the
//! reference storage engine's columnar segment iterables — this engine
//! trades that throughput for a much smaller operator surface, since
//! physical execution performance is out of scope entirely.

use columnardb_common::error::{Error, Result};
use columnardb_common::{Row, Value};
use columnardb_ir::{BinaryOperator, Expr, PlanSchema, UnaryOperator};

pub fn eval(expr: &Expr, row: &Row, schema: &PlanSchema) -> Result<Value> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Placeholder { .. } => Err(Error::internal(
            "unbound placeholder reached operator execution",
        )),
        Expr::Column { name, .. } => {
            let idx = schema
                .index_of(name)
                .ok_or_else(|| Error::ColumnNotFound(name.clone()))?;
            Ok(row.get(idx).cloned().unwrap_or(Value::Null))
        }
        Expr::BinaryOp { op, left, right } => {
            let l = eval(left, row, schema)?;
            let r = eval(right, row, schema)?;
            eval_binary(*op, l, r)
        }
        Expr::UnaryOp { op, expr } => {
            let v = eval(expr, row, schema)?;
            match (op, v) {
                (UnaryOperator::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
                (UnaryOperator::Not, Value::Null) => Ok(Value::Null),
                (UnaryOperator::Negate, Value::Int64(i)) => Ok(Value::Int64(-i)),
                (UnaryOperator::Negate, Value::Float64(f)) => Ok(Value::Float64(-f)),
                (UnaryOperator::Negate, Value::Null) => Ok(Value::Null),
                (op, v) => Err(Error::TypeMismatch {
                    expected: "numeric or boolean".into(),
                    actual: format!("{op:?} applied to {v}"),
                }),
            }
        }
        Expr::Function { name, .. } => {
            Err(Error::UnsupportedStatement(format!("function '{name}' is not implemented")))
        }
        Expr::Alias { expr, .. } => eval(expr, row, schema),
    }
}

fn eval_binary(op: BinaryOperator, l: Value, r: Value) -> Result<Value> {
    use BinaryOperator::*;
    if matches!(l, Value::Null) || matches!(r, Value::Null) {
        return Ok(match op {
            Eq | NotEq | Lt | LtEq | Gt | GtEq | And | Or => Value::Null,
            Plus | Minus | Multiply | Divide => Value::Null,
        });
    }
    match op {
        Eq | NotEq | Lt | LtEq | Gt | GtEq => {
            let ordering = l.partial_compare(&r).ok_or_else(|| Error::TypeMismatch {
                expected: l.data_type().to_string(),
                actual: r.data_type().to_string(),
            })?;
            let result = match op {
                Eq => ordering.is_eq(),
                NotEq => !ordering.is_eq(),
                Lt => ordering.is_lt(),
                LtEq => ordering.is_le(),
                Gt => ordering.is_gt(),
                GtEq => ordering.is_ge(),
                _ => unreachable!(),
            };
            Ok(Value::Boolean(result))
        }
        And | Or => match (l, r) {
            (Value::Boolean(a), Value::Boolean(b)) => {
                Ok(Value::Boolean(if op == And { a && b } else { a || b }))
            }
            (l, r) => Err(Error::TypeMismatch {
                expected: "boolean".into(),
                actual: format!("{l} / {r}"),
            }),
        },
        Plus | Minus | Multiply | Divide => match (l, r) {
            (Value::Int64(a), Value::Int64(b)) => match op {
                Plus => Ok(Value::Int64(a + b)),
                Minus => Ok(Value::Int64(a - b)),
                Multiply => Ok(Value::Int64(a * b)),
                Divide if b == 0 => Err(Error::DivisionByZero),
                Divide => Ok(Value::Int64(a / b)),
                _ => unreachable!(),
            },
            (a, b) => {
                let (a, b) = (as_f64(&a)?, as_f64(&b)?);
                match op {
                    Plus => Ok(Value::Float64(a + b)),
                    Minus => Ok(Value::Float64(a - b)),
                    Multiply => Ok(Value::Float64(a * b)),
                    Divide if b == 0.0 => Err(Error::DivisionByZero),
                    Divide => Ok(Value::Float64(a / b)),
                    _ => unreachable!(),
                }
            }
        },
    }
}

fn as_f64(v: &Value) -> Result<f64> {
    match v {
        Value::Int64(i) => Ok(*i as f64),
        Value::Float64(f) => Ok(*f),
        other => Err(Error::TypeMismatch {
            expected: "numeric".into(),
            actual: other.data_type().to_string(),
        }),
    }
}

pub fn eval_is_truthy(expr: &Expr, row: &Row, schema: &PlanSchema) -> Result<bool> {
    Ok(matches!(eval(expr, row, schema)?, Value::Boolean(true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnardb_common::DataType;

    #[test]
    fn evaluates_column_reference() {
        let schema = PlanSchema::new(vec![("a".into(), DataType::Int64)]);
        let row = Row::new(vec![Value::Int64(6)]);
        assert_eq!(eval(&Expr::column("a"), &row, &schema).unwrap(), Value::Int64(6));
    }

    #[test]
    fn evaluates_equality_predicate() {
        let schema = PlanSchema::new(vec![("a".into(), DataType::Int64)]);
        let row = Row::new(vec![Value::Int64(6)]);
        let predicate = Expr::binary(BinaryOperator::Eq, Expr::column("a"), Expr::literal(Value::Int64(6)));
        assert!(eval_is_truthy(&predicate, &row, &schema).unwrap());
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let schema = PlanSchema::empty();
        let row = Row::new(vec![]);
        let expr = Expr::binary(BinaryOperator::Divide, Expr::literal(Value::Int64(1)), Expr::literal(Value::Int64(0)));
        assert!(matches!(eval(&expr, &row, &schema), Err(Error::DivisionByZero)));
    }

    #[test]
    fn null_operand_propagates_as_null() {
        let schema = PlanSchema::empty();
        let row = Row::new(vec![]);
        let expr = Expr::binary(BinaryOperator::Eq, Expr::literal(Value::Null), Expr::literal(Value::Int64(1)));
        assert_eq!(eval(&expr, &row, &schema).unwrap(), Value::Null);
    }
}
