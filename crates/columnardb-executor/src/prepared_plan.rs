//! Prepared plans: a named, parameter-extracted template registered by
//! `PREPARE name AS <query>` and instantiated by later `EXECUTE name(...)`
//! calls.
//!
//! The template stored by `StorageManager::register_prepared_plan` is
//! already a parameter-extracted `LogicalPlan` (its literals replaced by
//! `Placeholder`s during translation of the `PREPARE` statement); preparing
//! it for execution is just `parameter_extractor::bind_parameters` run
//! against the caller's bind values, followed by the optimizer's pruning
//! pass (`columnardb_optimizer::PruningOptimizer`) re-running the
//! constant-folding-family rules now that the placeholders are literals
//! again.

use columnardb_common::Value;
use columnardb_common::error::{Error, Result};
use columnardb_ir::LogicalPlan;
use columnardb_optimizer::PruningOptimizer;

use crate::parameter_extractor::bind_parameters;

/// An LQP template with its placeholders already extracted, plus the count
/// of distinct parameters it expects. This IR assigns parameter ids densely
/// in `0..parameter_count` (see `parameter_extractor`'s module doc for why
/// there is no `replaced_by`-style dedup to track), so the "ordered list of
/// parameter ids" the logical-cache entry carries collapses to that count.
#[derive(Debug, Clone)]
pub struct PreparedPlan {
    pub template: LogicalPlan,
    pub parameter_count: usize,
    /// Whether this template was built under MVCC; a cache hit whose
    /// `validated_for_mvcc` doesn't match the requested mode is treated as
    /// a miss by the statement pipeline.
    pub validated_for_mvcc: bool,
}

impl PreparedPlan {
    pub fn new(template: LogicalPlan, parameter_count: usize, validated_for_mvcc: bool) -> Self {
        Self {
            template,
            parameter_count,
            validated_for_mvcc,
        }
    }

    /// Binds `values` into the template and re-runs the safe-to-repeat
    /// pruning rules, producing a plan ready for the rest of the pipeline
    /// (statistics gate, physical translation, scheduling).
    pub fn instantiate(&self, values: &[Value]) -> Result<LogicalPlan> {
        if values.len() != self.parameter_count {
            return Err(Error::ArityMismatch {
                expected: self.parameter_count,
                actual: values.len(),
            });
        }
        instantiate(&self.template, values)
    }
}

/// Binds `values` into `template` and re-runs the safe-to-repeat pruning
/// rules, producing a plan ready for the rest of the pipeline (statistics
/// gate, physical translation, scheduling).
pub fn instantiate(template: &LogicalPlan, values: &[Value]) -> Result<LogicalPlan> {
    let bound = bind_parameters(template.clone(), values)?;
    Ok(PruningOptimizer::default().optimize(bound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnardb_common::DataType;
    use columnardb_ir::{BinaryOperator, Expr, PlanSchema};

    #[test]
    fn instantiate_binds_values_and_folds_the_result() {
        let template = LogicalPlan::Filter {
            input: Box::new(LogicalPlan::Scan {
                table_name: "t".into(),
                schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
            }),
            predicate: Expr::binary(
                BinaryOperator::Eq,
                Expr::literal(Value::Int64(1)),
                Expr::Placeholder {
                    parameter_id: 0,
                    data_type: DataType::Int64,
                },
            ),
        };
        let plan = instantiate(&template, &[Value::Int64(1)]).unwrap();
        // both sides fold to the literal `true`, and trivial-predicate
        // removal then drops the Filter entirely.
        assert!(matches!(plan, LogicalPlan::Scan { .. }));
    }

    #[test]
    fn instantiate_rejects_wrong_arity() {
        let template = LogicalPlan::Filter {
            input: Box::new(LogicalPlan::Scan {
                table_name: "t".into(),
                schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
            }),
            predicate: Expr::binary(
                BinaryOperator::Eq,
                Expr::column("a"),
                Expr::Placeholder {
                    parameter_id: 0,
                    data_type: DataType::Int64,
                },
            ),
        };
        assert!(instantiate(&template, &[]).is_err());
    }

    #[test]
    fn prepared_plan_checks_arity_before_binding() {
        let prepared = PreparedPlan::new(
            LogicalPlan::Scan {
                table_name: "t".into(),
                schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
            },
            2,
            true,
        );
        let err = prepared.instantiate(&[Value::Int64(1)]).unwrap_err();
        assert!(matches!(err, columnardb_common::Error::ArityMismatch { .. }));
    }
}
