//! The main optimizer: the full rule set, run once per logical-cache
//! template miss.

use columnardb_ir::LogicalPlan;
use log::debug;

use crate::rules::{
    apply_empty_propagation, apply_filter_merging, apply_redundant_project_elimination,
    apply_trivial_predicate_removal, fold_constants,
};
use crate::settings::{OptimizationLevel, OptimizerSettings};

pub struct MainOptimizer {
    settings: OptimizerSettings,
}

impl MainOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    pub fn optimize(&self, plan: LogicalPlan) -> LogicalPlan {
        let mut plan = plan;
        if self
            .settings
            .rule_enabled(self.settings.rules.constant_folding, OptimizationLevel::Basic)
        {
            plan = fold_constants(plan);
        }
        if self.settings.rule_enabled(
            self.settings.rules.trivial_predicate_removal,
            OptimizationLevel::Basic,
        ) {
            plan = apply_trivial_predicate_removal(plan);
        }
        if self
            .settings
            .rule_enabled(self.settings.rules.empty_propagation, OptimizationLevel::Basic)
        {
            plan = apply_empty_propagation(plan);
        }
        if self
            .settings
            .rule_enabled(self.settings.rules.filter_merging, OptimizationLevel::Standard)
        {
            plan = apply_filter_merging(plan);
        }
        if self.settings.rule_enabled(
            self.settings.rules.redundant_project_elimination,
            OptimizationLevel::Aggressive,
        ) {
            plan = apply_redundant_project_elimination(plan);
        }
        debug!("main optimizer finished at level {:?}", self.settings.level);
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnardb_common::{DataType, Value};
    use columnardb_ir::{BinaryOperator, Expr, PlanSchema};

    #[test]
    fn none_level_leaves_plan_untouched() {
        let plan = LogicalPlan::Filter {
            input: Box::new(LogicalPlan::Scan {
                table_name: "t".into(),
                schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
            }),
            predicate: Expr::binary(
                BinaryOperator::Eq,
                Expr::literal(Value::Int64(1)),
                Expr::literal(Value::Int64(1)),
            ),
        };
        let optimizer = MainOptimizer::new(OptimizerSettings::with_level(OptimizationLevel::None));
        let result = optimizer.optimize(plan.clone());
        assert_eq!(result, plan);
    }

    #[test]
    fn standard_level_folds_and_removes_trivial_filters() {
        let plan = LogicalPlan::Filter {
            input: Box::new(LogicalPlan::Scan {
                table_name: "t".into(),
                schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
            }),
            predicate: Expr::binary(
                BinaryOperator::Eq,
                Expr::literal(Value::Int64(1)),
                Expr::literal(Value::Int64(1)),
            ),
        };
        let optimizer = MainOptimizer::new(OptimizerSettings::default());
        let result = optimizer.optimize(plan);
        assert!(matches!(result, LogicalPlan::Scan { .. }));
    }
}
