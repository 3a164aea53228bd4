//! The pruning optimizer: a lightweight subset of rules safe to re-run
//! after a cached template has been instantiated with concrete literal
//! values. Re-running the full rule set
//! here would throw away the point of caching the template in the first
//! place, but constant folding and the predicate-elimination rules it
//! unlocks only become *possible* once the literals are back in the tree.

use columnardb_ir::LogicalPlan;

use crate::rules::{apply_empty_propagation, apply_trivial_predicate_removal, fold_constants};
use crate::settings::RuleFlags;

pub struct PruningOptimizer {
    rules: RuleFlags,
}

impl Default for PruningOptimizer {
    fn default() -> Self {
        Self {
            rules: RuleFlags::pruning_subset(),
        }
    }
}

impl PruningOptimizer {
    pub fn new(rules: RuleFlags) -> Self {
        Self { rules }
    }

    pub fn optimize(&self, plan: LogicalPlan) -> LogicalPlan {
        let mut plan = plan;
        if self.rules.constant_folding.unwrap_or(true) {
            plan = fold_constants(plan);
        }
        if self.rules.trivial_predicate_removal.unwrap_or(true) {
            plan = apply_trivial_predicate_removal(plan);
        }
        if self.rules.empty_propagation.unwrap_or(true) {
            plan = apply_empty_propagation(plan);
        }
        plan
    }
}
