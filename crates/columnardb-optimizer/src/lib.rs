//! Rule-based logical plan optimization.
//!
//! Two entry points, matching the reference pipeline's split between a full
//! optimizer run once per cache template and a cheap pruning pass re-run on
//! every instantiation of that template:
//! - [`MainOptimizer`] applies the complete rule set selected by
//!   [`OptimizerSettings`].
//! - [`PruningOptimizer`] applies only the subset safe to re-run after
//!   placeholders have been bound back to literals.

pub mod main_optimizer;
pub mod pruning_optimizer;
pub mod rules;
pub mod settings;

pub use main_optimizer::MainOptimizer;
pub use pruning_optimizer::PruningOptimizer;
pub use settings::{OptimizationLevel, OptimizerSettings, RuleFlags};
