//! Physical query plan operators: translation from `LogicalPlan`,
//! execution against `columnardb-storage`, and the `Operator` contract the
//! scheduler drives.

pub mod aggregate;
pub mod eval;
pub mod join;
pub mod operator;
pub mod planner;

pub use operator::{OperatorKind, OperatorType, PhysicalOperator};
pub use planner::translate;
