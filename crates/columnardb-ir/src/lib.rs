//! SQL front end and logical query plan IR.
//!
//! This crate owns everything up to and including the unoptimized LQP: SQL
//! text in, `TranslatedPlan` out. Optimization, physical translation,
//! scheduling, and caching all live downstream in sibling crates.

pub mod canonical;
pub mod expr;
pub mod parser;
pub mod plan;
pub mod schema;
pub mod translator;

pub use canonical::canonicalize;
pub use expr::{BinaryOperator, Expr, UnaryOperator};
pub use parser::{parse_statement, split_statements, ParsedStatement};
pub use plan::{LogicalPlan, TranslatedPlan};
pub use schema::{JoinType, PlanSchema, SortExpr};
pub use translator::{translate, CatalogProvider};
