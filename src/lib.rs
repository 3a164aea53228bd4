//! columnardb: an in-memory columnar SQL execution pipeline.
//!
//! Parses a SQL statement, translates it into a logical plan, optimizes it
//! (with two-level plan caching and parameter-extraction rewrites so
//! repeated shapes of a query reuse cached work), translates it into a
//! physical operator DAG, schedules that DAG onto a worker pool under MVCC,
//! and returns the result table.
//!
//! This crate is a thin façade: [`Database`] and everything else here is
//! re-exported from `columnardb-executor`, which does the actual work.
//! Pull in the underlying crates directly if you need lower-level access
//! (e.g. `columnardb-ir` for the logical plan types, `columnardb-optimizer`
//! to run the optimizer standalone).
//!
//! ```rust,ignore
//! use columnardb::Database;
//!
//! let db = Database::new();
//! db.query("CREATE TABLE users (id INT, name TEXT)").unwrap();
//! db.query("INSERT INTO users VALUES (1, 'a'), (2, 'b')").unwrap();
//! let result = db.query("SELECT * FROM users WHERE id = 1").unwrap();
//! assert_eq!(result.row_count(), 1);
//! ```

pub use columnardb_common::error::{Error, Result};
pub use columnardb_common::{ColumnInfo, DataType, QueryResult, Row, StatementMetrics, TransactionContext, TransactionPhase, Value};
pub use columnardb_executor::{
    hash_sql, run_script, Database, EvictionPolicy, PipelineStatus, PlanCache, PreparedPlan,
    ScriptOutcome, StatementOutcome, StatementPipeline, SqlHash,
};
pub use columnardb_ir::{parse_statement, translate, CatalogProvider, JoinType, LogicalPlan, ParsedStatement, PlanSchema, TranslatedPlan};
pub use columnardb_optimizer::{MainOptimizer, OptimizerSettings, PruningOptimizer};
pub use columnardb_scheduler::{Scheduler, SchedulerConfig};
pub use columnardb_storage::StorageManager;
