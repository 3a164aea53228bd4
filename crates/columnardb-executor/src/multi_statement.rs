//! Multi-statement pipeline: splits a script into statements and runs one
//! `StatementPipeline` per statement, sharing a transaction context across
//! all of them.
//!
//! Two modes, matching the two ways a caller can invoke a script:
//! - auto-commit (no context supplied): each statement gets its own,
//!   freshly created context, so one statement's rollback has no bearing
//!   on the next.
//! - user-bound (an explicit context passed in): every statement shares
//!   that one context, so a rollback is sticky across the whole script —
//!   once one statement rolls back, every later statement is skipped
//!   rather than executed against an already-dead transaction.

use columnardb_common::error::Result;
use columnardb_common::{QueryResult, StatementMetrics, TransactionContext};
use columnardb_optimizer::OptimizerSettings;

use crate::pipeline::{split_script, PipelineResources, PipelineStatus, StatementPipeline};

/// One statement's outcome within a script run.
pub struct StatementOutcome {
    pub sql: String,
    pub status: PipelineStatus,
    pub result: QueryResult,
    pub metrics: StatementMetrics,
}

/// The script's overall outcome: every statement that ran, in order, plus
/// whether any of them rolled back (which aborts the rest).
pub struct ScriptOutcome {
    pub statements: Vec<StatementOutcome>,
    pub aborted: bool,
}

/// Runs every statement in `script` through its own `StatementPipeline`,
/// sharing `resources` (caches, storage, scheduler) across all of them.
///
/// `transaction_context`: `None` selects auto-commit mode (a fresh context
/// per statement); `Some(ctx)` selects user-bound mode (every statement
/// shares `ctx`, and a rollback aborts the remaining statements).
pub fn run_script(
    script: &str,
    resources: PipelineResources,
    optimizer_settings: OptimizerSettings,
    use_mvcc: bool,
    transaction_context: Option<TransactionContext>,
) -> Result<ScriptOutcome> {
    let statements = split_script(script);
    let mut outcomes = Vec::with_capacity(statements.len());
    let mut aborted = false;

    for sql in statements {
        if aborted {
            break;
        }

        let ctx_for_statement = transaction_context.clone();
        let mut pipe = StatementPipeline::new(
            sql.clone(),
            resources.clone(),
            optimizer_settings.clone(),
            use_mvcc,
            ctx_for_statement,
        );
        let (status, result) = pipe.get_result_table()?;
        let metrics = pipe.metrics().clone();

        if status == PipelineStatus::RolledBack {
            aborted = true;
        }

        outcomes.push(StatementOutcome {
            sql,
            status,
            result,
            metrics,
        });
    }

    Ok(ScriptOutcome {
        statements: outcomes,
        aborted,
    })
}
