//! Scheduler interface backed by a dedicated worker pool.
//!
//! Grounded on the reference executor's use of `rayon` for intra-plan
//! parallelism (`yachtsql-executor::executor::concurrent::set_ops`, which
//! runs independent subtrees of a union/intersect with `rayon::join`); this
//! crate dedicates a sized `rayon::ThreadPool` to the pipeline rather than
//! borrowing the process-global pool, so a caller can size it independently
//! of anything else in the process using rayon.
//!
//! `schedule_and_wait` is the one blocking point in the pipeline: it parks
//! the calling thread until the whole operator tree has completed or
//! failed. Dependency ordering falls out of `PhysicalOperator::execute`'s
//! own recursion — a node's `execute` always runs its inputs' `execute`
//! first — so the scheduler does not need to re-derive an ordering from the
//! `OperatorTask` list to enforce it; that list (`task.rs`) exists for
//! callers that want to *inspect* the DAG, not to drive it.

use columnardb_common::error::Result;
use columnardb_operators::PhysicalOperator;
use columnardb_storage::StorageManager;
use log::{debug, warn};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub num_workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// Submits operator tasks and waits for completion. One `Scheduler` is
/// meant to be shared process-wide, the same way the two plan caches are.
pub struct Scheduler {
    pool: rayon::ThreadPool,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_workers.max(1))
            .thread_name(|i| format!("columnardb-worker-{i}"))
            .build()
            .expect("failed to build scheduler thread pool");
        Self { pool }
    }

    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `root`'s operator tree to completion on the worker pool.
    /// Returns `Ok(())` once every task has completed; returns the
    /// operator's error on the first failure. The caller (the statement
    /// pipeline) is responsible for transitioning the owning transaction to
    /// `RolledBack` on `Err` — the scheduler itself has no transaction to
    /// own.
    pub fn schedule_and_wait(&self, root: &mut PhysicalOperator, storage: &StorageManager) -> Result<()> {
        let result = self.pool.install(|| root.execute(storage));
        match &result {
            Ok(()) => debug!("schedule_and_wait: operator tree completed"),
            Err(e) => warn!("schedule_and_wait: operator task failed: {e}"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnardb_common::{DataType, Row, Value};
    use columnardb_ir::PlanSchema;
    use columnardb_operators::OperatorKind;

    fn storage_with_table() -> StorageManager {
        let storage = StorageManager::new();
        storage
            .create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        storage
            .insert_rows("t", vec![Row::new(vec![Value::Int64(1)])])
            .unwrap();
        storage
    }

    #[test]
    fn schedule_and_wait_executes_the_tree() {
        let storage = storage_with_table();
        let scheduler = Scheduler::new(SchedulerConfig { num_workers: 2 });
        let mut op = PhysicalOperator::new(OperatorKind::TableScan {
            table_name: "t".into(),
            schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
        });
        scheduler.schedule_and_wait(&mut op, &storage).unwrap();
        assert_eq!(op.get_output().unwrap().row_count(), 1);
    }

    #[test]
    fn schedule_and_wait_propagates_operator_failure() {
        let storage = storage_with_table();
        let scheduler = Scheduler::new(SchedulerConfig::default());
        let mut op = PhysicalOperator::new(OperatorKind::TableScan {
            table_name: "missing".into(),
            schema: PlanSchema::empty(),
        });
        let err = scheduler.schedule_and_wait(&mut op, &storage).unwrap_err();
        assert!(matches!(err, columnardb_common::Error::TableNotFound(_)));
    }

    #[test]
    fn default_config_uses_available_parallelism() {
        let config = SchedulerConfig::default();
        assert!(config.num_workers >= 1);
    }
}
