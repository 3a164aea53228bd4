//! Plan caches, parameter extraction, and the statement pipeline.
//!
//! This crate owns everything between a translated logical plan and a
//! finished result table: the two plan caches and their eviction policies,
//! parameter extraction (literal-to-placeholder rewriting for cache reuse),
//! the statistics-based cacheability gate, the DDL/IO precheck, and the
//! statement and multi-statement pipelines that drive a SQL string through
//! all of it. [`Database`] is the crate's top-level entry point, mirroring
//! the reference engine's session split but synchronous and single-catalog,
//! since this pipeline has no async runtime and no per-session isolation
//! requirement.

pub mod ddl_precheck;
pub mod multi_statement;
pub mod objects;
pub mod parameter_extractor;
pub mod pipeline;
pub mod plan_cache;
pub mod prepared_plan;
pub mod statistics_gate;

use std::num::NonZeroUsize;
use std::sync::Arc;

use columnardb_common::error::Result;
use columnardb_common::{QueryResult, TransactionContext};
use columnardb_optimizer::OptimizerSettings;
use columnardb_scheduler::{Scheduler, SchedulerConfig};
use columnardb_storage::StorageManager;

pub use ddl_precheck::precheck;
pub use multi_statement::{run_script, ScriptOutcome, StatementOutcome};
pub use objects::referenced_objects;
pub use parameter_extractor::{bind_parameters, extract_parameters, ExtractedParameters};
pub use pipeline::{PipelineResources, PipelineStatus, StatementPipeline, DEFAULT_UNIFORMITY_THRESHOLD};
pub use plan_cache::{hash_sql, EvictionPolicy, PlanCache, SqlHash};
pub use prepared_plan::PreparedPlan;
pub use statistics_gate::is_cacheable_under_statistics;

/// Default capacity for both plan caches, matching the reference
/// implementation's plan cache size.
const DEFAULT_PLAN_CACHE_SIZE: usize = 10_000;

/// A single in-memory database: storage manager, both plan caches, and the
/// worker pool, wired together with sensible defaults. Cheap to clone
/// (everything it owns is already behind an `Arc`), so one instance can be
/// shared across threads the way the caches it wraps already require.
#[derive(Clone)]
pub struct Database {
    resources: PipelineResources,
    optimizer_settings: OptimizerSettings,
    use_mvcc: bool,
}

impl Database {
    /// Builds a database with empty storage, LRU caches sized to
    /// `DEFAULT_PLAN_CACHE_SIZE`, a worker pool sized to the available
    /// parallelism, default optimizer settings, and MVCC enabled.
    pub fn new() -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_PLAN_CACHE_SIZE).unwrap();
        Self {
            resources: PipelineResources {
                storage: Arc::new(StorageManager::new()),
                logical_cache: Arc::new(PlanCache::new(capacity, EvictionPolicy::Lru)),
                physical_cache: Arc::new(PlanCache::new(capacity, EvictionPolicy::Lru)),
                scheduler: Arc::new(Scheduler::new(SchedulerConfig::default())),
            },
            optimizer_settings: OptimizerSettings::default(),
            use_mvcc: true,
        }
    }

    /// Overrides which plan-cache eviction policy is used. Affects only
    /// caches created from this point on, so call before running any
    /// statement.
    pub fn with_eviction_policy(self, policy: EvictionPolicy) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_PLAN_CACHE_SIZE).unwrap();
        Self {
            resources: PipelineResources {
                storage: self.resources.storage,
                logical_cache: Arc::new(PlanCache::new(capacity, policy)),
                physical_cache: Arc::new(PlanCache::new(capacity, policy)),
                scheduler: self.resources.scheduler,
            },
            ..self
        }
    }

    pub fn with_optimizer_settings(mut self, settings: OptimizerSettings) -> Self {
        self.optimizer_settings = settings;
        self
    }

    pub fn with_mvcc(mut self, enabled: bool) -> Self {
        self.use_mvcc = enabled;
        self
    }

    pub fn with_scheduler_config(self, config: SchedulerConfig) -> Self {
        Self {
            resources: PipelineResources {
                scheduler: Arc::new(Scheduler::new(config)),
                ..self.resources
            },
            ..self
        }
    }

    pub fn storage(&self) -> &StorageManager {
        &self.resources.storage
    }

    /// Runs a single SQL statement through the full pipeline and returns its
    /// result table. For a statement that rolls back, returns the partial
    /// output alongside `PipelineStatus::RolledBack` rather than an `Err` —
    /// use [`Database::execute`] to observe the status directly.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let (_, result) = self.execute(sql)?;
        Ok(result)
    }

    /// Like [`Database::query`], but also returns whether the statement
    /// committed or rolled back.
    pub fn execute(&self, sql: &str) -> Result<(PipelineStatus, QueryResult)> {
        let mut pipe = StatementPipeline::new(
            sql,
            self.resources.clone(),
            self.optimizer_settings.clone(),
            self.use_mvcc,
            None,
        );
        pipe.get_result_table()
    }

    /// Runs every statement in `script` in turn, sharing `transaction_context`
    /// across all of them when given (`None` selects auto-commit mode, a
    /// fresh context per statement).
    pub fn execute_script(
        &self,
        script: &str,
        transaction_context: Option<TransactionContext>,
    ) -> Result<ScriptOutcome> {
        run_script(
            script,
            self.resources.clone(),
            self.optimizer_settings.clone(),
            self.use_mvcc,
            transaction_context,
        )
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
