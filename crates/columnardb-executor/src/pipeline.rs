//! The statement pipeline: drives one SQL statement through parse,
//! translation, optimization, physical translation, scheduling, and result
//! extraction, memoizing every stage so a second call to any `get_*` method
//! is free. Owns the per-statement timings recorded into
//! `StatementMetrics`.
//!
//! `get_optimized_lqp` is the central stage. Its cache-probe algorithm:
//! - If the plan is flagged non-cacheable (DDL/IO/insert roots, per
//!   `TranslatedPlan::cacheable`), or the statistics gate rejects it, the
//!   main optimizer runs directly on the unoptimized plan and the result is
//!   never cached.
//! - Otherwise the parameter extractor splits the plan into a placeholder
//!   template plus a value vector, and the template's canonical form keys
//!   a probe into the logical cache.
//!   - A hit whose `validated_for_mvcc` flag doesn't match the requested
//!     mode is treated as a miss (and evicted, since the two modes can
//!     never agree on the same template).
//!   - On a real hit, the cached template is instantiated with the
//!     extracted values and pruning-optimized.
//!   - On a miss, the template is optimized with the main optimizer,
//!     wrapped into a prepared plan, inserted into the logical cache
//!     (tagged with every object the plan references, so a later DDL
//!     statement that touches one of them can invalidate it), and then
//!     instantiated exactly as in the hit branch.
//!
//! `get_physical_plan` creates the pipeline's transaction context lazily,
//! the first time it is needed, rather than at construction: a pipeline
//! that never reaches physical translation (e.g. `get_unoptimized_lqp`
//! alone, used by a caller that only wants to inspect the plan) never pays
//! for a context it will not use.

use std::sync::Arc;
use std::time::Instant;

use columnardb_common::error::Result;
use columnardb_common::{QueryResult, StatementMetrics, TransactionContext};
use columnardb_ir::{canonicalize, parse_statement, translate, split_statements, LogicalPlan, ParsedStatement, TranslatedPlan};
use columnardb_operators::{self as operators, PhysicalOperator};
use columnardb_optimizer::{MainOptimizer, OptimizerSettings};
use columnardb_scheduler::{make_tasks_from_operator, OperatorTask, Scheduler};
use columnardb_storage::StorageManager;

use crate::ddl_precheck;
use crate::objects::referenced_objects;
use crate::parameter_extractor::extract_parameters;
use crate::plan_cache::{hash_sql, PlanCache, SqlHash};
use crate::prepared_plan::PreparedPlan;
use crate::statistics_gate::is_cacheable_under_statistics;

/// Outcome of `get_result_table`: whether the owning transaction committed
/// or was observed rolled back at some point during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Success,
    RolledBack,
}

/// Row count above which the statistics gate actually inspects column
/// histograms rather than assuming uniformity outright. The reference
/// pipeline uses a permissive default of 100.
pub const DEFAULT_UNIFORMITY_THRESHOLD: usize = 100;

/// The shared state a `StatementPipeline` borrows rather than owns: the two
/// plan caches, the storage manager, and the scheduler are process-wide
/// resources, so a pipeline is cheap to construct per statement while the
/// caches and worker pool persist across many of them.
#[derive(Clone)]
pub struct PipelineResources {
    pub storage: Arc<StorageManager>,
    pub logical_cache: Arc<PlanCache<String, PreparedPlan>>,
    pub physical_cache: Arc<PlanCache<SqlHash, PhysicalOperator>>,
    pub scheduler: Arc<Scheduler>,
}

pub struct StatementPipeline {
    sql: String,
    resources: PipelineResources,
    optimizer_settings: OptimizerSettings,
    use_mvcc: bool,
    uniformity_threshold: usize,
    transaction_context: Option<TransactionContext>,
    metrics: StatementMetrics,

    parsed: Option<ParsedStatement>,
    unoptimized: Option<TranslatedPlan>,
    optimized: Option<LogicalPlan>,
    physical: Option<PhysicalOperator>,
    tasks: Option<Vec<OperatorTask>>,
}

impl StatementPipeline {
    pub fn new(
        sql: impl Into<String>,
        resources: PipelineResources,
        optimizer_settings: OptimizerSettings,
        use_mvcc: bool,
        transaction_context: Option<TransactionContext>,
    ) -> Self {
        Self {
            sql: sql.into(),
            resources,
            optimizer_settings,
            use_mvcc,
            uniformity_threshold: DEFAULT_UNIFORMITY_THRESHOLD,
            transaction_context,
            metrics: StatementMetrics::new(),
            parsed: None,
            unoptimized: None,
            optimized: None,
            physical: None,
            tasks: None,
        }
    }

    pub fn with_uniformity_threshold(mut self, threshold: usize) -> Self {
        self.uniformity_threshold = threshold;
        self
    }

    pub fn metrics(&self) -> &StatementMetrics {
        &self.metrics
    }

    pub fn transaction_context(&self) -> Option<&TransactionContext> {
        self.transaction_context.as_ref()
    }

    pub fn get_parsed_ast(&mut self) -> Result<&ParsedStatement> {
        if self.parsed.is_none() {
            self.parsed = Some(parse_statement(&self.sql)?);
        }
        Ok(self.parsed.as_ref().unwrap())
    }

    pub fn get_unoptimized_lqp(&mut self) -> Result<&TranslatedPlan> {
        if self.unoptimized.is_none() {
            self.get_parsed_ast()?;
            let stmt = self.parsed.as_ref().unwrap();
            let started = Instant::now();
            let translated = translate(stmt, self.resources.storage.as_ref(), self.use_mvcc)?;
            self.metrics.sql_translation_duration = started.elapsed();
            self.unoptimized = Some(translated);
        }
        Ok(self.unoptimized.as_ref().unwrap())
    }

    pub fn get_optimized_lqp(&mut self) -> Result<&LogicalPlan> {
        if self.optimized.is_some() {
            return Ok(self.optimized.as_ref().unwrap());
        }
        self.get_unoptimized_lqp()?;
        let translated = self.unoptimized.as_ref().unwrap().clone();
        let main_optimizer = MainOptimizer::new(self.optimizer_settings.clone());

        let uniform_started = Instant::now();
        let statistically_cacheable = translated.cacheable
            && is_cacheable_under_statistics(&translated.plan, self.resources.storage.as_ref(), self.uniformity_threshold);
        self.metrics.uniform_check_duration = uniform_started.elapsed();

        let cache_started = Instant::now();
        let optimized = if !statistically_cacheable {
            let opt_started = Instant::now();
            let result = main_optimizer.optimize(translated.plan.clone());
            self.metrics.optimization_duration = opt_started.elapsed();
            result
        } else {
            let extracted = extract_parameters(translated.plan.clone());
            let key = canonicalize(&extracted.plan);

            let hit = match self.resources.logical_cache.try_get(&key) {
                Some(prepared) if prepared.validated_for_mvcc == self.use_mvcc => Some(prepared),
                Some(_stale) => {
                    self.resources.logical_cache.invalidate(&key);
                    None
                }
                None => None,
            };

            let prepared = match hit {
                Some(prepared) => {
                    self.metrics.query_plan_cache_hit = true;
                    prepared
                }
                None => {
                    let opt_started = Instant::now();
                    let template = main_optimizer.optimize(extracted.plan.clone());
                    self.metrics.optimization_duration = opt_started.elapsed();
                    let prepared = PreparedPlan::new(template, extracted.values.len(), self.use_mvcc);
                    self.resources.logical_cache.set_with_objects(
                        key,
                        prepared.clone(),
                        &referenced_objects(&translated.plan),
                    );
                    prepared
                }
            };
            prepared.instantiate(&extracted.values)?
        };
        let elapsed = cache_started.elapsed();
        self.metrics.cache_duration = elapsed.saturating_sub(self.metrics.uniform_check_duration);

        self.optimized = Some(optimized);
        Ok(self.optimized.as_ref().unwrap())
    }

    pub fn get_physical_plan(&mut self) -> Result<&PhysicalOperator> {
        if self.physical.is_some() {
            return Ok(self.physical.as_ref().unwrap());
        }
        self.get_optimized_lqp()?;
        self.get_unoptimized_lqp()?;
        let cacheable = self.unoptimized.as_ref().unwrap().cacheable;
        let objects = referenced_objects(&self.unoptimized.as_ref().unwrap().plan);
        let optimized = self.optimized.as_ref().unwrap().clone();

        let sql_hash = hash_sql(&self.sql);
        let started = Instant::now();
        let mut op = match self.resources.physical_cache.try_get(&sql_hash) {
            Some(cached) => cached.deep_copy(),
            None => {
                let built = operators::translate(&optimized);
                if cacheable {
                    self.resources.physical_cache.set_with_objects(sql_hash, built.clone(), &objects);
                }
                built
            }
        };
        self.metrics.lqp_translation_duration = started.elapsed();

        if self.use_mvcc {
            let ctx = self
                .transaction_context
                .get_or_insert_with(|| TransactionContext::new(true))
                .clone();
            op.set_transaction_context_recursively(ctx);
        }

        self.physical = Some(op);
        Ok(self.physical.as_ref().unwrap())
    }

    pub fn get_tasks(&mut self) -> Result<&[OperatorTask]> {
        if self.tasks.is_none() {
            self.get_physical_plan()?;
            self.tasks = Some(make_tasks_from_operator(self.physical.as_ref().unwrap()));
        }
        Ok(self.tasks.as_ref().unwrap())
    }

    /// Runs the DDL precheck, schedules and waits for the task DAG, honors
    /// auto-commit, and extracts the sink task's output.
    pub fn get_result_table(&mut self) -> Result<(PipelineStatus, QueryResult)> {
        self.get_tasks()?;
        self.get_unoptimized_lqp()?;

        // The DDL precheck table keys on root kind, which physical
        // translation preserves structurally from the logical plan, so the
        // unoptimized LQP is an equally valid witness for the check.
        ddl_precheck::precheck(self.optimized.as_ref().unwrap(), self.resources.storage.as_ref())?;

        let op = self.physical.as_mut().unwrap();
        let started = Instant::now();
        let exec_result = self.resources.scheduler.schedule_and_wait(op, self.resources.storage.as_ref());
        self.metrics.plan_execution_duration = started.elapsed();

        if exec_result.is_err() {
            if let Some(ctx) = &self.transaction_context {
                ctx.rollback();
            }
            let partial = op.get_output().cloned().unwrap_or_else(QueryResult::empty);
            return Ok((PipelineStatus::RolledBack, partial));
        }

        let produces_output = !self.unoptimized.as_ref().unwrap().plan.produces_no_output();
        let result = if produces_output {
            op.get_output().cloned().unwrap_or_else(QueryResult::empty)
        } else {
            QueryResult::empty()
        };

        let rolled_back = self.transaction_context.as_ref().map(|c| c.was_rolled_back()).unwrap_or(false);

        if !rolled_back {
            if let Some(ctx) = &self.transaction_context {
                if ctx.auto_commit() {
                    ctx.commit();
                }
            }
            if self.unoptimized.as_ref().unwrap().plan.is_ddl_root() {
                let objects = referenced_objects(&self.unoptimized.as_ref().unwrap().plan);
                self.resources.logical_cache.invalidate_objects(&objects);
                self.resources.physical_cache.invalidate_objects(&objects);
            }
        }

        let status = if rolled_back {
            PipelineStatus::RolledBack
        } else {
            PipelineStatus::Success
        };
        Ok((status, result))
    }
}

/// Splits a multi-statement SQL script into individually parseable
/// statement strings. Exposed here (rather than only in `columnardb-ir`)
/// because `multi_statement.rs` is this crate's primary caller of it.
pub fn split_script(script: &str) -> Vec<String> {
    split_statements(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnardb_common::{DataType, Row, Value};
    use columnardb_optimizer::OptimizerSettings;
    use columnardb_scheduler::SchedulerConfig;
    use std::num::NonZeroUsize;

    fn resources() -> PipelineResources {
        PipelineResources {
            storage: Arc::new(StorageManager::new()),
            logical_cache: Arc::new(PlanCache::new(
                NonZeroUsize::new(64).unwrap(),
                crate::plan_cache::EvictionPolicy::Lru,
            )),
            physical_cache: Arc::new(PlanCache::new(
                NonZeroUsize::new(64).unwrap(),
                crate::plan_cache::EvictionPolicy::Lru,
            )),
            scheduler: Arc::new(Scheduler::new(SchedulerConfig { num_workers: 2 })),
        }
    }

    fn pipeline(sql: &str, resources: PipelineResources) -> StatementPipeline {
        StatementPipeline::new(sql, resources, OptimizerSettings::default(), false, None)
    }

    #[test]
    fn select_star_returns_all_rows() {
        let resources = resources();
        resources
            .storage
            .create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        resources
            .storage
            .insert_rows("t", vec![Row::new(vec![Value::Int64(1)]), Row::new(vec![Value::Int64(2)])])
            .unwrap();

        let mut pipe = pipeline("SELECT * FROM t", resources);
        let (status, result) = pipe.get_result_table().unwrap();
        assert_eq!(status, PipelineStatus::Success);
        assert_eq!(result.row_count(), 2);
    }

    #[test]
    fn create_table_produces_no_output_and_mutates_storage() {
        let resources = resources();
        let mut pipe = pipeline("CREATE TABLE t (a INT)", resources.clone());
        let (status, result) = pipe.get_result_table().unwrap();
        assert_eq!(status, PipelineStatus::Success);
        assert!(result.is_empty());
        assert!(resources.storage.has_table("t"));
    }

    #[test]
    fn create_table_conflict_fails_ddl_precheck() {
        let resources = resources();
        resources
            .storage
            .create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        let mut pipe = pipeline("CREATE TABLE t (a INT)", resources);
        assert!(pipe.get_result_table().is_err());
    }

    #[test]
    fn repeated_statement_is_a_logical_cache_hit_on_second_run() {
        let resources = resources();
        resources
            .storage
            .create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        resources
            .storage
            .insert_rows("t", vec![Row::new(vec![Value::Int64(1)])])
            .unwrap();

        let mut first = pipeline("SELECT * FROM t WHERE a = 1", resources.clone());
        first.get_result_table().unwrap();
        assert!(!first.metrics().query_plan_cache_hit);

        let mut second = pipeline("SELECT * FROM t WHERE a = 2", resources);
        second.get_result_table().unwrap();
        assert!(second.metrics().query_plan_cache_hit);
    }

    #[test]
    fn dropping_a_table_invalidates_cached_plans_referencing_it() {
        let resources = resources();
        resources
            .storage
            .create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        resources
            .storage
            .insert_rows("t", vec![Row::new(vec![Value::Int64(1)])])
            .unwrap();

        let mut select = pipeline("SELECT * FROM t WHERE a = 1", resources.clone());
        select.get_result_table().unwrap();
        assert_eq!(resources.logical_cache.len(), 1);

        let mut drop = pipeline("DROP TABLE t", resources.clone());
        drop.get_result_table().unwrap();
        assert_eq!(resources.logical_cache.len(), 0);
    }

    #[test]
    fn auto_commit_context_commits_after_a_successful_statement() {
        let resources = resources();
        resources
            .storage
            .create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        let mut pipe = StatementPipeline::new(
            "SELECT * FROM t",
            resources,
            OptimizerSettings::default(),
            true,
            None,
        );
        pipe.get_result_table().unwrap();
        assert!(pipe.transaction_context().unwrap().phase() == columnardb_common::TransactionPhase::Committed);
    }

    #[test]
    fn operator_failure_during_execution_rolls_back_when_mvcc_is_enabled() {
        let resources = resources();
        resources
            .storage
            .create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        resources
            .storage
            .insert_rows("t", vec![Row::new(vec![Value::Int64(1)])])
            .unwrap();
        let mut pipe = StatementPipeline::new(
            "SELECT * FROM t WHERE 1 / 0 = 1",
            resources,
            OptimizerSettings::default(),
            true,
            None,
        );
        let (status, _) = pipe.get_result_table().unwrap();
        assert_eq!(status, PipelineStatus::RolledBack);
        assert!(pipe.transaction_context().unwrap().was_rolled_back());
    }

    #[test]
    fn translation_failure_for_a_missing_table_is_propagated_as_an_error() {
        let resources = resources();
        let mut pipe = pipeline("SELECT * FROM missing", resources);
        assert!(pipe.get_result_table().is_err());
    }
}
