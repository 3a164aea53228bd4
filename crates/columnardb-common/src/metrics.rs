//! Per-statement timings, recorded with nanosecond resolution on a monotonic
//! clock. Mirrors the timing fields the reference pipeline accumulates on
//! `SQLPipelineStatementMetrics` (sql_translation/cache/optimization/
//! lqp_translation/plan_execution durations plus the cache-hit flag).

use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct StatementMetrics {
    pub sql_translation_duration: Duration,
    pub uniform_check_duration: Duration,
    pub cache_duration: Duration,
    pub optimization_duration: Duration,
    pub lqp_translation_duration: Duration,
    pub plan_execution_duration: Duration,
    pub query_plan_cache_hit: bool,
}

impl StatementMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every recorded stage. Used by tests to check
    /// `sum(stage durations) <= wall_clock_total`.
    pub fn total_recorded(&self) -> Duration {
        self.sql_translation_duration
            + self.uniform_check_duration
            + self.cache_duration
            + self.optimization_duration
            + self.lqp_translation_duration
            + self.plan_execution_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_metrics_have_zero_durations() {
        let m = StatementMetrics::new();
        assert_eq!(m.total_recorded(), Duration::ZERO);
        assert!(!m.query_plan_cache_hit);
    }
}
