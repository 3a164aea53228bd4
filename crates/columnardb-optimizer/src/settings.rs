//! Optimizer configuration.
//!
//! Grounded on the reference optimizer's `OptimizationLevel`/`RuleFlags`
//! split: a coarse level picks a sensible default for every rule, and
//! `RuleFlags` lets a caller override any one of them individually. We carry
//! a smaller rule set than the reference crate's because this engine's IR
//! has no join-reorder or projection-pushdown machinery (join planning is
//! out of scope) — see `DESIGN.md` for the drop.

use rustc_hash::FxHashMap;

use columnardb_storage::TableStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OptimizationLevel {
    None,
    Basic,
    #[default]
    Standard,
    Aggressive,
    Full,
}

impl OptimizationLevel {
    fn rank(self) -> u8 {
        match self {
            OptimizationLevel::None => 0,
            OptimizationLevel::Basic => 1,
            OptimizationLevel::Standard => 2,
            OptimizationLevel::Aggressive => 3,
            OptimizationLevel::Full => 4,
        }
    }
}

impl PartialOrd for OptimizationLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OptimizationLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RuleFlags {
    pub constant_folding: Option<bool>,
    pub trivial_predicate_removal: Option<bool>,
    pub empty_propagation: Option<bool>,
    pub filter_merging: Option<bool>,
    pub redundant_project_elimination: Option<bool>,
}

impl RuleFlags {
    pub fn all_enabled() -> Self {
        Self {
            constant_folding: Some(true),
            trivial_predicate_removal: Some(true),
            empty_propagation: Some(true),
            filter_merging: Some(true),
            redundant_project_elimination: Some(true),
        }
    }

    pub fn all_disabled() -> Self {
        Self {
            constant_folding: Some(false),
            trivial_predicate_removal: Some(false),
            empty_propagation: Some(false),
            filter_merging: Some(false),
            redundant_project_elimination: Some(false),
        }
    }

    /// Only the rules safe to re-run after placeholders have been bound
    /// back to literal values (the pruning optimizer's subset). Join
    /// planning and projection rules do not belong here: they were already
    /// applied once to the template and re-running them per instantiation
    /// would waste the caching this pass exists to preserve.
    pub fn pruning_subset() -> Self {
        Self {
            constant_folding: Some(true),
            trivial_predicate_removal: Some(true),
            empty_propagation: Some(true),
            filter_merging: Some(false),
            redundant_project_elimination: Some(false),
        }
    }
}

#[derive(Clone, Debug)]
pub struct OptimizerSettings {
    pub level: OptimizationLevel,
    pub table_stats: FxHashMap<String, TableStats>,
    pub rules: RuleFlags,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self::with_level(OptimizationLevel::Standard)
    }
}

impl OptimizerSettings {
    pub fn with_level(level: OptimizationLevel) -> Self {
        Self {
            level,
            table_stats: FxHashMap::default(),
            rules: RuleFlags::default(),
        }
    }

    pub fn with_table_stats(mut self, stats: FxHashMap<String, TableStats>) -> Self {
        self.table_stats = stats;
        self
    }

    pub fn with_rules(mut self, rules: RuleFlags) -> Self {
        self.rules = rules;
        self
    }

    pub(crate) fn rule_enabled(&self, flag: Option<bool>, min_level: OptimizationLevel) -> bool {
        match flag {
            Some(enabled) => enabled,
            None => self.level >= min_level,
        }
    }
}
