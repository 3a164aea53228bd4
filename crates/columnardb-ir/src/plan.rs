//! The logical query plan (LQP): a DAG of relational-algebra nodes.
//!
//! Equality here is structural up to placeholder identity — two plans that
//! differ only in which literal values their placeholders stood in for are
//! equal once those literals are extracted (see `columnardb-executor`'s
//! parameter extractor). `LogicalPlan` does not derive `Hash`/`Eq` directly
//! because `Expr::Literal` can carry an `f64`; the logical plan cache keys on
//! `canonical::canonicalize`'s string form instead.

use columnardb_common::DataType;

use crate::expr::Expr;
use crate::schema::{JoinType, PlanSchema, SortExpr};

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    Scan {
        table_name: String,
        schema: PlanSchema,
    },
    Filter {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },
    Project {
        input: Box<LogicalPlan>,
        expressions: Vec<Expr>,
        schema: PlanSchema,
    },
    Aggregate {
        input: Box<LogicalPlan>,
        group_by: Vec<Expr>,
        aggregates: Vec<Expr>,
        schema: PlanSchema,
    },
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        join_type: JoinType,
        condition: Option<Expr>,
    },
    Sort {
        input: Box<LogicalPlan>,
        sort_exprs: Vec<SortExpr>,
    },
    Limit {
        input: Box<LogicalPlan>,
        limit: Option<usize>,
        offset: Option<usize>,
    },
    Distinct {
        input: Box<LogicalPlan>,
    },
    Values {
        rows: Vec<Vec<Expr>>,
        schema: PlanSchema,
    },
    Insert {
        table_name: String,
        columns: Vec<String>,
        source: Box<LogicalPlan>,
    },
    CreateTable {
        table_name: String,
        columns: Vec<(String, DataType)>,
        if_not_exists: bool,
    },
    DropTable {
        table_names: Vec<String>,
        if_exists: bool,
    },
    CreateView {
        name: String,
        query: Box<LogicalPlan>,
        if_not_exists: bool,
    },
    DropView {
        name: String,
        if_exists: bool,
    },
    CreatePreparedPlan {
        name: String,
        query: Box<LogicalPlan>,
    },
    Import {
        table_name: String,
        file_path: String,
    },
    Explain {
        input: Box<LogicalPlan>,
    },
}

impl LogicalPlan {
    pub fn input(&self) -> Option<&LogicalPlan> {
        match self {
            LogicalPlan::Filter { input, .. }
            | LogicalPlan::Project { input, .. }
            | LogicalPlan::Aggregate { input, .. }
            | LogicalPlan::Sort { input, .. }
            | LogicalPlan::Limit { input, .. }
            | LogicalPlan::Distinct { input }
            | LogicalPlan::Explain { input } => Some(input),
            _ => None,
        }
    }

    pub fn schema(&self) -> PlanSchema {
        match self {
            LogicalPlan::Scan { schema, .. }
            | LogicalPlan::Project { schema, .. }
            | LogicalPlan::Aggregate { schema, .. }
            | LogicalPlan::Values { schema, .. } => schema.clone(),
            LogicalPlan::Filter { input, .. }
            | LogicalPlan::Sort { input, .. }
            | LogicalPlan::Limit { input, .. }
            | LogicalPlan::Distinct { input }
            | LogicalPlan::Explain { input } => input.schema(),
            LogicalPlan::Join { left, right, .. } => {
                let mut cols = left.schema().columns().to_vec();
                cols.extend(right.schema().columns().to_vec());
                PlanSchema::new(cols)
            }
            _ => PlanSchema::empty(),
        }
    }

    /// `true` for every DDL/IO root kind the precheck recognizes.
    pub fn is_ddl_root(&self) -> bool {
        matches!(
            self,
            LogicalPlan::CreatePreparedPlan { .. }
                | LogicalPlan::CreateTable { .. }
                | LogicalPlan::CreateView { .. }
                | LogicalPlan::DropTable { .. }
                | LogicalPlan::DropView { .. }
                | LogicalPlan::Import { .. }
        )
    }

    /// `true` when this statement produces no output rows at all (vs. an
    /// empty result set from a query that legitimately matched no rows).
    pub fn produces_no_output(&self) -> bool {
        matches!(
            self,
            LogicalPlan::CreateTable { .. }
                | LogicalPlan::DropTable { .. }
                | LogicalPlan::CreateView { .. }
                | LogicalPlan::DropView { .. }
                | LogicalPlan::CreatePreparedPlan { .. }
                | LogicalPlan::Import { .. }
                | LogicalPlan::Insert { .. }
        )
    }
}

/// The result of translating a parsed statement: the LQP plus the flags the
/// translator computes once and the rest of the pipeline reads repeatedly.
#[derive(Debug, Clone)]
pub struct TranslatedPlan {
    pub plan: LogicalPlan,
    /// Non-DDL, non-view plans are cacheable; DDL/IO statements never are.
    pub cacheable: bool,
    pub validated_for_mvcc: bool,
}

impl TranslatedPlan {
    pub fn new(plan: LogicalPlan, validated_for_mvcc: bool) -> Self {
        let cacheable = !plan.is_ddl_root() && !matches!(plan, LogicalPlan::Insert { .. });
        Self {
            plan,
            cacheable,
            validated_for_mvcc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(name: &str) -> LogicalPlan {
        LogicalPlan::Scan {
            table_name: name.into(),
            schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
        }
    }

    #[test]
    fn ddl_roots_are_recognized() {
        assert!(LogicalPlan::DropTable {
            table_names: vec!["t".into()],
            if_exists: false,
        }
        .is_ddl_root());
        assert!(!scan("t").is_ddl_root());
    }

    #[test]
    fn non_ddl_plans_are_cacheable() {
        let translated = TranslatedPlan::new(scan("t"), false);
        assert!(translated.cacheable);
    }

    #[test]
    fn ddl_plans_are_not_cacheable() {
        let translated = TranslatedPlan::new(
            LogicalPlan::CreateTable {
                table_name: "t".into(),
                columns: vec![],
                if_not_exists: false,
            },
            false,
        );
        assert!(!translated.cacheable);
    }
}
