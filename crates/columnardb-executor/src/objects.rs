//! Collects the named objects (tables, views, prepared plans) a `LogicalPlan`
//! references, for two purposes: tagging a cache entry with what it depends
//! on (`plan_cache::PlanCache::set_with_objects`), and naming what a DDL
//! statement mutated so `invalidate_objects` can evict stale entries after
//! it commits. Grounded on the reference plan cache's object-reference
//! collection, narrowed to the object kinds this IR actually has (no
//! functions, procedures, or snapshots).

use columnardb_ir::LogicalPlan;

/// Every table/view/prepared-plan name `plan` reads from or names.
pub fn referenced_objects(plan: &LogicalPlan) -> Vec<String> {
    let mut out = Vec::new();
    collect(plan, &mut out);
    out
}

fn collect(plan: &LogicalPlan, out: &mut Vec<String>) {
    let push = |out: &mut Vec<String>, name: &str| {
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    };
    match plan {
        LogicalPlan::Scan { table_name, .. } => push(out, table_name),
        LogicalPlan::Filter { input, .. }
        | LogicalPlan::Project { input, .. }
        | LogicalPlan::Aggregate { input, .. }
        | LogicalPlan::Sort { input, .. }
        | LogicalPlan::Limit { input, .. }
        | LogicalPlan::Distinct { input }
        | LogicalPlan::Explain { input } => collect(input, out),
        LogicalPlan::Join { left, right, .. } => {
            collect(left, out);
            collect(right, out);
        }
        LogicalPlan::Insert { table_name, source, .. } => {
            push(out, table_name);
            collect(source, out);
        }
        LogicalPlan::CreateTable { table_name, .. } => push(out, table_name),
        LogicalPlan::DropTable { table_names, .. } => {
            for name in table_names {
                push(out, name);
            }
        }
        LogicalPlan::CreateView { name, query, .. } => {
            push(out, name);
            collect(query, out);
        }
        LogicalPlan::DropView { name, .. } => push(out, name),
        LogicalPlan::CreatePreparedPlan { name, query } => {
            push(out, name);
            collect(query, out);
        }
        LogicalPlan::Import { table_name, .. } => push(out, table_name),
        LogicalPlan::Values { .. } => {}
    }
}
