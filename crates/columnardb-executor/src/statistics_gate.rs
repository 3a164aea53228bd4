//! Statistics-based cacheability gate.
//!
//! Before a plan is looked up in or inserted into the logical plan cache,
//! the pipeline asks this module whether the tables the plan reads from are
//! uniformly enough distributed that a cached template (built from one set
//! of literal values) is a fair stand-in for another. The histogram math
//! itself lives in `columnardb_storage::TableStats::is_uniformly_distributed`;
//! this module's job is purely to walk the plan and collect, per scanned
//! table, which of its columns the plan actually references.

use columnardb_ir::LogicalPlan;
use columnardb_storage::StorageManager;
use rustc_hash::FxHashMap;

/// `false` means the plan should bypass the logical cache outright: a
/// skewed table makes one literal's cached plan a poor stand-in for
/// another's.
pub fn is_cacheable_under_statistics(plan: &LogicalPlan, storage: &StorageManager, threshold: usize) -> bool {
    let mut referenced: FxHashMap<String, Vec<String>> = FxHashMap::default();
    collect_references(plan, &mut referenced);
    referenced.into_iter().all(|(table, columns)| {
        match storage.get_table_stats(&table) {
            Some(stats) => stats.is_uniformly_distributed(&columns, threshold),
            // A table with no stats yet (e.g. never scanned) has nothing to
            // be skewed about.
            None => true,
        }
    })
}

fn collect_references(plan: &LogicalPlan, out: &mut FxHashMap<String, Vec<String>>) {
    match plan {
        LogicalPlan::Scan { table_name, schema } => {
            let entry = out.entry(table_name.clone()).or_default();
            for (name, _) in schema.columns() {
                if !entry.contains(name) {
                    entry.push(name.clone());
                }
            }
        }
        // Column expressions carry no table qualifier in this IR's
        // translator output, so the scan-level column list already covers
        // everything a statement can touch; only the scanned tables
        // themselves need collecting below.
        LogicalPlan::Filter { input, .. } => collect_references(input, out),
        LogicalPlan::Project { input, .. } => collect_references(input, out),
        LogicalPlan::Aggregate { input, .. } => collect_references(input, out),
        LogicalPlan::Join { left, right, .. } => {
            collect_references(left, out);
            collect_references(right, out);
        }
        LogicalPlan::Sort { input, .. }
        | LogicalPlan::Limit { input, .. }
        | LogicalPlan::Distinct { input }
        | LogicalPlan::Explain { input } => collect_references(input, out),
        LogicalPlan::Insert { source, .. } => collect_references(source, out),
        LogicalPlan::CreateView { query, .. } | LogicalPlan::CreatePreparedPlan { query, .. } => {
            collect_references(query, out)
        }
        LogicalPlan::Values { .. }
        | LogicalPlan::CreateTable { .. }
        | LogicalPlan::DropTable { .. }
        | LogicalPlan::DropView { .. }
        | LogicalPlan::Import { .. } => {}
    }
}

/// The pure collection step, exposed for tests separately from the
/// statistics lookup in `is_cacheable_under_statistics`.
#[cfg(test)]
pub(crate) fn referenced_tables(plan: &LogicalPlan) -> Vec<String> {
    let mut out = FxHashMap::default();
    collect_references(plan, &mut out);
    let mut names: Vec<String> = out.into_keys().collect();
    names.sort();
    names
}
