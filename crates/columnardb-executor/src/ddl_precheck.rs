//! DDL/IO precheck.
//!
//! Existence-precondition validation for every DDL and IO plan root, run
//! once by the pipeline before the plan is handed to the scheduler. Without
//! this, a `CreateTable` for a name that already exists would only fail
//! partway through operator execution; running the check up front keeps
//! that failure cheap (no worker pool involved) and keeps the operator's
//! own `execute` free to assume its precondition already holds.

use columnardb_common::error::{Error, Result};
use columnardb_ir::LogicalPlan;
use columnardb_storage::StorageManager;

/// Validates the existence precondition for `plan`'s DDL/IO root, if it has
/// one. Non-DDL plans (queries, `Insert`) have nothing to check here and
/// always return `Ok(())`.
pub fn precheck(plan: &LogicalPlan, storage: &StorageManager) -> Result<()> {
    match plan {
        LogicalPlan::CreateTable {
            table_name,
            if_not_exists,
            ..
        } => {
            if !if_not_exists && storage.has_table(table_name) {
                return Err(Error::name_conflict(table_name));
            }
            Ok(())
        }
        LogicalPlan::DropTable { table_names, if_exists } => {
            if *if_exists {
                return Ok(());
            }
            for name in table_names {
                if !storage.has_table(name) {
                    return Err(Error::not_found(name));
                }
            }
            Ok(())
        }
        LogicalPlan::CreateView { name, if_not_exists, .. } => {
            if !if_not_exists && storage.has_view(name) {
                return Err(Error::name_conflict(name));
            }
            Ok(())
        }
        LogicalPlan::DropView { name, if_exists } => {
            if !if_exists && !storage.has_view(name) {
                return Err(Error::not_found(name));
            }
            Ok(())
        }
        LogicalPlan::CreatePreparedPlan { name, .. } => {
            if storage.has_prepared_plan(name) {
                return Err(Error::name_conflict(name));
            }
            Ok(())
        }
        LogicalPlan::Import { file_path, .. } => {
            if !std::path::Path::new(file_path).exists() {
                return Err(Error::file_not_found(file_path));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnardb_common::DataType;

    fn storage_with_table(name: &str) -> StorageManager {
        let storage = StorageManager::new();
        storage
            .create_table(name, vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        storage
    }

    #[test]
    fn create_table_conflicts_when_name_already_exists() {
        let storage = storage_with_table("t");
        let plan = LogicalPlan::CreateTable {
            table_name: "t".into(),
            columns: vec![],
            if_not_exists: false,
        };
        assert!(matches!(precheck(&plan, &storage), Err(Error::NameConflict(_))));
    }

    #[test]
    fn create_table_if_not_exists_tolerates_conflict() {
        let storage = storage_with_table("t");
        let plan = LogicalPlan::CreateTable {
            table_name: "t".into(),
            columns: vec![],
            if_not_exists: true,
        };
        assert!(precheck(&plan, &storage).is_ok());
    }

    #[test]
    fn drop_table_not_found_without_if_exists() {
        let storage = StorageManager::new();
        let plan = LogicalPlan::DropTable {
            table_names: vec!["missing".into()],
            if_exists: false,
        };
        assert!(matches!(precheck(&plan, &storage), Err(Error::NotFound(_))));
    }

    #[test]
    fn import_missing_file_fails_precheck() {
        let storage = StorageManager::new();
        let plan = LogicalPlan::Import {
            table_name: "t".into(),
            file_path: "/nonexistent/path/does-not-exist.csv".into(),
        };
        assert!(matches!(precheck(&plan, &storage), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn create_prepared_plan_conflicts_on_reused_name() {
        let storage = StorageManager::new();
        storage
            .register_prepared_plan("p", LogicalPlan::Scan {
                table_name: "t".into(),
                schema: columnardb_ir::PlanSchema::empty(),
            })
            .unwrap();
        let plan = LogicalPlan::CreatePreparedPlan {
            name: "p".into(),
            query: Box::new(LogicalPlan::Scan {
                table_name: "t".into(),
                schema: columnardb_ir::PlanSchema::empty(),
            }),
        };
        assert!(matches!(precheck(&plan, &storage), Err(Error::NameConflict(_))));
    }

    #[test]
    fn select_plans_have_nothing_to_check() {
        let storage = StorageManager::new();
        let plan = LogicalPlan::Scan {
            table_name: "t".into(),
            schema: columnardb_ir::PlanSchema::empty(),
        };
        assert!(precheck(&plan, &storage).is_ok());
    }
}
