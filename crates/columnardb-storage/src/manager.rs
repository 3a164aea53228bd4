//! The catalog of tables, views, and prepared plans.
//!
//! Grounded on the reference session's `SessionCatalog`/`CatalogProvider`
//! split: a narrow read interface the translator depends on, backed by a
//! `parking_lot::RwLock`-guarded registry the executor mutates for DDL.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use columnardb_common::error::{Error, Result};
use columnardb_common::{DataType, Row, Value};
use columnardb_ir::{CatalogProvider, LogicalPlan, PlanSchema};

use crate::stats::TableStats;
use crate::table::Table;

#[derive(Default)]
pub struct StorageManager {
    tables: RwLock<FxHashMap<String, Table>>,
    views: RwLock<FxHashMap<String, LogicalPlan>>,
    prepared_plans: RwLock<FxHashMap<String, LogicalPlan>>,
}

impl StorageManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    pub fn has_view(&self, name: &str) -> bool {
        self.views.read().contains_key(name)
    }

    pub fn has_prepared_plan(&self, name: &str) -> bool {
        self.prepared_plans.read().contains_key(name)
    }

    pub fn get_table_rows(&self, name: &str) -> Option<Vec<Row>> {
        self.tables.read().get(name).map(|t| t.rows().to_vec())
    }

    pub fn get_table_schema_owned(&self, name: &str) -> Option<PlanSchema> {
        self.tables.read().get(name).map(|t| t.schema().clone())
    }

    pub fn get_table_stats(&self, name: &str) -> Option<TableStats> {
        self.tables.read().get(name).map(|t| t.compute_stats())
    }

    pub fn create_table(
        &self,
        name: &str,
        columns: Vec<(String, DataType)>,
        if_not_exists: bool,
    ) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            if if_not_exists {
                return Ok(());
            }
            return Err(Error::name_conflict(name));
        }
        tables.insert(name.to_string(), Table::new(name, PlanSchema::new(columns)));
        Ok(())
    }

    pub fn drop_table(&self, names: &[String], if_exists: bool) -> Result<()> {
        let mut tables = self.tables.write();
        for name in names {
            if tables.remove(name).is_none() && !if_exists {
                return Err(Error::not_found(name.clone()));
            }
        }
        Ok(())
    }

    pub fn insert_rows(&self, table_name: &str, rows: Vec<Row>) -> Result<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))?;
        table.append_rows(rows);
        Ok(())
    }

    pub fn create_view(&self, name: &str, query: LogicalPlan, if_not_exists: bool) -> Result<()> {
        let mut views = self.views.write();
        if views.contains_key(name) {
            if if_not_exists {
                return Ok(());
            }
            return Err(Error::name_conflict(name));
        }
        views.insert(name.to_string(), query);
        Ok(())
    }

    pub fn drop_view(&self, name: &str, if_exists: bool) -> Result<()> {
        let mut views = self.views.write();
        if views.remove(name).is_none() && !if_exists {
            return Err(Error::not_found(name.to_string()));
        }
        Ok(())
    }

    pub fn register_prepared_plan(&self, name: &str, plan: LogicalPlan) -> Result<()> {
        let mut plans = self.prepared_plans.write();
        if plans.contains_key(name) {
            return Err(Error::name_conflict(name));
        }
        plans.insert(name.to_string(), plan);
        Ok(())
    }

    pub fn get_prepared_plan(&self, name: &str) -> Option<LogicalPlan> {
        self.prepared_plans.read().get(name).cloned()
    }

    /// Reads a delimiter-separated file into rows matching `table_name`'s
    /// schema. A missing file is the documented `FileNotFound` scenario.
    pub fn import_file(&self, table_name: &str, file_path: &str) -> Result<Vec<Row>> {
        let schema = self
            .get_table_schema_owned(table_name)
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))?;
        let contents = std::fs::read_to_string(file_path)
            .map_err(|_| Error::file_not_found(file_path.to_string()))?;
        let mut rows = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let mut values = Vec::with_capacity(schema.len());
            for (i, field) in line.split(',').enumerate() {
                let field = field.trim();
                let data_type = schema
                    .columns()
                    .get(i)
                    .map(|(_, t)| *t)
                    .unwrap_or(DataType::String);
                values.push(parse_field(field, data_type));
            }
            rows.push(Row::new(values));
        }
        Ok(rows)
    }
}

fn parse_field(field: &str, data_type: DataType) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    match data_type {
        DataType::Int64 => field.parse::<i64>().map(Value::Int64).unwrap_or(Value::Null),
        DataType::Float64 => field.parse::<f64>().map(Value::Float64).unwrap_or(Value::Null),
        DataType::Boolean => field.parse::<bool>().map(Value::Boolean).unwrap_or(Value::Null),
        DataType::String | DataType::Null => Value::String(field.to_string()),
    }
}

impl CatalogProvider for StorageManager {
    fn get_table_schema(&self, name: &str) -> Option<PlanSchema> {
        self.get_table_schema_owned(name)
    }

    fn get_view_query(&self, name: &str) -> Option<LogicalPlan> {
        self.views.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_table_twice_without_if_not_exists_conflicts() {
        let mgr = StorageManager::new();
        mgr.create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        let err = mgr
            .create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap_err();
        assert!(matches!(err, Error::NameConflict(_)));
    }

    #[test]
    fn create_table_if_not_exists_is_idempotent() {
        let mgr = StorageManager::new();
        mgr.create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        mgr.create_table("t", vec![("a".into(), DataType::Int64)], true)
            .unwrap();
    }

    #[test]
    fn drop_table_missing_without_if_exists_errors() {
        let mgr = StorageManager::new();
        let err = mgr.drop_table(&["t".to_string()], false).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn import_missing_file_is_file_not_found() {
        let mgr = StorageManager::new();
        mgr.create_table("t", vec![("a".into(), DataType::Int64)], false)
            .unwrap();
        let err = mgr.import_file("t", "/nonexistent/missing.csv").unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn insert_into_missing_table_is_table_not_found() {
        let mgr = StorageManager::new();
        let err = mgr
            .insert_rows("missing", vec![Row::new(vec![Value::Int64(1)])])
            .unwrap_err();
        assert!(matches!(err, Error::TableNotFound(_)));
    }
}
