//! In-memory column-oriented table storage.

use columnardb_common::{Row, Value};
use columnardb_ir::PlanSchema;

use crate::stats::{ColumnStats, TableStats};

#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: PlanSchema,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: PlanSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &PlanSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn append_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn append_rows(&mut self, rows: impl IntoIterator<Item = Row>) {
        self.rows.extend(rows);
    }

    /// Recomputes per-column statistics from the current row data. Called
    /// after every mutation so the next plan's cacheability gate and
    /// cost-based rules see fresh numbers; cheap enough at the table sizes
    /// this engine targets, unlike the reference implementation's segment
    /// histograms which are rebuilt incrementally.
    pub fn compute_stats(&self) -> TableStats {
        let mut stats = TableStats::new(self.rows.len());
        for (col_idx, (col_name, _)) in self.schema.columns().iter().enumerate() {
            let values: Vec<Value> = self
                .rows
                .iter()
                .map(|r| r.get(col_idx).cloned().unwrap_or(Value::Null))
                .collect();
            stats
                .column_stats
                .insert(col_name.clone(), ColumnStats::from_values(&values));
        }
        stats
    }
}
