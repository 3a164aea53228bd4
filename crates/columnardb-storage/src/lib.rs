//! Table, view, and prepared-plan storage, plus the per-column statistics
//! that feed the optimizer's cost rules and the cacheability gate.

pub mod manager;
pub mod stats;
pub mod table;

pub use manager::StorageManager;
pub use stats::{ColumnStats, Histogram, TableStats, DEFAULT_BUCKET_COUNT, UNIFORMITY_TOLERANCE};
pub use table::Table;
