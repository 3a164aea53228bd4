//! Shared error types, value model, and result/metrics shapes for columnardb.

pub mod error;
pub mod metrics;
pub mod result;
pub mod txn;
pub mod value;

pub use error::{Error, Result};
pub use metrics::StatementMetrics;
pub use result::{ColumnInfo, QueryResult, Row};
pub use txn::{TransactionContext, TransactionId, TransactionPhase};
pub use value::{DataType, Value};
