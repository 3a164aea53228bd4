//! Error kinds for the execution pipeline, discriminated at the boundary.
//!
//! Stage-local assertions (single statement, non-empty SQL, translator arity)
//! are treated as internal invariants: if one of them is reached, it is a bug
//! in this crate, not a malformed query, so they panic via `debug_assert!`
//! rather than round-tripping through `Error`. Everything below is an
//! external-cause error reported to the caller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("parse error at offset {offset}: {message} (near {token:?})")]
    ParseError {
        offset: usize,
        token: String,
        message: String,
    },

    #[error("failed to translate statement into a logical plan: {0}")]
    TranslationError(String),

    #[error("optimization rule failed its precondition: {0}")]
    OptimizationError(String),

    #[error("'{0}' already exists")]
    NameConflict(String),

    #[error("'{0}' does not exist")]
    NotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("prepared plan expects {expected} parameters, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("parameter type mismatch: placeholder expects {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn parse_error(offset: usize, token: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ParseError {
            offset,
            token: token.into(),
            message: message.into(),
        }
    }

    pub fn translation_error(msg: impl Into<String>) -> Self {
        Error::TranslationError(msg.into())
    }

    pub fn name_conflict(name: impl Into<String>) -> Self {
        Error::NameConflict(name.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Error::NotFound(name.into())
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Error::FileNotFound(path.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}
