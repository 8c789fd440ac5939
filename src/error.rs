//! Unified error types for the runtime.
//!
//! Each concern has its own error enum ([`SchemaCodecError`],
//! [`CompileError`](crate::query::CompileError)); they all fold into
//! [`RuntimeError`], which is what the catalog store and the request
//! service return.

use thiserror::Error;

use crate::catalog::ObjectType;
use crate::query::CompileError;
use crate::schema::SchemaCodecError;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors surfaced by the catalog store and the metrics view service.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A tenant or object does not exist, or has the wrong type.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// What was looked up ("tenant", "object", "metrics view").
        kind: &'static str,
        /// The name or id that was looked up.
        name: String,
    },

    /// The object exists but has another type than the operation requires.
    /// Reported to clients as not found.
    #[error("object '{name}' is a {actual}, not a {expected}")]
    WrongObjectType {
        name: String,
        expected: ObjectType,
        actual: ObjectType,
    },

    /// The request is malformed (bad filter value, bad query shape).
    #[error("invalid request: {0}")]
    Validation(String),

    /// The schema blob could not be encoded or decoded.
    #[error("schema encoding error: {0}")]
    SchemaEncoding(#[from] SchemaCodecError),

    /// Backing store I/O or constraint failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Backing store unusable for a reason other than a SQLite error.
    #[error("storage error: {0}")]
    StorageUnavailable(String),

    /// An aggregate query that must return one row returned none.
    #[error("degenerate result: {0}")]
    DegenerateResult(String),

    /// A result row does not match its declared column types.
    #[error("result conversion error: {0}")]
    ResultConversion(String),

    /// The external executor rejected or failed the statement.
    #[error("query execution failed: {0}")]
    Execution(String),
}

impl RuntimeError {
    /// Create a not-found error.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Whether the error is caused by the caller (4xx) rather than the system (5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::WrongObjectType { .. }
                | Self::Validation(_)
                | Self::Execution(_)
        )
    }

    /// Canonical status code name for the response layer.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::WrongObjectType { .. } => "NOT_FOUND",
            Self::Validation(_) | Self::Execution(_) => "INVALID_ARGUMENT",
            Self::SchemaEncoding(_)
            | Self::Storage(_)
            | Self::StorageUnavailable(_)
            | Self::DegenerateResult(_)
            | Self::ResultConversion(_) => "INTERNAL",
        }
    }
}

impl From<CompileError> for RuntimeError {
    fn from(err: CompileError) -> Self {
        Self::Validation(err.to_string())
    }
}
