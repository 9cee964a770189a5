//! Error types for sf-load

use sf_core::CoreError;
use sf_db::DbError;
use thiserror::Error;

/// Load errors
#[derive(Error, Debug)]
pub enum LoadError {
    /// Unknown mode, unknown transform or a bad stage definition (L001).
    ///
    /// Raised before any statement reaches the warehouse.
    #[error("[L001] Load configuration error: {0}")]
    Configuration(#[from] CoreError),

    /// The warehouse rejected a statement or the connection failed (L002)
    #[error("[L002] Load storage error: {0}")]
    Storage(#[from] DbError),

    /// The destination or source shape does not fit the load (L003)
    #[error("[L003] Load of '{table}' rejected: {reason}")]
    Shape { table: String, reason: String },
}

impl LoadError {
    /// Whether the driver may retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoadError::Storage(_))
    }
}

/// Result type alias for LoadError
pub type LoadResult<T> = Result<T, LoadError>;
