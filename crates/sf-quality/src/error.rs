//! Error types for sf-quality

use sf_core::CoreError;
use sf_db::DbError;
use thiserror::Error;

/// Quality run errors
#[derive(Error, Debug)]
pub enum QualityError {
    /// Unknown check kind or a target that does not fit it (Q001)
    #[error("[Q001] Quality configuration error: {0}")]
    Configuration(#[from] CoreError),

    /// A check query could not be executed (Q002)
    #[error("[Q002] Quality check storage error: {0}")]
    Storage(#[from] DbError),

    /// A fail-severity check did not pass (Q003)
    #[error("[Q003] Data quality check '{check}' failed on {target}: expected {expected}, got {actual}")]
    Failure {
        check: String,
        table: String,
        target: String,
        expected: String,
        actual: String,
    },
}

impl QualityError {
    /// Whether the driver may retry the quality run
    pub fn is_retryable(&self) -> bool {
        matches!(self, QualityError::Storage(_))
    }
}

/// Result type alias for QualityError
pub type QualityResult<T> = Result<T, QualityError>;
