//! Error types for sf-core

use thiserror::Error;

/// Core error type for Starflow
///
/// Every variant is a configuration problem: none of them is worth retrying.
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Table or column identifier failed validation
    #[error("[E004] Invalid {kind} identifier '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },

    /// E005: Insert mode string is not one of the known modes
    #[error("[E005] Unknown insert mode '{mode}'. Valid modes: replace, append-all, append-new, merge")]
    UnknownInsertMode { mode: String },

    /// E006: Load task references a transform that is not in the catalog
    #[error("[E006] Unknown transform '{name}'. Available transforms: {available}")]
    UnknownTransform { name: String, available: String },

    /// E007: Quality check kind has no definition
    #[error("[E007] '{kind}' is not a defined quality check")]
    UnknownCheckKind { kind: String },

    /// E008: Check target does not fit the check kind's scope
    #[error("[E008] Invalid target for check '{kind}': {reason}")]
    InvalidCheckTarget { kind: String, reason: String },

    /// E009: Stage task format is missing required settings
    #[error("[E009] Invalid stage format for '{table}': {reason}")]
    InvalidStageFormat { table: String, reason: String },

    /// E010: IO error
    #[error("[E010] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E011: IO error with file path context
    #[error("[E011] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E012: YAML parse error
    #[error("[E012] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// E013: JSON parse error
    #[error("[E013] JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
