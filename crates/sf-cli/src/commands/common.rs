//! Shared utilities for CLI commands

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Exit code when a stage or load task failed
pub(crate) const EXIT_TASK_FAILED: u8 = 4;

/// Exit code when a fail-severity quality check did not pass
pub(crate) const EXIT_QUALITY_FAILED: u8 = 5;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: the command has already reported the failure.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Status of one workflow task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TaskStatus {
    Success,
    Error,
    Skipped,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Error => write!(f, "error"),
            TaskStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Print a ✓ progress line
pub(crate) fn print_success(name: &str, detail: &str, duration: Duration) {
    println!("  ✓ {} ({}) [{}ms]", name, detail, duration.as_millis());
}

/// Print a ✗ progress line
pub(crate) fn print_failure(name: &str, error: &dyn fmt::Display, duration: Duration) {
    println!("  ✗ {} - {} [{}ms]", name, error, duration.as_millis());
}
