//! Run results written to `target/run_results.json`

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::commands::common::TaskStatus;

/// Result of one workflow task
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TaskRunResult {
    pub task: String,
    pub phase: String,
    pub status: TaskStatus,
    pub attempts: u32,
    pub rows: Option<usize>,
    pub duration_secs: f64,
    pub error: Option<String>,
}

impl TaskRunResult {
    /// A task that never started because an earlier phase failed
    pub fn skipped(task: &str, phase: &str) -> Self {
        Self {
            task: task.to_string(),
            phase: phase.to_string(),
            status: TaskStatus::Skipped,
            attempts: 0,
            rows: None,
            duration_secs: 0.0,
            error: None,
        }
    }
}

/// A quality check that passed with a warning
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CheckWarning {
    pub check: String,
    pub target: String,
    pub expected: String,
    pub actual: Option<i64>,
}

/// Run results file format
#[derive(Debug, Serialize)]
struct RunResults<'a> {
    timestamp: DateTime<Utc>,
    elapsed_secs: f64,
    success_count: usize,
    failure_count: usize,
    skipped_count: usize,
    results: &'a [TaskRunResult],
    warnings: &'a [CheckWarning],
}

/// Write run results to `<target_dir>/run_results.json`
pub(crate) fn write_run_results(
    target_dir: &Path,
    results: &[TaskRunResult],
    warnings: &[CheckWarning],
    start_time: Instant,
) -> Result<PathBuf> {
    let count = |status: TaskStatus| results.iter().filter(|r| r.status == status).count();
    let run_results = RunResults {
        timestamp: Utc::now(),
        elapsed_secs: start_time.elapsed().as_secs_f64(),
        success_count: count(TaskStatus::Success),
        failure_count: count(TaskStatus::Error),
        skipped_count: count(TaskStatus::Skipped),
        results,
        warnings,
    };

    std::fs::create_dir_all(target_dir).context("Failed to create target directory")?;
    let results_path = target_dir.join("run_results.json");
    let results_json =
        serde_json::to_string_pretty(&run_results).context("Failed to serialize run results")?;
    std::fs::write(&results_path, results_json).context("Failed to write run_results.json")?;

    Ok(results_path)
}
