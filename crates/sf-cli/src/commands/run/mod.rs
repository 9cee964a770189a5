//! Run command: the reference workflow driver.
//!
//! Phases run in order: stage tasks in parallel, fact loads one at a time,
//! dimension loads in parallel, then the quality checks. Each task is retried
//! as a whole for storage errors. A failed phase skips every later phase.

mod results;
mod retry;

use anyhow::{Context, Result};
use futures::future::join_all;
use sf_core::{CheckGroup, LoadPhase, RetryConfig};
use sf_db::{Database, DuckDbBackend};
use sf_load::{CredentialProvider, IncrementalLoader, LoadOperation, StageOperation, StagingLoader};
use sf_quality::{CheckRunner, QualityError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::cli::{GlobalArgs, RunArgs};
use crate::commands::check::print_outcome;
use crate::commands::common::{
    print_failure, print_success, ExitCode, TaskStatus, EXIT_QUALITY_FAILED, EXIT_TASK_FAILED,
};
use crate::context::{EnvCredentialProvider, ProjectContext};
use results::{write_run_results, CheckWarning, TaskRunResult};
use retry::{with_retry, Attempted};

const STAGE_PHASE: &str = "stage";
const QUALITY_PHASE: &str = "quality";

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let start_time = Instant::now();
    let ctx = ProjectContext::load(global)?;
    let policy = retry_policy(ctx.config.retry, args);
    let threads = args.threads.max(1);

    // Resolve everything first: configuration errors fail before any warehouse work
    let stage_ops = ctx.stage_operations(None)?;
    let fact_ops = ctx.load_operations(Some(LoadPhase::Fact), None)?;
    let dimension_ops = ctx.load_operations(Some(LoadPhase::Dimension), None)?;
    let check_groups = if args.skip_checks {
        Vec::new()
    } else {
        ctx.config.quality.checks.clone()
    };

    let db = ctx.connect()?;
    let credentials: Arc<dyn CredentialProvider> = Arc::new(EnvCredentialProvider);

    log::debug!(
        "Retry policy: {} attempts, {}s apart",
        policy.max_attempts(),
        policy.delay_secs
    );
    println!(
        "Running '{}': {} stage, {} fact, {} dimension tasks\n",
        ctx.config.name,
        stage_ops.len(),
        fact_ops.len(),
        dimension_ops.len()
    );

    let mut results: Vec<TaskRunResult> = Vec::new();
    let mut warnings: Vec<CheckWarning> = Vec::new();
    let mut quality_failed = false;

    // Stage
    let fact_names: Vec<String> = fact_ops.iter().map(|(name, _)| name.clone()).collect();
    let dimension_names: Vec<String> =
        dimension_ops.iter().map(|(name, _)| name.clone()).collect();

    let stage_tasks = stage_ops
        .into_iter()
        .map(|(name, operation)| {
            let loader = StagingLoader::new(open_connection(&db)?)
                .with_credentials(Arc::clone(&credentials));
            Ok((
                name.clone(),
                run_stage_task(loader, name, operation, policy),
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    results.extend(run_in_parallel(stage_tasks, STAGE_PHASE, threads).await);

    // Facts
    if phase_failed(&results) {
        skip(&mut results, &fact_names, LoadPhase::Fact);
    } else {
        let primary: Arc<dyn Database> = db.clone();
        for (index, (name, operation)) in fact_ops.into_iter().enumerate() {
            let loader = IncrementalLoader::new(Arc::clone(&primary));
            let result = run_load_task(loader, name, operation, LoadPhase::Fact, policy).await;
            let failed = result.status == TaskStatus::Error;
            results.push(result);
            if failed {
                skip(&mut results, &fact_names[index + 1..], LoadPhase::Fact);
                break;
            }
        }
    }

    // Dimensions
    if phase_failed(&results) {
        skip(&mut results, &dimension_names, LoadPhase::Dimension);
    } else {
        let dimension_tasks = dimension_ops
            .into_iter()
            .map(|(name, operation)| {
                let loader = IncrementalLoader::new(open_connection(&db)?);
                Ok((
                    name.clone(),
                    run_load_task(loader, name, operation, LoadPhase::Dimension, policy),
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let phase = LoadPhase::Dimension.to_string();
        results.extend(run_in_parallel(dimension_tasks, &phase, threads).await);
    }

    // Quality
    if !check_groups.is_empty() {
        if phase_failed(&results) {
            results.push(TaskRunResult::skipped(QUALITY_PHASE, QUALITY_PHASE));
        } else {
            let (result, check_warnings, failure) =
                run_quality(db.as_ref(), &check_groups, policy).await;
            quality_failed = failure;
            warnings = check_warnings;
            results.push(result);
        }
    }

    let results_path = write_run_results(&ctx.target_dir(), &results, &warnings, start_time)?;
    log::debug!("Wrote {}", results_path.display());

    let count = |status: TaskStatus| results.iter().filter(|r| r.status == status).count();
    let skipped = count(TaskStatus::Skipped);
    println!();
    if skipped > 0 {
        println!("  {} task(s) skipped due to an earlier failure", skipped);
    }
    println!(
        "Completed: {} succeeded, {} failed, {} warnings",
        count(TaskStatus::Success),
        count(TaskStatus::Error),
        warnings.len()
    );
    println!("Total time: {}ms", start_time.elapsed().as_millis());

    if quality_failed {
        return Err(ExitCode(EXIT_QUALITY_FAILED).into());
    }
    if count(TaskStatus::Error) > 0 {
        return Err(ExitCode(EXIT_TASK_FAILED).into());
    }
    Ok(())
}

/// Config retry policy with command-line overrides applied
fn retry_policy(mut policy: RetryConfig, args: &RunArgs) -> RetryConfig {
    if let Some(retries) = args.retries {
        policy.retries = retries;
    }
    if let Some(delay) = args.retry_delay {
        policy.delay_secs = delay;
    }
    policy
}

/// A second connection to the warehouse, so the task gets its own session
fn open_connection(db: &DuckDbBackend) -> Result<Arc<dyn Database>> {
    let conn = db
        .try_clone()
        .context("Failed to open a warehouse connection")?;
    Ok(Arc::new(conn))
}

fn phase_failed(results: &[TaskRunResult]) -> bool {
    results.iter().any(|r| r.status == TaskStatus::Error)
}

fn skip(results: &mut Vec<TaskRunResult>, names: &[String], phase: LoadPhase) {
    let phase = phase.to_string();
    results.extend(names.iter().map(|name| TaskRunResult::skipped(name, &phase)));
}

/// Run independent tasks of one phase, at most `threads` at a time
async fn run_in_parallel<F>(
    tasks: Vec<(String, F)>,
    phase: &str,
    threads: usize,
) -> Vec<TaskRunResult>
where
    F: Future<Output = TaskRunResult> + Send + 'static,
{
    if tasks.is_empty() {
        return Vec::new();
    }
    println!("  [{}: {} tasks, {} threads]", phase, tasks.len(), threads);

    let semaphore = Arc::new(Semaphore::new(threads));
    let mut names = Vec::with_capacity(tasks.len());
    let mut handles = Vec::with_capacity(tasks.len());

    for (name, task) in tasks {
        let semaphore = Arc::clone(&semaphore);
        names.push(name);
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            task.await
        }));
    }

    names
        .into_iter()
        .zip(join_all(handles).await)
        .map(|(name, joined)| {
            joined.unwrap_or_else(|e| {
                println!("  ✗ {} - task aborted: {}", name, e);
                TaskRunResult {
                    task: name,
                    phase: phase.to_string(),
                    status: TaskStatus::Error,
                    attempts: 1,
                    rows: None,
                    duration_secs: 0.0,
                    error: Some(e.to_string()),
                }
            })
        })
        .collect()
}

/// Turn the final attempt of a task into its run result
fn record<T, E: fmt::Display>(
    name: String,
    phase: &str,
    attempted: Attempted<T, E>,
    start: Instant,
    describe: impl FnOnce(&T) -> (usize, String),
) -> TaskRunResult {
    let duration = start.elapsed();
    let (status, rows, error) = match &attempted.result {
        Ok(value) => {
            let (rows, detail) = describe(value);
            print_success(&name, &detail, duration);
            (TaskStatus::Success, Some(rows), None)
        }
        Err(e) => {
            print_failure(&name, e, duration);
            (TaskStatus::Error, None, Some(e.to_string()))
        }
    };
    TaskRunResult {
        task: name,
        phase: phase.to_string(),
        status,
        attempts: attempted.attempts,
        rows,
        duration_secs: duration.as_secs_f64(),
        error,
    }
}

async fn run_stage_task(
    loader: StagingLoader,
    name: String,
    operation: StageOperation,
    policy: RetryConfig,
) -> TaskRunResult {
    let start = Instant::now();
    let attempted = with_retry(&policy, &name, || loader.stage(&operation)).await;
    record(name, STAGE_PHASE, attempted, start, |summary| {
        (
            summary.rows_loaded,
            format!("{}, {} rows", summary.destination, summary.rows_loaded),
        )
    })
}

async fn run_load_task(
    loader: IncrementalLoader,
    name: String,
    operation: LoadOperation,
    phase: LoadPhase,
    policy: RetryConfig,
) -> TaskRunResult {
    let start = Instant::now();
    let attempted = with_retry(&policy, &name, || loader.load(&operation)).await;
    record(name, &phase.to_string(), attempted, start, |summary| {
        (
            summary.staged_rows,
            format!(
                "{}, {}, {} rows",
                summary.destination, summary.mode, summary.staged_rows
            ),
        )
    })
}

/// Run every check group; returns the task result, the warnings, and
/// whether a fail-severity check failed
async fn run_quality(
    db: &dyn Database,
    groups: &[CheckGroup],
    policy: RetryConfig,
) -> (TaskRunResult, Vec<CheckWarning>, bool) {
    let runner = CheckRunner::new(db);
    let start = Instant::now();
    let attempted = with_retry(&policy, QUALITY_PHASE, || runner.run_checks(groups)).await;

    let quality_failed = matches!(attempted.result, Err(QualityError::Failure { .. }));
    let warnings = match &attempted.result {
        Ok(report) => {
            for outcome in &report.outcomes {
                print_outcome(outcome);
            }
            report
                .warnings()
                .map(|w| CheckWarning {
                    check: w.kind.to_string(),
                    target: w.target.clone(),
                    expected: w.expected.clone(),
                    actual: w.actual,
                })
                .collect()
        }
        Err(_) => Vec::new(),
    };

    let result = record(
        QUALITY_PHASE.to_string(),
        QUALITY_PHASE,
        attempted,
        start,
        |report| {
            (
                report.outcomes.len(),
                format!(
                    "{} passed, {} warnings",
                    report.passed(),
                    report.warnings().count()
                ),
            )
        },
    );
    (result, warnings, quality_failed)
}
