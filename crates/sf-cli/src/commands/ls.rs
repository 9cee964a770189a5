//! List command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use sf_core::Config;

use crate::cli::{GlobalArgs, LsArgs, LsOutput};
use crate::context::ProjectContext;

/// Execute the ls command
pub async fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let tasks = collect_tasks(&ctx.config);

    match args.output {
        LsOutput::Table => print_table(&tasks),
        LsOutput::Json => print_json(&tasks)?,
    }

    Ok(())
}

/// Task information for display
#[derive(Debug, Serialize)]
struct TaskInfo {
    name: String,
    phase: String,
    destination: String,
    /// Insert mode for loads; stage loads always replace
    mode: String,
    /// Transform name for loads, source location for stage tasks
    source: String,
}

/// Tasks in execution order: stage, fact, dimension
fn collect_tasks(config: &Config) -> Vec<TaskInfo> {
    let stage = config.stage.iter().map(|task| TaskInfo {
        name: task.name.clone(),
        phase: "stage".to_string(),
        destination: task.destination_table.to_string(),
        mode: format!("replace ({})", task.format),
        source: task.source_location.clone(),
    });

    let mut loads: Vec<_> = config.loads.iter().collect();
    loads.sort_by_key(|task| task.phase != sf_core::LoadPhase::Fact);
    let loads = loads.into_iter().map(|task| TaskInfo {
        name: task.name.clone(),
        phase: task.phase.to_string(),
        destination: task.destination_table.to_string(),
        mode: task.insert_mode.clone(),
        source: task.transform.clone(),
    });

    stage.chain(loads).collect()
}

/// Print tasks in table format
fn print_table(tasks: &[TaskInfo]) {
    let name_width = tasks.iter().map(|t| t.name.len()).max().unwrap_or(4).max(4);
    let phase_width = 9;
    let dest_width = tasks
        .iter()
        .map(|t| t.destination.len())
        .max()
        .unwrap_or(11)
        .max(11);
    let mode_width = tasks.iter().map(|t| t.mode.len()).max().unwrap_or(4).max(4);

    println!(
        "{:<name_width$}  {:<phase_width$}  {:<dest_width$}  {:<mode_width$}  SOURCE",
        "NAME", "PHASE", "DESTINATION", "MODE",
    );
    println!(
        "{:-<name_width$}  {:-<phase_width$}  {:-<dest_width$}  {:-<mode_width$}  {}",
        "",
        "",
        "",
        "",
        "-".repeat(30),
    );

    for task in tasks {
        println!(
            "{:<name_width$}  {:<phase_width$}  {:<dest_width$}  {:<mode_width$}  {}",
            task.name, task.phase, task.destination, task.mode, task.source,
        );
    }

    println!();
    println!("{} tasks found", tasks.len());
}

/// Print tasks in JSON format
fn print_json(tasks: &[TaskInfo]) -> Result<()> {
    let json = serde_json::to_string_pretty(tasks).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}
