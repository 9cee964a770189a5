//! Load command implementation

use anyhow::Result;
use sf_core::LoadPhase;
use sf_db::Database;
use sf_load::IncrementalLoader;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::{GlobalArgs, LoadArgs};
use crate::commands::common::{print_failure, print_success, ExitCode, EXIT_TASK_FAILED};
use crate::context::{parse_name_list, ProjectContext};

/// Execute the load command.
///
/// Fact loads run before dimension loads. The first failure stops the
/// command.
pub async fn execute(args: &LoadArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let filter = parse_name_list(&args.tasks);
    let phases = match args.phase {
        Some(phase) => vec![LoadPhase::from(phase)],
        None => vec![LoadPhase::Fact, LoadPhase::Dimension],
    };

    let mut operations = Vec::new();
    for phase in phases {
        operations.extend(ctx.load_operations(Some(phase), filter.as_deref())?);
    }

    let db: Arc<dyn Database> = ctx.connect()?;
    let loader = IncrementalLoader::new(db);

    println!("Loading {} tables...\n", operations.len());

    for (index, (name, operation)) in operations.iter().enumerate() {
        let start = Instant::now();
        match loader.load(operation).await {
            Ok(summary) => print_success(
                name,
                &format!(
                    "{}, {}, {} rows",
                    summary.destination, summary.mode, summary.staged_rows
                ),
                summary.duration,
            ),
            Err(e) => {
                print_failure(name, &e, start.elapsed());
                let remaining = operations.len() - index - 1;
                if remaining > 0 {
                    println!("  {} load(s) skipped", remaining);
                }
                return Err(ExitCode(EXIT_TASK_FAILED).into());
            }
        }
    }

    println!();
    println!("Completed: {} loads", operations.len());
    Ok(())
}
