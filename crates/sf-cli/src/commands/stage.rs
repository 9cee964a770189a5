//! Stage command implementation

use anyhow::Result;
use sf_db::Database;
use sf_load::StagingLoader;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::{GlobalArgs, StageArgs};
use crate::commands::common::{print_failure, print_success, ExitCode, EXIT_TASK_FAILED};
use crate::context::{parse_name_list, EnvCredentialProvider, ProjectContext};

/// Execute the stage command.
///
/// Tasks run one after another; a failed task does not stop later ones.
pub async fn execute(args: &StageArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let filter = parse_name_list(&args.tasks);
    let operations = ctx.stage_operations(filter.as_deref())?;

    let db: Arc<dyn Database> = ctx.connect()?;
    let loader = StagingLoader::new(db).with_credentials(Arc::new(EnvCredentialProvider));

    println!("Staging {} tables...\n", operations.len());

    let mut failures = 0;
    for (name, operation) in &operations {
        let start = Instant::now();
        match loader.stage(operation).await {
            Ok(summary) => print_success(
                name,
                &format!("{}, {} rows", summary.destination, summary.rows_loaded),
                summary.duration,
            ),
            Err(e) => {
                failures += 1;
                print_failure(name, &e, start.elapsed());
            }
        }
    }

    println!();
    println!(
        "Completed: {} succeeded, {} failed",
        operations.len() - failures,
        failures
    );

    if failures > 0 {
        return Err(ExitCode(EXIT_TASK_FAILED).into());
    }
    Ok(())
}
