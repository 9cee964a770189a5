//! Check command implementation

use anyhow::{bail, Result};
use sf_core::CheckGroup;
use sf_quality::{CheckOutcome, CheckRunner, CheckStatus, QualityError};

use crate::cli::{CheckArgs, GlobalArgs};
use crate::commands::common::{ExitCode, EXIT_QUALITY_FAILED};
use crate::context::{parse_name_list, ProjectContext};

/// Execute the check command
pub async fn execute(args: &CheckArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let groups = select_groups(&ctx.config.quality.checks, parse_name_list(&args.kinds))?;
    let db = ctx.connect()?;

    let target_count: usize = groups.iter().map(|g| g.targets.len()).sum();
    println!("Running {} checks...\n", target_count);

    match CheckRunner::new(db.as_ref()).run_checks(&groups).await {
        Ok(report) => {
            for outcome in &report.outcomes {
                print_outcome(outcome);
            }
            let warnings = report.warnings().count();
            println!();
            println!(
                "Completed: {} passed, {} warnings [{}ms]",
                report.passed(),
                warnings,
                report.duration.as_millis()
            );
            Ok(())
        }
        Err(e @ QualityError::Failure { .. }) => {
            println!("  ✗ {}", e);
            Err(ExitCode(EXIT_QUALITY_FAILED).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Keep the configured groups whose kind is in `kinds`, in config order
pub(crate) fn select_groups(
    groups: &[CheckGroup],
    kinds: Option<Vec<String>>,
) -> Result<Vec<CheckGroup>> {
    let Some(kinds) = kinds else {
        return Ok(groups.to_vec());
    };
    for kind in &kinds {
        if !groups.iter().any(|g| &g.kind == kind) {
            bail!("No checks of kind '{}' are configured", kind);
        }
    }
    Ok(groups
        .iter()
        .filter(|g| kinds.contains(&g.kind))
        .cloned()
        .collect())
}

/// Print one check outcome
pub(crate) fn print_outcome(outcome: &CheckOutcome) {
    let actual = outcome
        .actual
        .map_or_else(|| "NULL".to_string(), |v| v.to_string());
    match outcome.status {
        CheckStatus::Pass => println!(
            "  ✓ {} on {} [{}ms]",
            outcome.kind,
            outcome.target,
            outcome.duration.as_millis()
        ),
        CheckStatus::Warn => println!(
            "  ! {} on {}: expected {}, got {}",
            outcome.kind, outcome.target, outcome.expected, actual
        ),
    }
}
