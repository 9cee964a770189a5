//! Setup command implementation

use anyhow::{Context, Result};
use sf_core::catalog::STAR_SCHEMA_DDL;
use sf_db::Database;

use crate::cli::{GlobalArgs, SetupArgs};
use crate::context::ProjectContext;

/// Execute the setup command
pub async fn execute(args: &SetupArgs, global: &GlobalArgs) -> Result<()> {
    if args.print {
        println!("{}", STAR_SCHEMA_DDL.trim());
        return Ok(());
    }

    let ctx = ProjectContext::load(global)?;
    let db = ctx.connect()?;

    db.execute_batch(STAR_SCHEMA_DDL)
        .await
        .context("Failed to create star-schema tables")?;

    println!("Created staging and star-schema tables for '{}'", ctx.config.name);
    Ok(())
}
