//! Incremental loads: materialize, apply under an insert mode, clean up.

use crate::error::LoadResult;
use crate::statements::{LoadPlan, LoadStatement, STAGING_AREA_MARKER};
use sf_core::{ColumnName, InsertMode, LoadTask, TableName, TransformCatalog, TransformQuery};
use sf_db::Database;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One load of a destination table
#[derive(Debug, Clone)]
pub struct LoadOperation {
    /// Query producing the rows
    pub transform: TransformQuery,

    /// Table receiving the rows
    pub destination: TableName,

    /// Key column used by `append-new` and `merge`
    pub key_column: ColumnName,

    /// How the rows are applied
    pub mode: InsertMode,
}

impl LoadOperation {
    /// Create a load operation from already-resolved parts
    pub fn new(
        transform: TransformQuery,
        destination: TableName,
        key_column: ColumnName,
        mode: InsertMode,
    ) -> Self {
        Self {
            transform,
            destination,
            key_column,
            mode,
        }
    }

    /// Resolve a configured task against the transform catalog.
    ///
    /// The insert mode is parsed here, so an unknown mode is reported
    /// before any statement is built.
    pub fn from_task(task: &LoadTask, catalog: &TransformCatalog) -> LoadResult<Self> {
        let mode = task.mode()?;
        let transform = catalog.get(&task.transform)?.clone();
        Ok(Self::new(
            transform,
            task.destination_table.clone(),
            task.key_column.clone(),
            mode,
        ))
    }
}

/// What a successful load did
#[derive(Debug, Clone)]
pub struct LoadSummary {
    /// Destination table
    pub destination: TableName,

    /// Mode applied
    pub mode: InsertMode,

    /// Rows the transform query produced
    pub staged_rows: usize,

    /// Wall-clock time of the whole operation
    pub duration: Duration,
}

/// Loads destination tables through a private staging area
pub struct IncrementalLoader {
    db: Arc<dyn Database>,
}

impl IncrementalLoader {
    /// Create a loader bound to one warehouse connection
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Parse `mode` and load `transform` into `destination`.
    ///
    /// An unknown mode is a configuration error raised before the warehouse
    /// sees any statement.
    pub async fn load_with_mode(
        &self,
        transform: &TransformQuery,
        destination: &TableName,
        key_column: &ColumnName,
        mode: &str,
    ) -> LoadResult<LoadSummary> {
        let mode: InsertMode = mode.parse()?;
        let operation = LoadOperation::new(
            transform.clone(),
            destination.clone(),
            key_column.clone(),
            mode,
        );
        self.load(&operation).await
    }

    /// Run one load operation.
    ///
    /// The apply step runs in a single transaction, so a failure leaves the
    /// destination exactly as it was. The staging area is dropped whether
    /// or not the load succeeded. The loader never retries.
    pub async fn load(&self, operation: &LoadOperation) -> LoadResult<LoadSummary> {
        let start = Instant::now();
        let staging = staging_area_name(&operation.destination)?;
        let plan = LoadPlan::new(
            &operation.transform.sql,
            &operation.destination,
            &operation.key_column,
            operation.mode,
            staging,
        );

        let result = self.materialize_and_apply(operation, &plan).await;

        // A committed load is never failed by its cleanup
        if let Err(e) = self.cleanup(&plan).await {
            log::warn!(
                "Staging area {} for {} was not dropped: {}",
                plan.staging,
                operation.destination,
                e
            );
        }

        let staged_rows = result?;
        Ok(LoadSummary {
            destination: operation.destination.clone(),
            mode: operation.mode,
            staged_rows,
            duration: start.elapsed(),
        })
    }

    async fn materialize_and_apply(
        &self,
        operation: &LoadOperation,
        plan: &LoadPlan,
    ) -> LoadResult<usize> {
        log::debug!(
            "Creating staging area {} for {}",
            plan.staging,
            operation.destination
        );
        for statement in &plan.materialize {
            if matches!(statement, LoadStatement::PopulateStagingArea { .. }) {
                log::info!(
                    "Materializing transform '{}' into {}",
                    operation.transform.name,
                    plan.staging
                );
            }
            self.db.execute(&statement.to_sql()).await?;
        }

        let staged_rows = self
            .db
            .query_count(&format!("SELECT * FROM {}", plan.staging.quoted()))
            .await?;

        log::info!(
            "Applying {} staged rows to {} ({})",
            staged_rows,
            operation.destination,
            operation.mode
        );
        self.db.execute_transaction(&plan.apply_sql()).await?;

        Ok(staged_rows)
    }

    async fn cleanup(&self, plan: &LoadPlan) -> LoadResult<()> {
        log::debug!("Dropping staging area {}", plan.staging);
        self.db.execute(&plan.cleanup.to_sql()).await?;
        Ok(())
    }
}

/// A staging-area name unique to one load of `destination`
pub fn staging_area_name(destination: &TableName) -> LoadResult<TableName> {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    Ok(destination.sibling(&format!("{}{}", STAGING_AREA_MARKER, &suffix[..12]))?)
}

#[cfg(test)]
#[path = "incremental_test.rs"]
mod tests;
