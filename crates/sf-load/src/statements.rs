//! Statement builders for incremental loads.
//!
//! Every statement is rendered from validated [`TableName`] / [`ColumnName`]
//! values, so identifiers are always quoted and never interpolated raw.
//! The transform query text is the only free-form SQL that reaches the
//! warehouse, and it comes from the transform catalog.

use sf_core::{ColumnName, InsertMode, TableName};
use std::fmt;

/// Prefix of every staging-area table name, after the destination name
pub const STAGING_AREA_MARKER: &str = "__sf_stage_";

/// One statement of an incremental load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatement {
    /// Empty copy of the destination's columns and types
    CreateStagingArea {
        staging: TableName,
        destination: TableName,
    },

    /// Materialize the transform query into the staging area
    PopulateStagingArea { staging: TableName, query: String },

    /// Remove every destination row
    DeleteAll { destination: TableName },

    /// Remove destination rows whose key appears in the staging area
    DeleteMatchingKeys {
        destination: TableName,
        staging: TableName,
        key: ColumnName,
    },

    /// Copy every staged row
    InsertAll {
        destination: TableName,
        staging: TableName,
    },

    /// Copy one staged row per key
    InsertDistinctKeys {
        destination: TableName,
        staging: TableName,
        key: ColumnName,
    },

    /// Copy one staged row per key, only for keys absent from the destination
    InsertAbsentKeys {
        destination: TableName,
        staging: TableName,
        key: ColumnName,
    },

    /// Remove the staging area
    DropStagingArea { staging: TableName },
}

impl LoadStatement {
    /// Render as DuckDB SQL
    pub fn to_sql(&self) -> String {
        match self {
            LoadStatement::CreateStagingArea {
                staging,
                destination,
            } => format!(
                "CREATE TABLE {} AS SELECT * FROM {} LIMIT 0",
                staging.quoted(),
                destination.quoted()
            ),
            LoadStatement::PopulateStagingArea { staging, query } => {
                format!("INSERT INTO {}\n{}", staging.quoted(), query.trim_end_matches(';'))
            }
            LoadStatement::DeleteAll { destination } => {
                format!("DELETE FROM {}", destination.quoted())
            }
            LoadStatement::DeleteMatchingKeys {
                destination,
                staging,
                key,
            } => format!(
                "DELETE FROM {dest} AS cur WHERE EXISTS \
                 (SELECT 1 FROM {stage} AS src WHERE src.{key} IS NOT DISTINCT FROM cur.{key})",
                dest = destination.quoted(),
                stage = staging.quoted(),
                key = key.quoted()
            ),
            LoadStatement::InsertAll {
                destination,
                staging,
            } => format!(
                "INSERT INTO {} SELECT * FROM {}",
                destination.quoted(),
                staging.quoted()
            ),
            LoadStatement::InsertDistinctKeys {
                destination,
                staging,
                key,
            } => format!(
                "INSERT INTO {dest} SELECT DISTINCT ON ({key}) * FROM {stage}",
                dest = destination.quoted(),
                stage = staging.quoted(),
                key = key.quoted()
            ),
            LoadStatement::InsertAbsentKeys {
                destination,
                staging,
                key,
            } => format!(
                "INSERT INTO {dest} SELECT DISTINCT ON (src.{key}) src.* FROM {stage} AS src \
                 WHERE NOT EXISTS (SELECT 1 FROM {dest} AS cur WHERE cur.{key} IS NOT DISTINCT FROM src.{key})",
                dest = destination.quoted(),
                stage = staging.quoted(),
                key = key.quoted()
            ),
            LoadStatement::DropStagingArea { staging } => {
                format!("DROP TABLE IF EXISTS {}", staging.quoted())
            }
        }
    }
}

impl fmt::Display for LoadStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Every statement a single load sends, grouped by step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    /// Staging area owned by this load
    pub staging: TableName,

    /// Create and populate the staging area
    pub materialize: Vec<LoadStatement>,

    /// Statements applied to the destination in one transaction
    pub apply: Vec<LoadStatement>,

    /// Staging-area removal, run on success and failure
    pub cleanup: LoadStatement,
}

impl LoadPlan {
    /// Build the plan for loading `query` into `destination` under `mode`
    pub fn new(
        query: &str,
        destination: &TableName,
        key: &ColumnName,
        mode: InsertMode,
        staging: TableName,
    ) -> Self {
        let materialize = vec![
            LoadStatement::CreateStagingArea {
                staging: staging.clone(),
                destination: destination.clone(),
            },
            LoadStatement::PopulateStagingArea {
                staging: staging.clone(),
                query: query.to_string(),
            },
        ];

        Self {
            apply: apply_statements(mode, destination, &staging, key),
            cleanup: LoadStatement::DropStagingArea {
                staging: staging.clone(),
            },
            materialize,
            staging,
        }
    }

    /// Apply statements rendered as SQL
    pub fn apply_sql(&self) -> Vec<String> {
        self.apply.iter().map(LoadStatement::to_sql).collect()
    }
}

/// Apply step for `mode`, reading from `staging` and writing to `destination`
pub fn apply_statements(
    mode: InsertMode,
    destination: &TableName,
    staging: &TableName,
    key: &ColumnName,
) -> Vec<LoadStatement> {
    let destination = destination.clone();
    let staging = staging.clone();
    let key = key.clone();

    match mode {
        InsertMode::Replace => vec![
            LoadStatement::DeleteAll {
                destination: destination.clone(),
            },
            LoadStatement::InsertAll {
                destination,
                staging,
            },
        ],
        InsertMode::AppendAll => vec![LoadStatement::InsertAll {
            destination,
            staging,
        }],
        InsertMode::AppendNew => vec![LoadStatement::InsertAbsentKeys {
            destination,
            staging,
            key,
        }],
        InsertMode::Merge => vec![
            LoadStatement::DeleteMatchingKeys {
                destination: destination.clone(),
                staging: staging.clone(),
                key: key.clone(),
            },
            LoadStatement::InsertDistinctKeys {
                destination,
                staging,
                key,
            },
        ],
    }
}

#[cfg(test)]
#[path = "statements_test.rs"]
mod tests;
