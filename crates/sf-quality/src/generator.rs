//! Check SQL generation
//!
//! Every query returns a single BIGINT (or NULL) that the runner compares
//! against the kind's pass condition.

use crate::definition::{CheckDefinition, CheckKind};
use sf_core::{CheckTarget, ColumnName, CoreError, CoreResult, TableName};

/// A check bound to one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCheck {
    /// Definition of the check kind
    pub definition: CheckDefinition,

    /// Table under test
    pub table: TableName,

    /// Column under test, for column-scoped kinds
    pub column: Option<ColumnName>,

    /// Scalar query
    pub sql: String,
}

impl GeneratedCheck {
    /// Bind `definition` to `target`.
    ///
    /// Fails when the target's scope does not fit the kind.
    pub fn new(definition: &CheckDefinition, target: &CheckTarget) -> CoreResult<Self> {
        let table = target.table();
        let sql = match (definition.kind, target.column()) {
            (CheckKind::RowCountNonzero, None) => generate_row_count_nonzero_check(table),
            (CheckKind::Freshness, Some(column)) => generate_freshness_check(table, column),
            (CheckKind::NullColumns, Some(column)) => generate_null_columns_check(table, column),
            (kind, _) => {
                return Err(CoreError::InvalidCheckTarget {
                    kind: kind.name().to_string(),
                    reason: format!("'{}' is not a {} target", target, definition.scope),
                })
            }
        };

        Ok(Self {
            definition: *definition,
            table: target.table().clone(),
            column: target.column().cloned(),
            sql,
        })
    }

    /// `table` or `table.column`
    pub fn target(&self) -> String {
        match &self.column {
            Some(column) => format!("{}.{}", self.table, column),
            None => self.table.to_string(),
        }
    }
}

/// Generate SQL for row_count_nonzero: 1 when the table has rows, else 0
pub fn generate_row_count_nonzero_check(table: &TableName) -> String {
    format!(
        "SELECT CAST(CASE WHEN COUNT(*) > 0 THEN 1 ELSE 0 END AS BIGINT) FROM {}",
        table.quoted()
    )
}

/// Generate SQL for freshness: days between the newest value and today.
///
/// NULL when the column has no values.
pub fn generate_freshness_check(table: &TableName, column: &ColumnName) -> String {
    format!(
        "SELECT CAST(date_diff('day', CAST(MAX({}) AS DATE), current_date) AS BIGINT) FROM {}",
        column.quoted(),
        table.quoted()
    )
}

/// Generate SQL for null_columns_check: 1 when any value is NULL, else 0
pub fn generate_null_columns_check(table: &TableName, column: &ColumnName) -> String {
    format!(
        "SELECT CAST(CASE WHEN EXISTS (SELECT 1 FROM {} WHERE {} IS NULL) THEN 1 ELSE 0 END AS BIGINT)",
        table.quoted(),
        column.quoted()
    )
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;
