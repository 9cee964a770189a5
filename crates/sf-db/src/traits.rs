//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// One result row with every value rendered as text (`None` for NULL)
pub type Row = Vec<Option<String>>;

/// Query executor boundary for Starflow
///
/// Every statement is generated by Starflow itself from validated
/// identifiers. Implementations must be Send + Sync so loads for different
/// destinations can run concurrently.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a statement that returns no rows, returning affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute several `;`-separated statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute statements as one transaction: all commit or none do
    async fn execute_transaction(&self, statements: &[String]) -> DbResult<()>;

    /// Execute a query and return every row
    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>>;

    /// Execute a query and return the first column of the first row as an integer.
    ///
    /// Returns `None` when the value is NULL or the query produced no rows.
    async fn query_scalar(&self, sql: &str) -> DbResult<Option<i64>>;

    /// Count the rows a query produces
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Column names and declared types of a table in ordinal order
    async fn get_table_schema(&self, name: &str) -> DbResult<Vec<(String, String)>>;
}
