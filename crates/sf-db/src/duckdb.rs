//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, Row};
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::Connection;
use sf_core::sql_utils::split_qualified_name;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self::from_connection(conn))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open a second connection to the same database.
    ///
    /// Each concurrent load gets its own connection so its transaction does
    /// not share a session with any other load.
    pub fn try_clone(&self) -> DbResult<Self> {
        let conn = self.lock()?;
        let cloned = conn
            .try_clone()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(cloned))
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    /// Run statements inside a single DuckDB transaction.
    ///
    /// The transaction rolls back when dropped without commit, so any early
    /// return leaves the database untouched.
    fn execute_transaction_sync(&self, statements: &[String]) -> DbResult<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        let total = statements.len();
        for (index, sql) in statements.iter().enumerate() {
            if let Err(e) = tx.execute(sql, []) {
                log::debug!("Rolling back after statement {}/{} failed", index + 1, total);
                return Err(DbError::TransactionError(format!(
                    "statement {}/{} failed, rolled back: {}: {}",
                    index + 1,
                    total,
                    e,
                    sql
                )));
            }
        }

        tx.commit()
            .map_err(|e| DbError::TransactionError(format!("COMMIT failed: {e}")))
    }

    /// Fetch every row synchronously
    fn query_rows_sync(&self, sql: &str) -> DbResult<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let width = row.as_ref().column_count();
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                let value: Value = row.get(idx)?;
                values.push(render_value(value));
            }
            out.push(values);
        }
        Ok(out)
    }

    /// Fetch a single integer synchronously
    fn query_scalar_sync(&self, sql: &str) -> DbResult<Option<i64>> {
        let conn = self.lock()?;
        match conn.query_row(sql, [], |row| row.get::<_, Option<i64>>(0)) {
            Ok(value) => Ok(value),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::ExecutionError(format!("{}: {}", e, sql))),
        }
    }

    /// Query count synchronously
    fn query_count_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count as usize)
    }

    /// List table columns synchronously
    fn get_table_schema_sync(&self, name: &str) -> DbResult<Vec<(String, String)>> {
        let conn = self.lock()?;
        let (schema, table) = split_qualified_name(name);
        let mut stmt = conn.prepare(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
        )?;
        let columns = stmt
            .query_map(duckdb::params![schema, table], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            return Err(DbError::TableNotFound(name.to_string()));
        }
        Ok(columns)
    }
}

/// Render a DuckDB value as text, `None` for NULL
fn render_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Boolean(b) => Some(b.to_string()),
        Value::TinyInt(n) => Some(n.to_string()),
        Value::SmallInt(n) => Some(n.to_string()),
        Value::Int(n) => Some(n.to_string()),
        Value::BigInt(n) => Some(n.to_string()),
        Value::HugeInt(n) => Some(n.to_string()),
        Value::UTinyInt(n) => Some(n.to_string()),
        Value::USmallInt(n) => Some(n.to_string()),
        Value::UInt(n) => Some(n.to_string()),
        Value::UBigInt(n) => Some(n.to_string()),
        Value::Float(n) => Some(n.to_string()),
        Value::Double(n) => Some(n.to_string()),
        Value::Text(s) => Some(s),
        other => Some(format!("{:?}", other)),
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn execute_transaction(&self, statements: &[String]) -> DbResult<()> {
        self.execute_transaction_sync(statements)
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>> {
        self.query_rows_sync(sql)
    }

    async fn query_scalar(&self, sql: &str) -> DbResult<Option<i64>> {
        self.query_scalar_sync(sql)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.query_count_sync(sql)
    }

    async fn get_table_schema(&self, name: &str) -> DbResult<Vec<(String, String)>> {
        self.get_table_schema_sync(name)
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
