//! In-process fake warehouse for exercising statement generation.
//!
//! [`RecordingDatabase`] records every statement it receives, serves canned
//! scalar results and can be told to fail any statement containing a
//! pattern. It never interprets SQL.

use crate::error::{DbError, DbResult};
use crate::traits::{Database, Row};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Fake [`Database`] that records statements instead of running them
#[derive(Default)]
pub struct RecordingDatabase {
    statements: Mutex<Vec<String>>,
    committed: Mutex<Vec<Vec<String>>>,
    scalars: Mutex<Vec<(String, Option<i64>)>>,
    columns: Mutex<HashMap<String, Vec<(String, String)>>>,
    fail_patterns: Mutex<Vec<String>>,
}

impl RecordingDatabase {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any scalar query containing `pattern` with `value`
    pub fn with_scalar(self, pattern: &str, value: Option<i64>) -> Self {
        self.scalars
            .lock()
            .expect("recorder mutex")
            .push((pattern.to_string(), value));
        self
    }

    /// Report `columns` as `(name, type)` pairs for `table`
    pub fn with_columns(self, table: &str, columns: &[(&str, &str)]) -> Self {
        self.columns.lock().expect("recorder mutex").insert(
            table.to_string(),
            columns
                .iter()
                .map(|(name, ty)| (name.to_string(), ty.to_string()))
                .collect(),
        );
        self
    }

    /// Fail every statement containing `pattern`
    pub fn fail_when(self, pattern: &str) -> Self {
        self.fail_patterns
            .lock()
            .expect("recorder mutex")
            .push(pattern.to_string());
        self
    }

    /// Every statement received, in order, including failed ones
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().expect("recorder mutex").clone()
    }

    /// Statements of transactions that committed
    pub fn committed_transactions(&self) -> Vec<Vec<String>> {
        self.committed.lock().expect("recorder mutex").clone()
    }

    /// Whether any received statement contains `pattern`
    pub fn saw(&self, pattern: &str) -> bool {
        self.statements().iter().any(|s| s.contains(pattern))
    }

    fn record(&self, sql: &str) -> DbResult<()> {
        self.statements
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?
            .push(sql.to_string());

        let fail_patterns = self
            .fail_patterns
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        if fail_patterns.iter().any(|p| sql.contains(p.as_str())) {
            return Err(DbError::ExecutionError(format!("injected failure: {sql}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Database for RecordingDatabase {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.record(sql)?;
        Ok(0)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.record(sql)
    }

    async fn execute_transaction(&self, statements: &[String]) -> DbResult<()> {
        for (index, sql) in statements.iter().enumerate() {
            self.record(sql).map_err(|e| {
                DbError::TransactionError(format!(
                    "statement {}/{} failed, rolled back: {e}",
                    index + 1,
                    statements.len()
                ))
            })?;
        }
        self.committed
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?
            .push(statements.to_vec());
        Ok(())
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>> {
        self.record(sql)?;
        Ok(Vec::new())
    }

    async fn query_scalar(&self, sql: &str) -> DbResult<Option<i64>> {
        self.record(sql)?;
        let scalars = self
            .scalars
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        scalars
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, value)| *value)
            .ok_or_else(|| DbError::ExecutionError(format!("no canned scalar for: {sql}")))
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.record(sql)?;
        Ok(0)
    }

    async fn get_table_schema(&self, name: &str) -> DbResult<Vec<(String, String)>> {
        self.columns
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }
}
