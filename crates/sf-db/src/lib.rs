//! sf-db - Warehouse abstraction layer for Starflow
//!
//! This crate provides the `Database` trait every Starflow component
//! executes SQL through, and its DuckDB implementation.

pub mod duckdb;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Database, Row};
