//! sf-core - Core library for Starflow
//!
//! This crate provides the pipeline configuration, validated identifiers,
//! insert modes and the transform catalog shared by every Starflow component.

pub mod catalog;
pub mod config;
pub mod error;
pub mod identifier;
pub mod insert_mode;
pub mod sql_utils;

pub use catalog::{TransformCatalog, TransformQuery};
pub use config::{
    CheckGroup, CheckTarget, Config, LoadPhase, LoadTask, QualityConfig, RetryConfig,
    StageFormat, StageTask,
};
pub use error::{CoreError, CoreResult};
pub use identifier::{ColumnName, TableName};
pub use insert_mode::InsertMode;
