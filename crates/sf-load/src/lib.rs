//! sf-load - Load engine for Starflow
//!
//! This crate moves rows into the warehouse:
//! - [`IncrementalLoader`] materializes a transform query into a private
//!   staging area and applies it to a destination under one of the four
//!   insert modes, inside a single transaction
//! - [`StagingLoader`] replaces a staging table with the contents of raw
//!   JSON objects

pub mod credentials;
pub mod error;
pub mod incremental;
pub mod staging;
pub mod statements;

pub use credentials::{CredentialProvider, ObjectStoreCredentials};
pub use error::{LoadError, LoadResult};
pub use incremental::{IncrementalLoader, LoadOperation, LoadSummary};
pub use staging::{ColumnMapping, StageOperation, StageSummary, StagingLoader};
