//! sf-quality - Quality checks for Starflow
//!
//! This crate resolves check kinds to their definitions, binds them to
//! tables and columns, and runs them in declaration order, stopping at the
//! first hard failure.

pub mod definition;
pub mod error;
pub mod generator;
pub mod runner;

pub use definition::{CheckDefinition, CheckKind, CheckScope, PassCondition, Severity};
pub use error::{QualityError, QualityResult};
pub use generator::GeneratedCheck;
pub use runner::{CheckOutcome, CheckRunner, CheckStatus, QualityReport};
