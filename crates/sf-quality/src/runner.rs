//! Check execution

use crate::definition::{CheckKind, Severity};
use crate::error::{QualityError, QualityResult};
use crate::generator::GeneratedCheck;
use sf_core::CheckGroup;
use sf_db::Database;
use std::time::{Duration, Instant};

/// How a completed check ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
}

/// Result of one check that did not abort the run
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Canonical check kind
    pub kind: CheckKind,

    /// `table` or `table.column`
    pub target: String,

    /// Pass condition, rendered
    pub expected: String,

    /// Value the query returned
    pub actual: Option<i64>,

    /// Pass or warn
    pub status: CheckStatus,

    /// Execution time
    pub duration: Duration,
}

/// Every outcome of a successful quality run
#[derive(Debug, Clone, Default)]
pub struct QualityReport {
    /// Outcomes in execution order
    pub outcomes: Vec<CheckOutcome>,

    /// Total execution time
    pub duration: Duration,
}

impl QualityReport {
    /// Checks that passed
    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == CheckStatus::Pass)
            .count()
    }

    /// Checks that produced a warning
    pub fn warnings(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == CheckStatus::Warn)
    }
}

fn render_actual(value: Option<i64>) -> String {
    value.map_or_else(|| "NULL".to_string(), |v| v.to_string())
}

/// Runs quality checks in declaration order, fail-fast
pub struct CheckRunner<'a> {
    db: &'a dyn Database,
}

impl<'a> CheckRunner<'a> {
    /// Create a new check runner
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Run one bound check.
    ///
    /// A warn-severity mismatch is logged and returned as an outcome; a
    /// fail-severity mismatch is an error.
    pub async fn run_check(&self, check: &GeneratedCheck) -> QualityResult<CheckOutcome> {
        let start = Instant::now();
        let definition = &check.definition;
        let target = check.target();

        log::info!("Running {} on {}", definition.kind, target);
        let actual = self.db.query_scalar(&check.sql).await?;
        let duration = start.elapsed();

        if definition.pass.passes(actual) {
            log::info!(
                "{} on {} passed with {}",
                definition.kind,
                target,
                render_actual(actual)
            );
            return Ok(CheckOutcome {
                kind: definition.kind,
                target,
                expected: definition.pass.to_string(),
                actual,
                status: CheckStatus::Pass,
                duration,
            });
        }

        match definition.severity {
            Severity::Warn => {
                log::warn!(
                    "{} on {}: expected {}, got {}",
                    definition.kind,
                    target,
                    definition.pass,
                    render_actual(actual)
                );
                Ok(CheckOutcome {
                    kind: definition.kind,
                    target,
                    expected: definition.pass.to_string(),
                    actual,
                    status: CheckStatus::Warn,
                    duration,
                })
            }
            Severity::Fail => Err(QualityError::Failure {
                check: definition.kind.name().to_string(),
                table: check.table.to_string(),
                target,
                expected: definition.pass.to_string(),
                actual: render_actual(actual),
            }),
        }
    }

    /// Run every group in order.
    ///
    /// Stops at the first unknown kind, unfit target, storage error or hard
    /// failure; nothing after it executes.
    pub async fn run_checks(&self, groups: &[CheckGroup]) -> QualityResult<QualityReport> {
        let start = Instant::now();
        let mut outcomes = Vec::new();

        for group in groups {
            let kind: CheckKind = group.kind.parse()?;
            let definition = kind.definition();
            log::info!("Beginning {}", kind);

            for target in &group.targets {
                let check = GeneratedCheck::new(&definition, target)?;
                outcomes.push(self.run_check(&check).await?);
            }
        }

        Ok(QualityReport {
            outcomes,
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
