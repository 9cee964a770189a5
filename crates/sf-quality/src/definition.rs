//! Check kinds and their definitions

use sf_core::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;

/// A known quality check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    /// The table has at least one row
    RowCountNonzero,
    /// The newest value of a timestamp column is recent
    Freshness,
    /// A column has no NULL values
    NullColumns,
}

/// What a check is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckScope {
    Table,
    Column,
}

impl fmt::Display for CheckScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckScope::Table => write!(f, "table"),
            CheckScope::Column => write!(f, "column"),
        }
    }
}

/// What happens when a check does not pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Abort the run
    Fail,
    /// Log and continue
    Warn,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fail => write!(f, "fail"),
            Severity::Warn => write!(f, "warn"),
        }
    }
}

/// Predicate over the scalar a check query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassCondition {
    /// The value equals this
    Equals(i64),
    /// The value is at most this
    AtMost(i64),
}

impl PassCondition {
    /// Whether `value` passes. NULL never passes.
    pub fn passes(&self, value: Option<i64>) -> bool {
        match (self, value) {
            (_, None) => false,
            (PassCondition::Equals(expected), Some(v)) => v == *expected,
            (PassCondition::AtMost(limit), Some(v)) => v <= *limit,
        }
    }
}

impl fmt::Display for PassCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassCondition::Equals(v) => write!(f, "{}", v),
            PassCondition::AtMost(v) => write!(f, "<= {}", v),
        }
    }
}

/// Everything needed to run and judge one check kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckDefinition {
    pub kind: CheckKind,
    pub scope: CheckScope,
    pub pass: PassCondition,
    pub severity: Severity,
}

impl CheckKind {
    /// Every kind, in documentation order
    pub const ALL: [CheckKind; 3] = [
        CheckKind::RowCountNonzero,
        CheckKind::Freshness,
        CheckKind::NullColumns,
    ];

    /// Canonical name used in logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::RowCountNonzero => "row_count_nonzero",
            CheckKind::Freshness => "freshness",
            CheckKind::NullColumns => "null_columns_check",
        }
    }

    /// The kind's definition.
    ///
    /// Freshness is always warn-only: stale data is reported, never fatal.
    pub fn definition(&self) -> CheckDefinition {
        let (scope, pass, severity) = match self {
            CheckKind::RowCountNonzero => {
                (CheckScope::Table, PassCondition::Equals(1), Severity::Fail)
            }
            CheckKind::Freshness => (CheckScope::Column, PassCondition::AtMost(1), Severity::Warn),
            CheckKind::NullColumns => {
                (CheckScope::Column, PassCondition::Equals(0), Severity::Fail)
            }
        };
        CheckDefinition {
            kind: *self,
            scope,
            pass,
            severity,
        }
    }
}

impl FromStr for CheckKind {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "row_count_nonzero" | "empty_table_check" => Ok(CheckKind::RowCountNonzero),
            "freshness" | "freshness_check" => Ok(CheckKind::Freshness),
            "null_columns_check" | "null_columns" => Ok(CheckKind::NullColumns),
            other => Err(CoreError::UnknownCheckKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_same_kind() {
        assert_eq!(
            "empty_table_check".parse::<CheckKind>().unwrap(),
            CheckKind::RowCountNonzero
        );
        assert_eq!(
            "freshness_check".parse::<CheckKind>().unwrap(),
            CheckKind::Freshness
        );
        for kind in CheckKind::ALL {
            assert_eq!(kind.name().parse::<CheckKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind() {
        let err = "uniqueness_check".parse::<CheckKind>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownCheckKind { .. }));
        assert!(err.to_string().contains("uniqueness_check"));
    }

    #[test]
    fn test_definitions() {
        let rows = CheckKind::RowCountNonzero.definition();
        assert_eq!(rows.scope, CheckScope::Table);
        assert_eq!(rows.severity, Severity::Fail);

        let fresh = CheckKind::Freshness.definition();
        assert_eq!(fresh.scope, CheckScope::Column);
        assert_eq!(fresh.severity, Severity::Warn);
    }

    #[test]
    fn test_pass_conditions() {
        assert!(PassCondition::Equals(1).passes(Some(1)));
        assert!(!PassCondition::Equals(1).passes(Some(0)));
        assert!(PassCondition::AtMost(1).passes(Some(0)));
        assert!(PassCondition::AtMost(1).passes(Some(1)));
        assert!(!PassCondition::AtMost(1).passes(Some(2)));
        assert!(!PassCondition::AtMost(1).passes(None));
        assert_eq!(PassCondition::AtMost(1).to_string(), "<= 1");
    }
}
