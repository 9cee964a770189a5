//! Insert modes for the incremental loader

use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Strategy for applying materialized rows to a destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsertMode {
    /// Delete every destination row, then insert the materialized set
    Replace,
    /// Insert every materialized row, duplicates allowed
    AppendAll,
    /// Insert only rows whose key is absent from the destination
    AppendNew,
    /// Replace rows with matching keys, insert the rest
    Merge,
}

impl InsertMode {
    /// All modes, in documentation order
    pub const ALL: [InsertMode; 4] = [
        InsertMode::Replace,
        InsertMode::AppendAll,
        InsertMode::AppendNew,
        InsertMode::Merge,
    ];
}

impl FromStr for InsertMode {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "replace" => Ok(InsertMode::Replace),
            "append-all" | "append_all" | "insert" => Ok(InsertMode::AppendAll),
            "append-new" | "append_new" => Ok(InsertMode::AppendNew),
            "merge" => Ok(InsertMode::Merge),
            other => Err(CoreError::UnknownInsertMode {
                mode: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for InsertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertMode::Replace => write!(f, "replace"),
            InsertMode::AppendAll => write!(f, "append-all"),
            InsertMode::AppendNew => write!(f, "append-new"),
            InsertMode::Merge => write!(f, "merge"),
        }
    }
}
