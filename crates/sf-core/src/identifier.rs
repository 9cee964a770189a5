//! Validated warehouse identifiers.
//!
//! Table and column names arrive from `starflow.yml` and end up inside
//! generated SQL, so they are checked once at the edge and carried as
//! newtypes afterwards.

use crate::error::{CoreError, CoreResult};
use crate::sql_utils::{quote_ident, quote_qualified, split_qualified_name};
use regex::Regex;
use std::sync::OnceLock;

static QUALIFIED_RE: OnceLock<Regex> = OnceLock::new();
static SIMPLE_RE: OnceLock<Regex> = OnceLock::new();

fn qualified_pattern() -> &'static Regex {
    QUALIFIED_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("valid regex")
    })
}

fn simple_pattern() -> &'static Regex {
    SIMPLE_RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}

/// Define a string newtype whose contents must match a pattern.
///
/// Generates `parse()`, `as_str()`, `Display`, `AsRef<str>`, `Deref<Target=str>`,
/// `TryFrom<String>`, `Serialize` and a validating `Deserialize`.
macro_rules! define_identifier {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident => $kind:literal, $pattern:path;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl $Name {
            /// Validate and wrap an identifier.
            pub fn parse(value: impl Into<String>) -> CoreResult<Self> {
                let value = value.into();
                if $pattern().is_match(&value) {
                    Ok(Self(value))
                } else {
                    Err(CoreError::InvalidIdentifier { kind: $kind, value })
                }
            }

            /// Return the identifier as written in the config.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $Name::parse(s).map_err(serde::de::Error::custom)
            }
        }

        impl TryFrom<String> for $Name {
            type Error = CoreError;
            fn try_from(s: String) -> CoreResult<Self> {
                Self::parse(s)
            }
        }

        impl TryFrom<&str> for $Name {
            type Error = CoreError;
            fn try_from(s: &str) -> CoreResult<Self> {
                Self::parse(s)
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $Name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_identifier! {
    /// A possibly schema-qualified table name (`songs` or `public.songs`).
    pub struct TableName => "table", qualified_pattern;
}

define_identifier! {
    /// A single column name.
    pub struct ColumnName => "column", simple_pattern;
}

impl TableName {
    /// Schema part, defaulting to `main` for unqualified names.
    pub fn schema(&self) -> &str {
        split_qualified_name(&self.0).0
    }

    /// Unqualified table part.
    pub fn table(&self) -> &str {
        split_qualified_name(&self.0).1
    }

    /// The name quoted for use in SQL.
    pub fn quoted(&self) -> String {
        quote_qualified(&self.0)
    }

    /// Lowercased `schema.table`, equal for every spelling the warehouse
    /// resolves to the same table.
    pub fn canonical(&self) -> String {
        format!(
            "{}.{}",
            self.schema().to_lowercase(),
            self.table().to_lowercase()
        )
    }

    /// A sibling table in the same schema whose name is this table's name
    /// followed by `suffix`.
    ///
    /// Unqualified names stay unqualified so the sibling lands wherever the
    /// original would resolve.
    pub fn sibling(&self, suffix: &str) -> CoreResult<TableName> {
        let name = match self.0.rfind('.') {
            Some(pos) => format!("{}.{}{}", &self.0[..pos], &self.0[pos + 1..], suffix),
            None => format!("{}{}", self.0, suffix),
        };
        TableName::parse(name)
    }
}

impl ColumnName {
    /// The name quoted for use in SQL.
    pub fn quoted(&self) -> String {
        quote_ident(&self.0)
    }
}
