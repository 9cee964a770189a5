//! Raw-to-staging bulk loads.
//!
//! A stage load is always a full replace: the destination is emptied and
//! refilled from every JSON object at the source inside one transaction.
//! Values are taken from each object by JSON path and cast to the
//! destination column's type. Blank strings load as NULL.

use crate::credentials::CredentialProvider;
use crate::error::{LoadError, LoadResult};
use regex::Regex;
use serde::Deserialize;
use sf_core::sql_utils::{quote_ident, string_literal};
use sf_core::{CoreError, StageFormat, StageTask, TableName};
use sf_db::{Database, DbError};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// How JSON values are mapped onto destination columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMapping {
    /// Each column reads the top-level key with the same name
    ByName,
    /// The i-th JSON path feeds the i-th column
    ByPosition(Vec<String>),
}

/// One stage load
#[derive(Debug, Clone)]
pub struct StageOperation {
    /// Local path, glob, or object-store URL
    pub source_location: String,

    /// Staging table to replace
    pub destination: TableName,

    /// JSON-to-column mapping
    pub mapping: ColumnMapping,

    /// Object-store region
    pub region: Option<String>,
}

impl StageOperation {
    /// Build a stage operation from a configured task.
    ///
    /// `root` resolves a relative JSONPaths file and a relative local source.
    pub fn from_task(task: &StageTask, root: &Path) -> LoadResult<Self> {
        let mapping = match task.format {
            StageFormat::Auto => ColumnMapping::ByName,
            StageFormat::ExplicitSchema => {
                let path = task.schema_file_absolute(root).ok_or_else(|| {
                    CoreError::InvalidStageFormat {
                        table: task.destination_table.to_string(),
                        reason: "explicit_schema requires schema_file".to_string(),
                    }
                })?;
                ColumnMapping::ByPosition(read_jsonpaths(&path)?)
            }
        };

        let source_location = if is_remote(&task.source_location)
            || Path::new(&task.source_location).is_absolute()
        {
            task.source_location.clone()
        } else {
            root.join(&task.source_location).display().to_string()
        };

        Ok(Self {
            source_location,
            destination: task.destination_table.clone(),
            mapping,
            region: task.region.clone(),
        })
    }
}

/// What a successful stage load did
#[derive(Debug, Clone)]
pub struct StageSummary {
    /// Staging table
    pub destination: TableName,

    /// Rows in the table after the load
    pub rows_loaded: usize,

    /// Wall-clock time of the whole operation
    pub duration: Duration,
}

#[derive(Deserialize)]
struct JsonPathsFile {
    jsonpaths: Vec<String>,
}

/// Read a JSONPaths file: `{"jsonpaths": ["$['artist']", ...]}`
pub fn read_jsonpaths(path: &Path) -> LoadResult<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;
    let parsed: JsonPathsFile = serde_json::from_str(&content).map_err(CoreError::from)?;
    if parsed.jsonpaths.is_empty() {
        return Err(CoreError::InvalidStageFormat {
            table: path.display().to_string(),
            reason: "jsonpaths is empty".to_string(),
        }
        .into());
    }
    Ok(parsed.jsonpaths)
}

static BRACKET_RE: OnceLock<Regex> = OnceLock::new();

fn bracket_pattern() -> &'static Regex {
    BRACKET_RE.get_or_init(|| {
        Regex::new(r#"\[\s*(?:'([^']*)'|"([^"]*)")\s*\]"#).expect("valid regex")
    })
}

/// Rewrite bracket member access (`$['a']`, `$["a"]`) as `$."a"`.
///
/// Array indexes and dot notation pass through unchanged.
pub fn normalize_json_path(path: &str) -> String {
    bracket_pattern()
        .replace_all(path.trim(), |caps: &regex::Captures<'_>| {
            let key = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            format!(".{}", json_path_key(key))
        })
        .into_owned()
}

fn json_path_key(key: &str) -> String {
    format!("\"{}\"", key.replace('"', "\\\""))
}

/// Whether the location is read through an object store
pub fn is_remote(location: &str) -> bool {
    ["s3://", "s3a://", "gs://", "gcs://", "http://", "https://"]
        .iter()
        .any(|scheme| location.starts_with(scheme))
}

/// DuckDB secret type for an object-store location.
///
/// `None` for local paths and plain HTTP(S), which are read without a secret.
pub fn secret_type(location: &str) -> Option<&'static str> {
    if location.starts_with("s3://") || location.starts_with("s3a://") {
        Some("S3")
    } else if location.starts_with("gs://") || location.starts_with("gcs://") {
        Some("GCS")
    } else {
        None
    }
}

/// Expand a directory or object prefix into a recursive JSON glob
pub fn source_pattern(location: &str) -> String {
    let looks_like_file = [".json", ".jsonl", ".ndjson", ".gz"]
        .iter()
        .any(|ext| location.ends_with(ext));
    if location.contains('*') || looks_like_file {
        return location.to_string();
    }

    if is_remote(location) || Path::new(location).is_dir() {
        format!("{}/**/*.json", location.trim_end_matches('/'))
    } else {
        location.to_string()
    }
}

/// `CAST(<blank-as-null value> AS <type>)` for one column
fn column_expression(json_path: &str, data_type: &str) -> String {
    let value = format!("json_extract_string(json, {})", string_literal(json_path));
    format!("CAST(CASE WHEN trim({value}) = '' THEN NULL ELSE {value} END AS {data_type})")
}

/// Build the bulk insert for `operation` given the destination schema
pub fn build_stage_insert(
    operation: &StageOperation,
    schema: &[(String, String)],
) -> LoadResult<String> {
    let paths: Vec<String> = match &operation.mapping {
        ColumnMapping::ByName => schema
            .iter()
            .map(|(name, _)| format!("$.{}", json_path_key(name)))
            .collect(),
        ColumnMapping::ByPosition(paths) => {
            if paths.len() != schema.len() {
                return Err(LoadError::Shape {
                    table: operation.destination.to_string(),
                    reason: format!(
                        "{} JSON paths for {} columns",
                        paths.len(),
                        schema.len()
                    ),
                });
            }
            paths.iter().map(|p| normalize_json_path(p)).collect()
        }
    };

    let columns: Vec<String> = schema.iter().map(|(name, _)| quote_ident(name)).collect();
    let expressions: Vec<String> = paths
        .iter()
        .zip(schema)
        .map(|(path, (_, data_type))| column_expression(path, data_type))
        .collect();

    Ok(format!(
        "INSERT INTO {} ({})\nSELECT {}\nFROM read_json_objects({}, format = 'auto')",
        operation.destination.quoted(),
        columns.join(", "),
        expressions.join(",\n       "),
        string_literal(&source_pattern(&operation.source_location))
    ))
}

/// Replaces staging tables with raw JSON objects
pub struct StagingLoader {
    db: Arc<dyn Database>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl StagingLoader {
    /// Create a loader without object-store credentials
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            credentials: None,
        }
    }

    /// Use `provider` for object-store sources
    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Truncate the destination and bulk-load every object at the source
    pub async fn stage(&self, operation: &StageOperation) -> LoadResult<StageSummary> {
        let start = Instant::now();
        let destination = &operation.destination;

        let schema = self.db.get_table_schema(destination.as_str()).await?;
        let insert = build_stage_insert(operation, &schema)?;

        if let Some(secret_type) = secret_type(&operation.source_location) {
            self.register_object_store(operation, secret_type).await?;
        }

        log::info!("Truncating staging table {}", destination);
        log::info!(
            "Loading {} into {}",
            operation.source_location,
            destination
        );
        self.db
            .execute_transaction(&[format!("DELETE FROM {}", destination.quoted()), insert])
            .await?;

        let rows_loaded = self
            .db
            .query_count(&format!("SELECT * FROM {}", destination.quoted()))
            .await?;
        log::debug!("{} now holds {} rows", destination, rows_loaded);

        Ok(StageSummary {
            destination: destination.clone(),
            rows_loaded,
            duration: start.elapsed(),
        })
    }

    /// Register a secret of `secret_type` scoped to the source location.
    ///
    /// Errors are replaced with a message that cannot echo the secret.
    async fn register_object_store(
        &self,
        operation: &StageOperation,
        secret_type: &str,
    ) -> LoadResult<()> {
        let secret_name = format!(
            "sf_stage_{}",
            operation.destination.as_str().replace('.', "_")
        );
        let is_s3 = secret_type == "S3";
        let mut options = vec![format!("TYPE {}", secret_type)];
        match self
            .credentials
            .as_ref()
            .and_then(|p| p.object_store_credentials())
        {
            Some(creds) => {
                options.push(format!("KEY_ID {}", string_literal(&creds.access_key_id)));
                options.push(format!("SECRET {}", string_literal(&creds.secret_access_key)));
                // GCS HMAC keys carry no session token
                if let Some(token) = creds.session_token.as_ref().filter(|_| is_s3) {
                    options.push(format!("SESSION_TOKEN {}", string_literal(token)));
                }
            }
            None => options.push("PROVIDER CREDENTIAL_CHAIN".to_string()),
        }
        if let Some(region) = operation.region.as_ref().filter(|_| is_s3) {
            options.push(format!("REGION {}", string_literal(region)));
        }
        options.push(format!(
            "SCOPE {}",
            string_literal(&operation.source_location)
        ));

        log::debug!(
            "Registering object-store secret {} for {}",
            secret_name,
            operation.source_location
        );
        let sql = format!(
            "CREATE OR REPLACE SECRET {} ({})",
            secret_name,
            options.join(", ")
        );
        self.db.execute(&sql).await.map_err(|_| {
            LoadError::Storage(DbError::ExecutionError(format!(
                "failed to register object-store credentials for {}",
                operation.source_location
            )))
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "staging_test.rs"]
mod tests;
