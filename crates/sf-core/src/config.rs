//! Configuration types and parsing for starflow.yml

use crate::error::{CoreError, CoreResult};
use crate::identifier::{ColumnName, TableName};
use crate::insert_mode::InsertMode;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pipeline configuration from starflow.yml
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Pipeline name
    pub name: String,

    /// Warehouse connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Named target configurations (e.g., dev, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,

    /// Whole-task retry policy used by the workflow driver
    #[serde(default)]
    pub retry: RetryConfig,

    /// Raw-to-staging bulk loads
    #[serde(default)]
    pub stage: Vec<StageTask>,

    /// Fact and dimension loads
    #[serde(default)]
    pub loads: Vec<LoadTask>,

    /// User-defined transform queries, merged over the built-in catalog
    #[serde(default)]
    pub transforms: HashMap<String, String>,

    /// Post-load quality checks
    #[serde(default)]
    pub quality: QualityConfig,

    /// Output directory for run results
    #[serde(default = "default_target_path")]
    pub target_path: String,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Warehouse connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// DuckDB file path or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Whole-task retry policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Extra attempts after the first failure
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Seconds to wait between attempts
    #[serde(default = "default_retry_delay_secs")]
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            delay_secs: default_retry_delay_secs(),
        }
    }
}

impl RetryConfig {
    /// Delay between attempts
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Total number of attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Input format for a stage task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageFormat {
    /// JSON keys are matched to destination columns by name
    #[default]
    Auto,
    /// A JSONPaths file maps values to destination columns by position
    #[serde(alias = "explicit-schema")]
    ExplicitSchema,
}

impl fmt::Display for StageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFormat::Auto => write!(f, "auto"),
            StageFormat::ExplicitSchema => write!(f, "explicit_schema"),
        }
    }
}

/// A raw-to-staging bulk load
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageTask {
    /// Task name used in logs and run results
    pub name: String,

    /// Location of the raw objects (local path, glob, or s3:// URL)
    pub source_location: String,

    /// Staging table to replace
    pub destination_table: TableName,

    /// How JSON values map to columns
    #[serde(default)]
    pub format: StageFormat,

    /// JSONPaths file, required for `explicit_schema`
    #[serde(default)]
    pub schema_file: Option<String>,

    /// Object-store region
    #[serde(default)]
    pub region: Option<String>,
}

impl StageTask {
    /// Resolve the JSONPaths file against the project root
    pub fn schema_file_absolute(&self, root: &Path) -> Option<PathBuf> {
        self.schema_file.as_ref().map(|p| root.join(p))
    }
}

/// Which phase of the workflow a load belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    /// Runs after staging, sequentially, before any dimension
    Fact,
    /// Runs after all facts, in parallel with other dimensions
    #[default]
    Dimension,
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadPhase::Fact => write!(f, "fact"),
            LoadPhase::Dimension => write!(f, "dimension"),
        }
    }
}

/// An incremental load of one destination table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadTask {
    /// Task name used in logs and run results
    pub name: String,

    /// Workflow phase
    #[serde(default)]
    pub phase: LoadPhase,

    /// Table receiving the rows
    pub destination_table: TableName,

    /// Key column used by `append-new` and `merge`
    pub key_column: ColumnName,

    /// Insert mode as written; parsed when the load operation is built
    pub insert_mode: String,

    /// Transform catalog entry producing the rows
    pub transform: String,
}

impl LoadTask {
    /// Parse the configured insert mode
    pub fn mode(&self) -> CoreResult<InsertMode> {
        self.insert_mode.parse()
    }
}

/// Post-load quality checks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QualityConfig {
    /// Check kinds with their targets, in declaration order
    #[serde(default, deserialize_with = "deserialize_check_groups")]
    pub checks: Vec<CheckGroup>,
}

/// One check kind and every target it applies to
#[derive(Debug, Clone, PartialEq)]
pub struct CheckGroup {
    /// Check kind as written; resolved by the check engine
    pub kind: String,

    /// Tables or columns to check
    pub targets: Vec<CheckTarget>,
}

impl CheckGroup {
    /// Build a group from a kind and its targets
    pub fn new(kind: impl Into<String>, targets: Vec<CheckTarget>) -> Self {
        Self {
            kind: kind.into(),
            targets,
        }
    }
}

/// Target of a quality check
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CheckTarget {
    /// A whole table
    Table(TableName),
    /// A single column of a table
    Column {
        table: TableName,
        #[serde(alias = "column")]
        target_column: ColumnName,
    },
}

impl CheckTarget {
    /// Table under test
    pub fn table(&self) -> &TableName {
        match self {
            CheckTarget::Table(table) => table,
            CheckTarget::Column { table, .. } => table,
        }
    }

    /// Column under test, if column-scoped
    pub fn column(&self) -> Option<&ColumnName> {
        match self {
            CheckTarget::Table(_) => None,
            CheckTarget::Column { target_column, .. } => Some(target_column),
        }
    }
}

impl fmt::Display for CheckTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckTarget::Table(table) => write!(f, "{}", table),
            CheckTarget::Column {
                table,
                target_column,
            } => write!(f, "{}.{}", table, target_column),
        }
    }
}

/// Deserialize the `checks` mapping while keeping declaration order.
///
/// `serde_yaml::Mapping` preserves insertion order, which decides which
/// checks run before a fail-fast stop.
fn deserialize_check_groups<'de, D>(deserializer: D) -> Result<Vec<CheckGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let mapping = serde_yaml::Mapping::deserialize(deserializer)?;
    mapping
        .into_iter()
        .map(|(key, value)| {
            let kind = match key {
                serde_yaml::Value::String(s) => s,
                other => {
                    return Err(D::Error::custom(format!(
                        "check kind must be a string, got {:?}",
                        other
                    )))
                }
            };
            let targets: Vec<CheckTarget> =
                serde_yaml::from_value(value).map_err(|e| D::Error::custom(format!("{kind}: {e}")))?;
            Ok(CheckGroup { kind, targets })
        })
        .collect()
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_target_path() -> String {
    "target".to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    300
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let config: Config =
            serde_yaml::from_str(content).map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for starflow.yml or starflow.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("starflow.yml");
        let yaml_path = dir.join("starflow.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    ///
    /// Insert modes and check kinds are not validated here; they are resolved
    /// when the operation is built.
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Pipeline name cannot be empty".to_string(),
            });
        }

        let mut task_names = HashSet::new();
        let all_names = self
            .stage
            .iter()
            .map(|t| t.name.as_str())
            .chain(self.loads.iter().map(|t| t.name.as_str()));
        for name in all_names {
            if !task_names.insert(name) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Duplicate task name '{}'", name),
                });
            }
        }

        // Stage tasks and loads of a phase run concurrently: one writer per table
        let mut destinations = HashSet::new();
        for task in &self.loads {
            if !destinations.insert(task.destination_table.canonical()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "Table '{}' is the destination of more than one load",
                        task.destination_table
                    ),
                });
            }
        }

        let mut staged = HashSet::new();
        for task in &self.stage {
            if !staged.insert(task.destination_table.canonical()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "Table '{}' is the destination of more than one stage task",
                        task.destination_table
                    ),
                });
            }
        }

        for task in &self.stage {
            if task.format == StageFormat::ExplicitSchema && task.schema_file.is_none() {
                return Err(CoreError::InvalidStageFormat {
                    table: task.destination_table.to_string(),
                    reason: "explicit_schema requires schema_file".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Load tasks of one phase, in declaration order
    pub fn loads_in_phase(&self, phase: LoadPhase) -> impl Iterator<Item = &LoadTask> {
        self.loads.iter().filter(move |t| t.phase == phase)
    }

    /// Get absolute target path relative to a project root
    pub fn target_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.target_path)
    }

    /// Get database configuration, optionally applying target overrides
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => {
                let target_config =
                    self.targets
                        .get(name)
                        .ok_or_else(|| CoreError::ConfigInvalid {
                            message: format!(
                                "Target '{}' not found. Available targets: {}",
                                name,
                                self.targets
                                    .keys()
                                    .map(|k| k.as_str())
                                    .collect::<Vec<_>>()
                                    .join(", ")
                            ),
                        })?;

                Ok(target_config
                    .database
                    .clone()
                    .unwrap_or_else(|| self.database.clone()))
            }
            None => Ok(self.database.clone()),
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
