//! Runtime context for CLI commands

use anyhow::{bail, Context, Result};
use sf_core::{Config, LoadPhase, TransformCatalog};
use sf_db::DuckDbBackend;
use sf_load::{CredentialProvider, LoadOperation, ObjectStoreCredentials, StageOperation};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Loaded project: its root, configuration and transform catalog
pub(crate) struct ProjectContext {
    /// Directory relative paths in the config resolve against
    pub root: PathBuf,

    /// Parsed `starflow.yml`
    pub config: Config,

    /// Built-in transforms overlaid with the config's own
    pub catalog: TransformCatalog,

    /// Target selected on the command line or through `SF_TARGET`
    target: Option<String>,
}

impl ProjectContext {
    /// Load the project named by the global arguments
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&global.project_dir);
        let config = match &global.config {
            Some(path) => {
                Config::load(Path::new(path)).context("Failed to load configuration file")?
            }
            None => Config::load_from_dir(&root).context("Failed to load project configuration")?,
        };
        let catalog = TransformCatalog::with_overrides(&config.transforms);

        Ok(Self {
            root,
            config,
            catalog,
            target: global.target.clone(),
        })
    }

    /// Open the warehouse for the selected target
    pub fn connect(&self) -> Result<Arc<DuckDbBackend>> {
        let db_config = self.config.get_database_config(self.target.as_deref())?;
        let db = if db_config.path == ":memory:" || Path::new(&db_config.path).is_absolute() {
            DuckDbBackend::new(&db_config.path)
        } else {
            DuckDbBackend::from_path(&self.root.join(&db_config.path))
        }
        .context("Failed to connect to database")?;
        log::debug!("Connected to warehouse at {}", db_config.path);
        Ok(Arc::new(db))
    }

    /// Directory run artifacts are written to
    pub fn target_dir(&self) -> PathBuf {
        self.config.target_path_absolute(&self.root)
    }

    /// Resolve stage tasks, optionally restricted to `filter`
    pub fn stage_operations(
        &self,
        filter: Option<&[String]>,
    ) -> Result<Vec<(String, StageOperation)>> {
        let names: Vec<&str> = self.config.stage.iter().map(|t| t.name.as_str()).collect();
        check_filter(filter, &names)?;

        self.config
            .stage
            .iter()
            .filter(|t| selected(filter, &t.name))
            .map(|task| {
                let op = StageOperation::from_task(task, &self.root)
                    .with_context(|| format!("Invalid stage task '{}'", task.name))?;
                Ok((task.name.clone(), op))
            })
            .collect()
    }

    /// Resolve load tasks of `phase` (or every phase), optionally restricted
    /// to `filter`.
    ///
    /// Every operation is resolved before any of them runs, so an unknown
    /// insert mode or transform fails the command up front.
    pub fn load_operations(
        &self,
        phase: Option<LoadPhase>,
        filter: Option<&[String]>,
    ) -> Result<Vec<(String, LoadOperation)>> {
        let names: Vec<&str> = self.config.loads.iter().map(|t| t.name.as_str()).collect();
        check_filter(filter, &names)?;

        self.config
            .loads
            .iter()
            .filter(|t| phase.map_or(true, |p| t.phase == p))
            .filter(|t| selected(filter, &t.name))
            .map(|task| {
                let op = LoadOperation::from_task(task, &self.catalog)
                    .with_context(|| format!("Invalid load task '{}'", task.name))?;
                Ok((task.name.clone(), op))
            })
            .collect()
    }
}

/// Split a comma-separated task list
pub(crate) fn parse_name_list(arg: &Option<String>) -> Option<Vec<String>> {
    arg.as_ref().map(|list| {
        list.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

fn selected(filter: Option<&[String]>, name: &str) -> bool {
    filter.map_or(true, |names| names.iter().any(|n| n == name))
}

fn check_filter(filter: Option<&[String]>, known: &[&str]) -> Result<()> {
    if let Some(names) = filter {
        for name in names {
            if !known.contains(&name.as_str()) {
                bail!(
                    "Unknown task '{}'. Available tasks: {}",
                    name,
                    known.join(", ")
                );
            }
        }
    }
    Ok(())
}

/// Reads object-store keys from the standard AWS environment variables.
///
/// Returns `None` when the key pair is absent so the warehouse falls back to
/// its own credential chain.
pub(crate) struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
    fn object_store_credentials(&self) -> Option<ObjectStoreCredentials> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID").ok()?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY").ok()?;
        Some(ObjectStoreCredentials {
            access_key_id,
            secret_access_key,
            session_token: std::env::var("AWS_SESSION_TOKEN").ok(),
        })
    }
}
