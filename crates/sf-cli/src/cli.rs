//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use sf_core::LoadPhase;

/// Starflow - stage raw event data and load it into a star schema
#[derive(Parser, Debug)]
#[command(name = "sf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Target whose database settings override the defaults
    #[arg(short, long, global = true, env = "SF_TARGET")]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the staging and star-schema tables
    Setup(SetupArgs),

    /// Replace staging tables with raw JSON data
    Stage(StageArgs),

    /// Load destination tables from their transforms
    Load(LoadArgs),

    /// Run the configured quality checks
    Check(CheckArgs),

    /// Run the whole workflow: stage, facts, dimensions, checks
    Run(RunArgs),

    /// List configured tasks
    Ls(LsArgs),
}

/// Arguments for the setup command
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Print the DDL instead of executing it
    #[arg(long)]
    pub print: bool,
}

/// Arguments for the stage command
#[derive(Args, Debug)]
pub struct StageArgs {
    /// Stage task names to run (comma-separated, default: all)
    #[arg(long)]
    pub tasks: Option<String>,
}

/// Arguments for the load command
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Load task names to run (comma-separated, default: all)
    #[arg(long)]
    pub tasks: Option<String>,

    /// Only run loads of this phase
    #[arg(long, value_enum)]
    pub phase: Option<PhaseArg>,
}

/// Load phase selector
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseArg {
    /// Fact loads
    Fact,
    /// Dimension loads
    Dimension,
}

impl From<PhaseArg> for LoadPhase {
    fn from(phase: PhaseArg) -> Self {
        match phase {
            PhaseArg::Fact => LoadPhase::Fact,
            PhaseArg::Dimension => LoadPhase::Dimension,
        }
    }
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Check kinds to run (comma-separated, default: all)
    #[arg(long)]
    pub kinds: Option<String>,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override retry.retries from the config
    #[arg(long)]
    pub retries: Option<u32>,

    /// Override retry.delay_secs from the config
    #[arg(long)]
    pub retry_delay: Option<u64>,

    /// Number of tasks to run concurrently within a phase
    #[arg(long, default_value = "4")]
    pub threads: usize,

    /// Stop after the loads, without running quality checks
    #[arg(long)]
    pub skip_checks: bool,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: LsOutput,
}

/// List output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
