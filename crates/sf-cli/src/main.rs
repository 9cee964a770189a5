//! Starflow CLI - stage raw data, load a star schema and check its quality

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod context;

use cli::{Cli, Commands};
use commands::{check, load, ls, run, setup, stage};

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

async fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Setup(args) => setup::execute(args, &cli.global).await,
        Commands::Stage(args) => stage::execute(args, &cli.global).await,
        Commands::Load(args) => load::execute(args, &cli.global).await,
        Commands::Check(args) => check::execute(args, &cli.global).await,
        Commands::Run(args) => run::execute(args, &cli.global).await,
        Commands::Ls(args) => ls::execute(args, &cli.global).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match dispatch(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(code) = err.downcast_ref::<commands::common::ExitCode>() {
                return ExitCode::from(code.0);
            }
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
