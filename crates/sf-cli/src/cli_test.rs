use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    Cli::command().debug_assert();
}

#[test]
fn test_global_args_after_subcommand() {
    let cli = Cli::try_parse_from(["sf", "run", "-p", "project", "--retries", "0"]).unwrap();
    assert_eq!(cli.global.project_dir, "project");
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.retries, Some(0));
            assert_eq!(args.threads, 4);
            assert!(!args.skip_checks);
        }
        other => panic!("expected run, got {other:?}"),
    }
}

#[test]
fn test_load_phase_filter() {
    let cli = Cli::try_parse_from(["sf", "load", "--phase", "dimension"]).unwrap();
    match cli.command {
        Commands::Load(args) => {
            assert_eq!(args.phase.map(LoadPhase::from), Some(LoadPhase::Dimension));
        }
        other => panic!("expected load, got {other:?}"),
    }
}
