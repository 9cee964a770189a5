//! End-to-end tests for the `sf` binary against the sample Sparkify project

use sf_core::Config;
use sf_db::{Database, DuckDbBackend};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Path to the compiled sf binary
fn sf_bin() -> String {
    env!("CARGO_BIN_EXE_sf").to_string()
}

/// Run an `sf` CLI command and return (stdout, stderr, exit code).
fn run_sf(args: &[&str]) -> (String, String, Option<i32>) {
    let output = Command::new(sf_bin())
        .args(args)
        .env_remove("SF_TARGET")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute sf with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code(),
    )
}

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sparkify_project")
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Copy the sample project into a fresh directory
fn sample_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    copy_dir(&fixture_dir(), dir.path());
    dir
}

async fn table_counts(project: &Path) -> Vec<(String, usize)> {
    let db = DuckDbBackend::from_path(&project.join("warehouse.duckdb")).unwrap();
    let mut counts = Vec::new();
    for table in ["songplays", "users", "songs", "artists", "\"time\""] {
        let count = db
            .query_count(&format!("SELECT * FROM {}", table))
            .await
            .unwrap();
        counts.push((table.trim_matches('"').to_string(), count));
    }
    counts
}

fn expected_counts() -> Vec<(String, usize)> {
    [
        ("songplays", 4),
        ("users", 2),
        ("songs", 3),
        ("artists", 2),
        ("time", 4),
    ]
    .into_iter()
    .map(|(t, c)| (t.to_string(), c))
    .collect()
}

#[test]
fn test_fixture_config_is_valid() {
    let config = Config::load_from_dir(&fixture_dir()).unwrap();
    assert_eq!(config.name, "sparkify");
    assert_eq!(config.stage.len(), 2);
    assert_eq!(config.loads.len(), 5);
    assert_eq!(config.quality.checks.len(), 3);
}

#[tokio::test]
async fn test_full_run_loads_star_schema() {
    let project = sample_project();
    let dir = project.path().to_str().unwrap();

    let (_, stderr, code) = run_sf(&["-p", dir, "setup"]);
    assert_eq!(code, Some(0), "setup failed: {}", stderr);

    let (stdout, stderr, code) = run_sf(&["-p", dir, "run"]);
    assert_eq!(code, Some(0), "run failed:\n{}\n{}", stdout, stderr);
    assert!(stdout.contains("✓ stage_events"));
    assert!(stdout.contains("✓ load_songplays"));
    assert!(stdout.contains("! freshness on songplays.start_time"));

    assert_eq!(table_counts(project.path()).await, expected_counts());

    let db = DuckDbBackend::from_path(&project.path().join("warehouse.duckdb")).unwrap();
    let matched = db
        .query_count("SELECT * FROM songplays WHERE song_id IS NOT NULL")
        .await
        .unwrap();
    assert_eq!(matched, 3);
    let leftovers = db
        .query_count(
            "SELECT * FROM information_schema.tables WHERE table_name LIKE '%__sf_stage_%'",
        )
        .await
        .unwrap();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_rerun_is_idempotent_for_keyed_modes() {
    let project = sample_project();
    let dir = project.path().to_str().unwrap();

    run_sf(&["-p", dir, "setup"]);
    let (_, _, first) = run_sf(&["-p", dir, "run"]);
    let (_, _, second) = run_sf(&["-p", dir, "run"]);
    assert_eq!(first, Some(0));
    assert_eq!(second, Some(0));

    assert_eq!(table_counts(project.path()).await, expected_counts());
}

#[test]
fn test_run_writes_results_file() {
    let project = sample_project();
    let dir = project.path().to_str().unwrap();

    run_sf(&["-p", dir, "setup"]);
    let (_, stderr, code) = run_sf(&["-p", dir, "run"]);
    assert_eq!(code, Some(0), "run failed: {}", stderr);

    let content = fs::read_to_string(project.path().join("target/run_results.json")).unwrap();
    let results: serde_json::Value = serde_json::from_str(&content).unwrap();

    // 2 stage + 5 loads + the quality run
    assert_eq!(results["success_count"], 8);
    assert_eq!(results["failure_count"], 0);
    assert_eq!(results["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(results["warnings"][0]["check"], "freshness");

    let tasks: Vec<&str> = results["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["task"].as_str().unwrap())
        .collect();
    assert_eq!(&tasks[..3], &["stage_events", "stage_songs", "load_songplays"]);
    assert_eq!(tasks.last(), Some(&"quality"));
}

#[test]
fn test_missing_tables_fail_stage_and_skip_later_phases() {
    let project = sample_project();
    let dir = project.path().to_str().unwrap();

    // No setup: the staging tables do not exist
    let (stdout, _, code) = run_sf(&["-p", dir, "run", "--retries", "0"]);
    assert_eq!(code, Some(4), "{}", stdout);
    assert!(stdout.contains("✗ stage_events"));
    assert!(!stdout.contains("load_songplays ("));

    let content = fs::read_to_string(project.path().join("target/run_results.json")).unwrap();
    let results: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(results["failure_count"], 2);
    assert_eq!(results["skipped_count"], 6);
}

#[test]
fn test_unknown_insert_mode_fails_before_any_work() {
    let project = sample_project();
    let dir = project.path().to_str().unwrap();
    let config_path = project.path().join("starflow.yml");
    let config = fs::read_to_string(&config_path)
        .unwrap()
        .replace("insert_mode: merge", "insert_mode: upsert-typo");
    fs::write(&config_path, config).unwrap();

    let (_, stderr, code) = run_sf(&["-p", dir, "run"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("upsert-typo"), "{}", stderr);
    assert!(!project.path().join("target/run_results.json").exists());
    assert!(!project.path().join("warehouse.duckdb").exists());
}

#[test]
fn test_check_on_empty_tables_exits_with_quality_failure() {
    let project = sample_project();
    let dir = project.path().to_str().unwrap();

    run_sf(&["-p", dir, "setup"]);
    let (stdout, _, code) = run_sf(&["-p", dir, "check", "--kinds", "empty_table_check"]);
    assert_eq!(code, Some(5), "{}", stdout);
    assert!(stdout.contains("row_count_nonzero"));
    assert!(stdout.contains("songplays"));
}

#[test]
fn test_stage_and_load_commands() {
    let project = sample_project();
    let dir = project.path().to_str().unwrap();

    run_sf(&["-p", dir, "setup"]);
    let (stdout, stderr, code) = run_sf(&["-p", dir, "stage", "--tasks", "stage_songs"]);
    assert_eq!(code, Some(0), "{}", stderr);
    assert!(stdout.contains("staging_songs, 3 rows"));

    let (stdout, stderr, code) = run_sf(&["-p", dir, "load", "--tasks", "load_songs,load_artists"]);
    assert_eq!(code, Some(0), "{}", stderr);
    assert!(stdout.contains("✓ load_songs (songs, append-new, 3 rows)"));
    assert!(stdout.contains("✓ load_artists (artists, append-new, 2 rows)"));

    let (_, stderr, code) = run_sf(&["-p", dir, "load", "--tasks", "load_nothing"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("load_nothing"));
}

#[test]
fn test_ls_json() {
    let (stdout, stderr, code) = run_sf(&[
        "-p",
        fixture_dir().to_str().unwrap(),
        "ls",
        "--output",
        "json",
    ]);
    assert_eq!(code, Some(0), "{}", stderr);

    let tasks: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 7);
    assert_eq!(tasks[0]["name"], "stage_events");
    assert_eq!(tasks[2]["name"], "load_songplays");
    assert_eq!(tasks[2]["phase"], "fact");
    assert_eq!(tasks[3]["mode"], "merge");
}

#[test]
fn test_setup_print_does_not_touch_project() {
    let (stdout, _, code) = run_sf(&["setup", "--print"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("CREATE TABLE IF NOT EXISTS staging_events"));
}
