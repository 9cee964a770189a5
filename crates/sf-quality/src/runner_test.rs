use super::*;
use sf_core::{CheckTarget, ColumnName, TableName};
use sf_db::test_utils::RecordingDatabase;
use sf_db::DuckDbBackend;

fn table(name: &str) -> CheckTarget {
    CheckTarget::Table(TableName::parse(name).unwrap())
}

fn column(table: &str, column: &str) -> CheckTarget {
    CheckTarget::Column {
        table: TableName::parse(table).unwrap(),
        target_column: ColumnName::parse(column).unwrap(),
    }
}

async fn warehouse() -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE songplays (songplay_id VARCHAR, start_time TIMESTAMP);
         INSERT INTO songplays VALUES ('a', CAST(current_date AS TIMESTAMP));
         CREATE TABLE users (userid INTEGER);
         CREATE TABLE stale_events (ts TIMESTAMP);
         INSERT INTO stale_events VALUES (CAST(current_date - INTERVAL 10 DAY AS TIMESTAMP));",
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn test_row_count_nonzero_pass() {
    let db = warehouse().await;
    let report = CheckRunner::new(&db)
        .run_checks(&[CheckGroup::new("empty_table_check", vec![table("songplays")])])
        .await
        .unwrap();

    assert_eq!(report.passed(), 1);
    assert_eq!(report.outcomes[0].actual, Some(1));
    assert_eq!(report.outcomes[0].kind, CheckKind::RowCountNonzero);
}

#[tokio::test]
async fn test_row_count_nonzero_fail_names_table() {
    let db = warehouse().await;
    let err = CheckRunner::new(&db)
        .run_checks(&[CheckGroup::new("row_count_nonzero", vec![table("users")])])
        .await
        .unwrap_err();

    match err {
        QualityError::Failure {
            check,
            table,
            expected,
            actual,
            ..
        } => {
            assert_eq!(check, "row_count_nonzero");
            assert_eq!(table, "users");
            assert_eq!(expected, "1");
            assert_eq!(actual, "0");
        }
        other => panic!("expected a quality failure, got {other}"),
    }
}

#[tokio::test]
async fn test_fresh_data_passes() {
    let db = warehouse().await;
    let report = CheckRunner::new(&db)
        .run_checks(&[CheckGroup::new(
            "freshness_check",
            vec![column("songplays", "start_time")],
        )])
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].status, CheckStatus::Pass);
    assert_eq!(report.outcomes[0].actual, Some(0));
}

#[tokio::test]
async fn test_stale_data_warns_and_run_succeeds() {
    let db = warehouse().await;
    let report = CheckRunner::new(&db)
        .run_checks(&[
            CheckGroup::new("freshness", vec![column("stale_events", "ts")]),
            CheckGroup::new("empty_table_check", vec![table("songplays")]),
        ])
        .await
        .unwrap();

    let warnings: Vec<_> = report.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].target, "stale_events.ts");
    assert_eq!(warnings[0].actual, Some(10));
    assert_eq!(report.passed(), 1);
}

#[tokio::test]
async fn test_freshness_of_empty_column_warns() {
    let db = warehouse().await;
    db.execute("CREATE TABLE empty_events (ts TIMESTAMP)").await.unwrap();

    let report = CheckRunner::new(&db)
        .run_checks(&[CheckGroup::new("freshness", vec![column("empty_events", "ts")])])
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].status, CheckStatus::Warn);
    assert_eq!(report.outcomes[0].actual, None);
}

#[tokio::test]
async fn test_null_columns_check() {
    let db = warehouse().await;
    db.execute_batch("INSERT INTO users VALUES (1), (NULL)").await.unwrap();

    let err = CheckRunner::new(&db)
        .run_checks(&[CheckGroup::new("null_columns_check", vec![column("users", "userid")])])
        .await
        .unwrap_err();

    assert!(matches!(err, QualityError::Failure { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_fail_fast_skips_later_targets() {
    let db = RecordingDatabase::new()
        .with_scalar("\"table_a\"", Some(0))
        .with_scalar("\"table_b\"", Some(1));

    let err = CheckRunner::new(&db)
        .run_checks(&[CheckGroup::new(
            "empty_table_check",
            vec![table("table_a"), table("table_b")],
        )])
        .await
        .unwrap_err();

    assert!(matches!(err, QualityError::Failure { .. }));
    assert!(db.saw("\"table_a\""));
    assert!(!db.saw("\"table_b\""));
}

#[tokio::test]
async fn test_fail_fast_skips_later_kinds() {
    let db = RecordingDatabase::new()
        .with_scalar("\"table_a\"", Some(0))
        .with_scalar("\"table_b\"", Some(0));

    let result = CheckRunner::new(&db)
        .run_checks(&[
            CheckGroup::new("empty_table_check", vec![table("table_a")]),
            CheckGroup::new("null_columns_check", vec![column("table_b", "id")]),
        ])
        .await;

    assert!(result.is_err());
    assert_eq!(db.statements().len(), 1);
}

#[tokio::test]
async fn test_unknown_kind_stops_later_kinds() {
    let db = RecordingDatabase::new().with_scalar("\"songplays\"", Some(1));

    let err = CheckRunner::new(&db)
        .run_checks(&[
            CheckGroup::new("empty_table_check", vec![table("songplays")]),
            CheckGroup::new("uniqueness_check", vec![table("songplays")]),
            CheckGroup::new("freshness", vec![column("songplays", "start_time")]),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, QualityError::Configuration(_)));
    assert!(err.to_string().contains("uniqueness_check"));
    assert!(!err.is_retryable());
    // Only the first kind ran
    assert_eq!(db.statements().len(), 1);
    assert!(!db.saw("date_diff"));
}

#[tokio::test]
async fn test_scope_mismatch_is_configuration_error() {
    let db = RecordingDatabase::new();
    let err = CheckRunner::new(&db)
        .run_checks(&[CheckGroup::new("freshness", vec![table("songplays")])])
        .await
        .unwrap_err();

    assert!(matches!(err, QualityError::Configuration(_)));
    assert!(db.statements().is_empty());
}

#[tokio::test]
async fn test_storage_error_is_retryable() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = CheckRunner::new(&db)
        .run_checks(&[CheckGroup::new("empty_table_check", vec![table("missing")])])
        .await
        .unwrap_err();

    assert!(matches!(err, QualityError::Storage(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_empty_check_set_succeeds() {
    let db = RecordingDatabase::new();
    let report = CheckRunner::new(&db).run_checks(&[]).await.unwrap();
    assert!(report.outcomes.is_empty());
}
