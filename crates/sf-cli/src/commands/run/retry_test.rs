use super::*;
use sf_core::CoreError;
use sf_db::DbError;
use std::cell::Cell;

fn policy(retries: u32) -> RetryConfig {
    RetryConfig {
        retries,
        delay_secs: 0,
    }
}

fn storage_error() -> LoadError {
    LoadError::Storage(DbError::ExecutionError("connection reset".to_string()))
}

#[tokio::test]
async fn test_success_on_first_attempt() {
    let outcome = with_retry(&policy(3), "load_users", || async { Ok::<_, LoadError>(7) }).await;
    assert_eq!(outcome.result.unwrap(), 7);
    assert_eq!(outcome.attempts, 1);
}

#[tokio::test]
async fn test_storage_error_is_retried_until_success() {
    let calls = Cell::new(0);
    let outcome = with_retry(&policy(3), "load_users", || {
        calls.set(calls.get() + 1);
        let n = calls.get();
        async move {
            if n < 3 {
                Err(storage_error())
            } else {
                Ok(n)
            }
        }
    })
    .await;

    assert_eq!(outcome.result.unwrap(), 3);
    assert_eq!(outcome.attempts, 3);
}

#[tokio::test]
async fn test_attempts_are_bounded() {
    let calls = Cell::new(0);
    let outcome = with_retry(&policy(2), "stage_events", || {
        calls.set(calls.get() + 1);
        async { Err::<(), _>(storage_error()) }
    })
    .await;

    assert!(outcome.result.is_err());
    assert_eq!(outcome.attempts, 3);
    assert_eq!(calls.get(), 3);
}

#[tokio::test]
async fn test_configuration_error_is_not_retried() {
    let calls = Cell::new(0);
    let outcome = with_retry(&policy(3), "load_users", || {
        calls.set(calls.get() + 1);
        async {
            Err::<(), _>(LoadError::Configuration(CoreError::UnknownInsertMode {
                mode: "upsert-typo".to_string(),
            }))
        }
    })
    .await;

    assert!(outcome.result.is_err());
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn test_quality_failure_is_not_retried() {
    let calls = Cell::new(0);
    let outcome = with_retry(&policy(3), "quality", || {
        calls.set(calls.get() + 1);
        async {
            Err::<(), _>(QualityError::Failure {
                check: "row_count_nonzero".to_string(),
                table: "songplays".to_string(),
                target: "songplays".to_string(),
                expected: "1".to_string(),
                actual: "0".to_string(),
            })
        }
    })
    .await;

    assert!(outcome.result.is_err());
    assert_eq!(outcome.attempts, 1);
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn test_zero_retries_means_one_attempt() {
    let outcome = with_retry(&policy(0), "load_users", || async {
        Err::<(), _>(storage_error())
    })
    .await;
    assert_eq!(outcome.attempts, 1);
}
