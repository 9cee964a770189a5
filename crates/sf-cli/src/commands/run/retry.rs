//! Whole-task retry for the workflow driver

use sf_core::RetryConfig;
use sf_load::LoadError;
use sf_quality::QualityError;
use std::fmt;
use std::future::Future;

/// Errors that know whether running the whole task again can help
pub(crate) trait Retryable: fmt::Display {
    fn is_retryable(&self) -> bool;
}

impl Retryable for LoadError {
    fn is_retryable(&self) -> bool {
        LoadError::is_retryable(self)
    }
}

impl Retryable for QualityError {
    fn is_retryable(&self) -> bool {
        QualityError::is_retryable(self)
    }
}

/// Outcome of a task after all attempts
pub(crate) struct Attempted<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Run `task` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts()` attempts have been made.
///
/// Each attempt starts from scratch; nothing carries over between attempts.
pub(crate) async fn with_retry<T, E, F, Fut>(
    policy: &RetryConfig,
    name: &str,
    mut task: F,
) -> Attempted<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempts = 1;

    loop {
        match task().await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts,
                }
            }
            Err(e) if e.is_retryable() && attempts < max_attempts => {
                log::warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {}s",
                    name,
                    attempts,
                    max_attempts,
                    e,
                    policy.delay_secs
                );
                tokio::time::sleep(policy.delay()).await;
                attempts += 1;
            }
            Err(e) => {
                return Attempted {
                    result: Err(e),
                    attempts,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
