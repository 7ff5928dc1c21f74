//! Bounded retry wrapper

use std::future::Future;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::{ErrorKind, LocatorError};
use crate::types::RetryOptions;

/// Run `operation` up to `options.max_retries` times, sleeping
/// `options.delay_ms` between failed attempts (never after the last one).
///
/// On exhaustion the returned error has the requested `kind`, a message
/// naming `message` and the attempt count, and the last failure as cause.
/// Non-retryable failures (caller misconfiguration, or driver failures
/// marked permanent) are returned unchanged on the attempt that produced
/// them. A `max_retries` of zero still makes one attempt.
pub async fn retry<T, F, Fut>(
    operation: F,
    options: &RetryOptions,
    kind: ErrorKind,
    message: &str,
) -> Result<T, LocatorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LocatorError>>,
{
    retry_classified(operation, options, |_| kind, message).await
}

/// Like [`retry`], but the exhaustion kind is chosen from the last failure.
pub async fn retry_classified<T, F, Fut, K>(
    mut operation: F,
    options: &RetryOptions,
    classify: K,
    message: &str,
) -> Result<T, LocatorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LocatorError>>,
    K: Fn(&LocatorError) -> ErrorKind,
{
    let max_attempts = options.max_retries.max(1);
    let mut last_error: Option<LocatorError> = None;

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "{} succeeded after retry", message);
                }
                return Ok(value);
            }
            Err(err) if !err.is_retryable() => {
                debug!(attempt, error = %err, "{} failed with non-retryable error", message);
                return Err(err);
            }
            Err(err) => {
                warn!(
                    attempt,
                    max_attempts,
                    error = %err,
                    "{} failed",
                    message
                );
                last_error = Some(err);
                if attempt < max_attempts {
                    sleep(options.delay()).await;
                }
            }
        }
    }

    let Some(last) = last_error else {
        return Err(LocatorError::new(
            ErrorKind::Driver,
            format!("{} made no attempts", message),
        ));
    };
    let mut error = LocatorError::new(
        classify(&last),
        format!("{} failed after {} attempts", message, max_attempts),
    )
    .with_attempts(max_attempts);
    if let Some(target) = last.target() {
        error = error.with_target(target.to_string());
    }
    if let Some(strategy) = last.strategy() {
        error = error.with_strategy(strategy);
    }
    Err(error.with_cause(last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StrategyKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn always_failing_operation_runs_exactly_max_retries_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = Instant::now();

        let result: Result<(), _> = retry(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(LocatorError::element_not_found("#flaky", "no match"))
                }
            },
            &RetryOptions::new(3, 1000),
            ErrorKind::ElementNotFound,
            "click #flaky",
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.attempts(), Some(3));
        assert!(err.message().contains("3 attempts"));
        assert_eq!(err.target(), Some("#flaky"));
        assert!(err.cause().is_some());
        // two sleeps between three attempts
        assert_eq!(started.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_once_operation_recovers() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = retry(
            || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 2 {
                        Err(LocatorError::timeout("not yet"))
                    } else {
                        Ok(n)
                    }
                }
            },
            &RetryOptions::default(),
            ErrorKind::Timeout,
            "wait",
        )
        .await
        .unwrap();

        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn configuration_errors_are_never_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = retry(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(LocatorError::configuration(
                        StrategyKind::ContainsText,
                        "text is required",
                    ))
                }
            },
            &RetryOptions::new(5, 10),
            ErrorKind::ElementNotFound,
            "resolve",
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        assert_eq!(err.attempts(), None);
    }

    #[tokio::test]
    async fn exhaustion_kind_follows_the_last_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = retry_classified(
            || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(if n == 0 {
                        LocatorError::self_healing_failed("cart.checkout", "catalog exhausted")
                    } else {
                        LocatorError::element_not_found(".checkout", "no match")
                    })
                }
            },
            &RetryOptions::new(2, 0),
            |last| match last.root_kind() {
                ErrorKind::SelfHealingFailed => ErrorKind::SelfHealingFailed,
                _ => ErrorKind::ElementNotFound,
            },
            "click cart.checkout",
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);
        assert_eq!(err.target(), Some(".checkout"));
    }

    #[tokio::test]
    async fn zero_retries_still_attempts_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let _ = retry(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(LocatorError::timeout("slow"))
                }
            },
            &RetryOptions::new(0, 0),
            ErrorKind::Timeout,
            "noop",
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
