use crate::cancellation::CancellationToken;
use crate::config::RetryConfig;
use crate::error::RetryError;
use async_std::task::sleep;
use futures::future::{Either, select};
use log::{debug, info, warn};
use std::pin::pin;

/// Retries an asynchronous operation based on the specified retry configuration.
///
/// The operation is invoked up to `retry_config.max_attempts` times. After the
/// failed attempt `n` the executor pauses for
/// `retry_config.strategy.calculate_delay(retry_config.delay, n)` before the
/// next one; with the default linear strategy that is `n × delay`. There is no
/// pause after the final attempt.
///
/// **The operation must be idempotent.** Every attempt is a real invocation: a
/// database write that failed after reaching the server may already have been
/// applied, and retrying it can apply it twice. The executor cannot detect
/// this; guard writes with an idempotency key or an upsert.
///
/// # Arguments
/// * `operation` - A closure that returns a `Future` resolving to a `Result<T, E>`.
/// * `retry_config` - A reference to `RetryConfig` specifying the attempts, delay and strategy.
///
/// # Returns
/// * `Ok(T)` as soon as one attempt succeeds.
/// * `Err(E)` with the error from the last attempt, unchanged, once the attempts
///   are exhausted or the retry condition rejects an error.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use async_std::task::block_on;
/// use retry_executor::asynchronous::retry;
/// use retry_executor::config::RetryConfig;
///
/// async fn count_participants(healthy: bool) -> Result<u64, String> {
///     if healthy { Ok(42) } else { Err("connection refused".to_string()) }
/// }
///
/// let config = RetryConfig::default().with_delay(Duration::from_millis(1));
/// let mut calls = 0;
/// let result = block_on(retry(
///     || {
///         calls += 1;
///         count_participants(calls > 1)
///     },
///     &config,
/// ));
/// assert_eq!(result, Ok(42));
/// assert_eq!(calls, 2);
/// ```
///
/// # Notes
/// - Failed attempts and the final failure are logged at `warn` level.
/// - Suspension happens only inside the operation and during the backoff pause,
///   so concurrent callers are never blocked.
pub async fn retry<F, Fut, T, E>(mut operation: F, retry_config: &RetryConfig<E>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = retry_config.attempt_limit();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(output) => {
                info!("Operation succeeded after {} attempts", attempt);
                return Ok(output);
            }
            Err(err) if attempt < max_attempts => {
                if !retry_config.should_retry(&err) {
                    warn!(
                        "Operation failed (attempt {}/{}), not retryable, giving up.",
                        attempt, max_attempts
                    );
                    return Err(err);
                }
                let delay = retry_config.delay_for_attempt(attempt);
                warn!(
                    "Operation failed (attempt {}/{}), retrying after {:?}...",
                    attempt, max_attempts, delay
                );
                sleep(delay).await;
            }
            Err(err) => {
                warn!("Operation failed after {} attempts, giving up.", attempt);
                return Err(err);
            }
        }

        attempt += 1;
    }
}

/// Retries an asynchronous operation until it succeeds, the attempts run out,
/// or `token` is cancelled.
///
/// Behaves like [`retry`] and additionally checks `token` before every attempt
/// and while waiting out every backoff pause. A cancellation that arrives
/// during a pause ends the wait immediately. An attempt that has already
/// started is always awaited to completion.
///
/// The same idempotency requirement as [`retry`] applies.
///
/// # Returns
/// * `Ok(T)` as soon as one attempt succeeds.
/// * `Err(RetryError::Operation(e))` with the last error, unchanged.
/// * `Err(RetryError::Cancelled { attempts })` if cancellation was observed first.
///
/// # Example
/// ```rust
/// use async_std::task::block_on;
/// use retry_executor::asynchronous::retry_with_cancellation;
/// use retry_executor::cancellation::CancellationToken;
/// use retry_executor::config::RetryConfig;
/// use retry_executor::error::RetryError;
///
/// let token = CancellationToken::new();
/// token.cancel();
///
/// let config = RetryConfig::default();
/// let result = block_on(retry_with_cancellation(
///     || async { Ok::<_, String>("rows") },
///     &config,
///     &token,
/// ));
/// assert_eq!(result, Err(RetryError::Cancelled { attempts: 0 }));
/// ```
pub async fn retry_with_cancellation<F, Fut, T, E>(
    mut operation: F,
    retry_config: &RetryConfig<E>,
    token: &CancellationToken,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = retry_config.attempt_limit();
    let mut attempt = 1;

    loop {
        if token.is_cancelled() {
            debug!("Retry cancelled before attempt {}/{}", attempt, max_attempts);
            return Err(RetryError::Cancelled {
                attempts: attempt - 1,
            });
        }

        match operation().await {
            Ok(output) => {
                info!("Operation succeeded after {} attempts", attempt);
                return Ok(output);
            }
            Err(err) if attempt < max_attempts => {
                if !retry_config.should_retry(&err) {
                    warn!(
                        "Operation failed (attempt {}/{}), not retryable, giving up.",
                        attempt, max_attempts
                    );
                    return Err(RetryError::Operation(err));
                }
                if token.is_cancelled() {
                    debug!("Retry cancelled after attempt {}/{}", attempt, max_attempts);
                    return Err(RetryError::Cancelled { attempts: attempt });
                }
                let delay = retry_config.delay_for_attempt(attempt);
                warn!(
                    "Operation failed (attempt {}/{}), retrying after {:?}...",
                    attempt, max_attempts, delay
                );

                let pause = pin!(sleep(delay));
                let cancelled = pin!(token.cancelled());
                if let Either::Right(_) = select(pause, cancelled).await {
                    debug!(
                        "Retry cancelled during backoff after attempt {}/{}",
                        attempt, max_attempts
                    );
                    return Err(RetryError::Cancelled { attempts: attempt });
                }
            }
            Err(err) => {
                warn!("Operation failed after {} attempts, giving up.", attempt);
                return Err(RetryError::Operation(err));
            }
        }

        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::RetryStrategy;
    use async_std::task::{block_on, sleep, spawn};
    use std::error::Error;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    #[derive(Debug, PartialEq, Eq)]
    struct DummyError(&'static str);

    impl std::fmt::Display for DummyError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }
    impl Error for DummyError {}

    fn config(max_attempts: usize, delay: Duration) -> RetryConfig<DummyError> {
        RetryConfig::new(max_attempts, delay, RetryStrategy::Linear)
    }

    // Suite for `retry` function
    mod retry_tests {
        use super::*;

        #[test]
        fn test_retry_success_first_try() {
            let config = config(3, Duration::from_millis(200));

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    let mut count = op_attempts.lock().unwrap();
                    *count += 1;
                    Ok::<_, DummyError>("success")
                }
            };

            let started = Instant::now();
            let result = block_on(retry(operation, &config));
            assert_eq!(result, Ok("success"));
            assert_eq!(*attempts.lock().unwrap(), 1);
            assert!(started.elapsed() < Duration::from_millis(200));
        }

        #[test]
        fn test_retry_success_on_last_attempt() {
            let config = config(3, Duration::from_millis(10));

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    let mut count = op_attempts.lock().unwrap();
                    *count += 1;
                    if *count < 3 {
                        Err(DummyError("connection reset"))
                    } else {
                        Ok("eventual success")
                    }
                }
            };

            let result = block_on(retry(operation, &config));
            assert_eq!(result, Ok("eventual success"));
            assert_eq!(*attempts.lock().unwrap(), 3);
        }

        #[test]
        fn test_retry_failure_all_attempts() {
            let config = config(4, Duration::from_millis(5));

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    let mut count = op_attempts.lock().unwrap();
                    *count += 1;
                    Err(DummyError("permanent failure"))
                }
            };

            let result: Result<(), DummyError> = block_on(retry(operation, &config));
            assert_eq!(result, Err(DummyError("permanent failure")));
            assert_eq!(*attempts.lock().unwrap(), config.max_attempts);
        }

        #[test]
        fn test_retry_returns_error_from_last_attempt() {
            let config = RetryConfig::new(3, Duration::ZERO, RetryStrategy::Linear);

            let attempts = Arc::new(Mutex::new(Vec::new()));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    let mut seen = op_attempts.lock().unwrap();
                    let err = Arc::new(DummyError("query failed"));
                    seen.push(err.clone());
                    Err::<(), _>(err)
                }
            };

            let result = block_on(retry(operation, &config));
            let err = result.unwrap_err();
            let seen = attempts.lock().unwrap();
            assert_eq!(seen.len(), 3);
            assert!(Arc::ptr_eq(&err, &seen[2]));
            assert!(!Arc::ptr_eq(&err, &seen[0]));
        }

        #[test]
        fn test_retry_single_attempt_does_not_wait() {
            let config = config(1, Duration::from_millis(500));

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    *op_attempts.lock().unwrap() += 1;
                    Err::<(), _>(DummyError("fail fast"))
                }
            };

            let started = Instant::now();
            let result = block_on(retry(operation, &config));
            assert_eq!(result, Err(DummyError("fail fast")));
            assert_eq!(*attempts.lock().unwrap(), 1);
            assert!(started.elapsed() < Duration::from_millis(500));
        }

        #[test]
        fn test_retry_zero_max_attempts_runs_once() {
            let config = RetryConfig {
                max_attempts: 0,
                delay: Duration::from_millis(10),
                strategy: RetryStrategy::Linear,
                retry_condition: None,
                jitter: false,
            };

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    *op_attempts.lock().unwrap() += 1;
                    Err::<(), _>(DummyError("fail"))
                }
            };

            let result = block_on(retry(operation, &config));
            assert_eq!(result, Err(DummyError("fail")));
            assert_eq!(*attempts.lock().unwrap(), 1);
        }

        #[test]
        fn test_retry_linear_backoff_timing() {
            let unit = Duration::from_millis(40);
            let config = config(3, unit);

            let stamps = Arc::new(Mutex::new(Vec::new()));
            let op_stamps = stamps.clone();
            let operation = move || {
                let op_stamps = op_stamps.clone();
                async move {
                    op_stamps.lock().unwrap().push(Instant::now());
                    Err::<(), _>(DummyError("timeout"))
                }
            };

            let result = block_on(retry(operation, &config));
            let finished = Instant::now();
            assert_eq!(result, Err(DummyError("timeout")));

            let stamps = stamps.lock().unwrap();
            assert_eq!(stamps.len(), 3);
            let first_gap = stamps[1] - stamps[0];
            let second_gap = stamps[2] - stamps[1];
            assert!(first_gap >= unit, "first pause was {first_gap:?}");
            assert!(second_gap >= unit * 2, "second pause was {second_gap:?}");
            assert!(second_gap > first_gap);
            assert!(finished - stamps[2] < unit, "paused after the final attempt");
        }

        #[test]
        fn test_retry_condition_un_match() {
            let config =
                config(3, Duration::from_millis(10)).with_retry_condition(|e| e.0.contains("transient"));

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    *op_attempts.lock().unwrap() += 1;
                    Err::<(), _>(DummyError("duplicate key value"))
                }
            };

            let result = block_on(retry(operation, &config));
            assert_eq!(result, Err(DummyError("duplicate key value")));
            assert_eq!(*attempts.lock().unwrap(), 1);
        }

        #[test]
        fn test_retry_condition_match() {
            let config =
                config(3, Duration::from_millis(10)).with_retry_condition(|e| e.0.contains("transient"));

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    *op_attempts.lock().unwrap() += 1;
                    Err::<(), _>(DummyError("transient"))
                }
            };

            let result = block_on(retry(operation, &config));
            assert_eq!(result, Err(DummyError("transient")));
            assert_eq!(*attempts.lock().unwrap(), 3);
        }

        #[test]
        fn test_concurrent_retries_are_independent() {
            let config = config(3, Duration::from_millis(5));

            let result = block_on(async {
                let first = retry(|| async { Err::<u32, _>(DummyError("down")) }, &config);
                let second = retry(|| async { Ok::<_, DummyError>(7) }, &config);
                futures::join!(first, second)
            });

            assert_eq!(result, (Err(DummyError("down")), Ok(7)));
        }
    }

    // Suite for `retry_with_cancellation` function
    mod retry_with_cancellation_tests {
        use super::*;

        #[test]
        fn test_cancelled_before_first_attempt() {
            let config = config(3, Duration::from_millis(10));
            let token = CancellationToken::new();
            token.cancel();

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    *op_attempts.lock().unwrap() += 1;
                    Ok::<_, DummyError>("rows")
                }
            };

            let result = block_on(retry_with_cancellation(operation, &config, &token));
            assert_eq!(result, Err(RetryError::Cancelled { attempts: 0 }));
            assert_eq!(*attempts.lock().unwrap(), 0);
        }

        #[test]
        fn test_cancelled_during_backoff() {
            let config = config(3, Duration::from_secs(5));
            let token = CancellationToken::new();
            let canceller = token.clone();

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    *op_attempts.lock().unwrap() += 1;
                    Err::<(), _>(DummyError("connection refused"))
                }
            };

            let started = Instant::now();
            let result = block_on(async {
                spawn(async move {
                    sleep(Duration::from_millis(30)).await;
                    canceller.cancel();
                });
                retry_with_cancellation(operation, &config, &token).await
            });

            assert_eq!(result, Err(RetryError::Cancelled { attempts: 1 }));
            assert_eq!(*attempts.lock().unwrap(), 1);
            assert!(started.elapsed() < Duration::from_secs(5));
        }

        #[test]
        fn test_cancel_during_attempt_waits_for_attempt() {
            let config = config(3, Duration::from_millis(10));
            let token = CancellationToken::new();
            let op_token = token.clone();

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                let op_token = op_token.clone();
                async move {
                    op_token.cancel();
                    sleep(Duration::from_millis(10)).await;
                    *op_attempts.lock().unwrap() += 1;
                    Err::<(), _>(DummyError("slow failure"))
                }
            };

            let result = block_on(retry_with_cancellation(operation, &config, &token));
            assert_eq!(result, Err(RetryError::Cancelled { attempts: 1 }));
            assert_eq!(*attempts.lock().unwrap(), 1);
        }

        #[test]
        fn test_success_is_returned_even_if_cancelled_mid_attempt() {
            let config = config(3, Duration::from_millis(10));
            let token = CancellationToken::new();
            let op_token = token.clone();

            let operation = move || {
                let op_token = op_token.clone();
                async move {
                    op_token.cancel();
                    Ok::<_, DummyError>("committed")
                }
            };

            let result = block_on(retry_with_cancellation(operation, &config, &token));
            assert_eq!(result, Ok("committed"));
        }

        #[test]
        fn test_exhaustion_returns_operation_error() {
            let config = config(2, Duration::from_millis(5));
            let token = CancellationToken::new();

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    *op_attempts.lock().unwrap() += 1;
                    Err::<(), _>(DummyError("pool exhausted"))
                }
            };

            let result = block_on(retry_with_cancellation(operation, &config, &token));
            assert_eq!(result, Err(RetryError::Operation(DummyError("pool exhausted"))));
            assert_eq!(*attempts.lock().unwrap(), 2);
        }

        #[test]
        fn test_eventual_success_without_cancel() {
            let config = config(3, Duration::from_millis(5));
            let token = CancellationToken::new();

            let attempts = Arc::new(Mutex::new(0));
            let op_attempts = attempts.clone();
            let operation = move || {
                let op_attempts = op_attempts.clone();
                async move {
                    let mut count = op_attempts.lock().unwrap();
                    *count += 1;
                    if *count < 3 {
                        Err(DummyError("timeout"))
                    } else {
                        Ok(*count)
                    }
                }
            };

            let result = block_on(retry_with_cancellation(operation, &config, &token));
            assert_eq!(result, Ok(3));
        }

        #[test]
        fn test_retry_condition_rejects_without_cancel() {
            let config =
                config(3, Duration::from_millis(5)).with_retry_condition(|e| e.0 == "timeout");
            let token = CancellationToken::new();

            let result: Result<(), _> = block_on(retry_with_cancellation(
                || async { Err(DummyError("syntax error")) },
                &config,
                &token,
            ));
            assert_eq!(result, Err(RetryError::Operation(DummyError("syntax error"))));
        }
    }
}
