use crate::cancellation::CancellationToken;
use crate::config::RetryConfig;
use crate::error::RetryError;
use log::{debug, info, warn};
use std::thread::sleep;

/// Retries a blocking operation based on the specified retry configuration.
///
/// Same contract as [`asynchronous::retry`](crate::asynchronous::retry), but the
/// backoff pause blocks the current thread. The operation must be idempotent.
///
/// # Arguments
/// * `operation` - A closure that returns a `Result<T, E>`.
/// * `retry_config` - A reference to `RetryConfig` specifying the attempts, delay and strategy.
///
/// # Returns
/// * `Ok(T)` as soon as one attempt succeeds.
/// * `Err(E)` with the error from the last attempt, unchanged.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use retry_executor::config::RetryConfig;
/// use retry_executor::strategies::RetryStrategy::Linear;
/// use retry_executor::synchronous::retry;
///
/// let retry_config = RetryConfig { max_attempts: 3, delay: Duration::from_millis(5), retry_condition: None, strategy: Linear, jitter: false };
/// let result: Result<i32, &str> = retry(|| {
///     Err("Temporary failure") // Always fails in this example
/// }, &retry_config);
/// assert_eq!(result, Err("Temporary failure"));
/// ```
/// # Notes
/// - The function logs warnings for failed attempts and final failure.
pub fn retry<F, T, E>(mut operation: F, retry_config: &RetryConfig<E>) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
{
    let max_attempts = retry_config.attempt_limit();
    let mut attempt = 1;

    loop {
        match operation() {
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
                sleep(delay);
            }
            Err(err) => {
                warn!("Operation failed after {} attempts, giving up.", attempt);
                return Err(err);
            }
        }

        attempt += 1;
    }
}

/// Blocking counterpart of
/// [`asynchronous::retry_with_cancellation`](crate::asynchronous::retry_with_cancellation).
///
/// The token is checked before every attempt and on both sides of every
/// backoff pause. A thread sleep cannot be interrupted, so a cancellation that
/// arrives mid-pause is observed when the pause ends.
pub fn retry_with_cancellation<F, T, E>(
    mut operation: F,
    retry_config: &RetryConfig<E>,
    token: &CancellationToken,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
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

        match operation() {
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
                sleep(delay);
            }
            Err(err) => {
                warn!("Operation failed after {} attempts, giving up.", attempt);
                return Err(RetryError::Operation(err));
            }
        }

        attempt += 1;
    }
}
