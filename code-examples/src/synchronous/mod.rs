use std::time::Duration;

use retry_executor::config::RetryConfig;
use retry_executor::strategies::RetryStrategy::ExponentialBackoff;
use retry_executor::synchronous::retry;

use crate::store::{DbError, FlakyStore};

// Example 1: Blocking count with the default configuration
pub fn example_count_participants(store: &FlakyStore) {
    let retry_config = RetryConfig::default();

    match retry(|| store.count_participants(), &retry_config) {
        Ok(count) => println!("Participants: {}", count),
        Err(error) => println!("Failed after retries: {}", error),
    }
}

// Example 2: Exponential strategy with jitter for a busy reporting job
pub fn example_exponential_backoff(store: &FlakyStore) {
    let retry_config = RetryConfig::default()
        .with_max_attempts(4)
        .with_delay(Duration::from_millis(100))
        .with_strategy(ExponentialBackoff)
        .with_jitter(true);

    match retry(|| store.count_participants(), &retry_config) {
        Ok(count) => println!("Report row count: {}", count),
        Err(error) => println!("Failed: {}", error),
    }
}

// Example 3: A permanent error is surfaced on the first attempt
pub fn example_non_retryable_insert(store: &FlakyStore) {
    let retry_config = RetryConfig::default().with_retry_condition(DbError::is_transient);

    let mut attempts = 0;
    let result = retry(
        || {
            attempts += 1;
            store.insert_training("Bookkeeping", 12)?;
            store.insert_training("Bookkeeping", 12)
        },
        &retry_config,
    );

    match result {
        Ok(()) => println!("Inserted"),
        Err(error) => println!("Gave up after {} attempt(s): {}", attempts, error),
    }
}
