use crate::strategies::RetryStrategy;
use rand::Rng;
use std::time::Duration;

/// Configuration for retrying operations.
///
/// This struct defines the parameters for retrying an operation, including
/// the maximum number of attempts, the delay unit between attempts, the
/// strategy that scales that unit, and an optional retry condition.
///
/// A single `RetryConfig` can be borrowed by any number of concurrent callers;
/// the executors never mutate it.
#[derive(Debug, Clone)]
pub struct RetryConfig<E> {
    /// The maximum number of attempts, including the first one.
    ///
    /// With `max_attempts` set to 3 the operation runs at most 3 times
    /// (1 initial attempt + 2 retries). A value of 1 disables retrying.
    pub max_attempts: usize,

    /// The delay unit between attempts.
    ///
    /// The actual pause is derived from this unit by `strategy`. With the
    /// default `Linear` strategy and a delay of 200ms, the pause after the
    /// first failure is 200ms and after the second one 400ms.
    /// `Duration::ZERO` retries immediately.
    pub delay: Duration,

    /// The strategy used to scale `delay` by the attempt number.
    pub strategy: RetryStrategy,

    /// An optional function to determine if a failed attempt should be retried.
    ///
    /// It takes a reference to the error (`&E`) and returns:
    /// - `true` if the operation should be retried.
    /// - `false` if the error is permanent, causing the executor to return it immediately.
    ///
    /// If set to `None` (the default), every error is retried up to `max_attempts`,
    /// including permanent ones such as constraint violations.
    pub retry_condition: Option<fn(&E) -> bool>,

    /// Randomizes each pause into `[delay / 2, delay]` when enabled.
    ///
    /// Off by default, which keeps the pauses deterministic.
    pub jitter: bool,
}

impl<E> Default for RetryConfig<E> {
    /// Provides a default configuration for retrying operations.
    ///
    /// The default configuration includes:
    /// - `max_attempts`: 3
    /// - `delay`: 200 milliseconds
    /// - `strategy`: `Linear`, so the pauses are 200ms then 400ms
    /// - `retry_condition`: `None`, meaning all errors trigger retries
    /// - `jitter`: `false`
    fn default() -> Self {
        RetryConfig {
            max_attempts: 3,
            delay: Duration::from_millis(200),
            strategy: RetryStrategy::Linear,
            retry_condition: None,
            jitter: false,
        }
    }
}

impl<E> RetryConfig<E> {
    /// Creates a new `RetryConfig` with the specified maximum attempts, delay, and strategy.
    ///
    /// `retry_condition` is left as `None` and jitter is disabled.
    ///
    /// # Panics
    /// Panics if `max_attempts` is 0.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use retry_executor::config::RetryConfig;
    /// use retry_executor::strategies::RetryStrategy;
    ///
    /// let config: RetryConfig<String> =
    ///     RetryConfig::new(5, Duration::from_millis(100), RetryStrategy::Linear);
    /// assert_eq!(config.max_attempts, 5);
    /// ```
    pub fn new(max_attempts: usize, delay: Duration, strategy: RetryStrategy) -> Self {
        assert!(max_attempts > 0, "max_attempts must be greater than 0");
        RetryConfig {
            max_attempts,
            delay,
            strategy,
            retry_condition: None,
            jitter: false,
        }
    }

    /// Builder-style setter for `max_attempts`.
    ///
    /// # Panics
    /// Panics if `max_attempts` is 0.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        assert!(max_attempts > 0, "max_attempts must be greater than 0");
        self.max_attempts = max_attempts;
        self
    }

    /// Builder-style setter for the delay unit.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the retry strategy and returns the modified `RetryConfig`.
    ///
    /// # Examples
    /// ```
    /// use retry_executor::config::RetryConfig;
    /// use retry_executor::strategies::RetryStrategy;
    ///
    /// let config: RetryConfig<()> =
    ///     RetryConfig::default().with_strategy(RetryStrategy::ExponentialBackoff);
    /// assert_eq!(config.strategy, RetryStrategy::ExponentialBackoff);
    /// ```
    pub fn with_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets a custom retry condition and returns the modified `RetryConfig`.
    ///
    /// Use this to stop wasting attempts on errors that will never succeed,
    /// such as a uniqueness constraint violation.
    ///
    /// # Examples
    /// ```
    /// use retry_executor::config::RetryConfig;
    ///
    /// let config = RetryConfig::default()
    ///     .with_retry_condition(|e: &String| e.contains("connection"));
    /// assert!(config.should_retry(&"connection reset".to_string()));
    /// assert!(!config.should_retry(&"duplicate key".to_string()));
    /// ```
    pub fn with_retry_condition(mut self, retry_condition: fn(&E) -> bool) -> Self {
        self.retry_condition = Some(retry_condition);
        self
    }

    /// Enables or disables jitter on the computed pauses.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns the number of attempts the executors will make at most.
    ///
    /// A hand-built config with `max_attempts == 0` still runs the operation once.
    pub(crate) fn attempt_limit(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// Returns `true` if the error should trigger another attempt.
    pub fn should_retry(&self, err: &E) -> bool {
        self.retry_condition.is_none_or(|condition| condition(err))
    }

    /// Computes the pause that follows the failed `attempt` (1-based).
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use retry_executor::config::RetryConfig;
    ///
    /// let config: RetryConfig<()> = RetryConfig::default();
    /// assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
    /// assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
    /// ```
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let delay = self.strategy.calculate_delay(self.delay, attempt);
        if self.jitter {
            apply_jitter(delay)
        } else {
            delay
        }
    }
}

/// Equal jitter: keeps half of the delay and randomizes the other half.
fn apply_jitter(delay: Duration) -> Duration {
    let half = delay / 2;
    let spread = u64::try_from(half.as_nanos()).unwrap_or(u64::MAX);
    if spread == 0 {
        return delay;
    }
    let extra = rand::rng().random_range(0..=spread);
    half.saturating_add(Duration::from_nanos(extra))
}
