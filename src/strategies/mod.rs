use std::time::Duration;

/// Defines how the pause before the next attempt grows with the attempt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    /// The same delay after every failed attempt.
    ///
    /// With a base delay of 200ms every retry waits 200ms.
    Fixed,
    /// The delay grows linearly with the number of the attempt that just failed.
    ///
    /// With a base delay of 200ms the retries wait 200ms, 400ms, 600ms, and so on.
    /// This is the strategy used by [`RetryConfig::default`](crate::config::RetryConfig).
    #[default]
    Linear,
    /// The delay doubles after every failed attempt.
    ///
    /// With a base delay of 200ms the retries wait 200ms, 400ms, 800ms, 1600ms...
    ExponentialBackoff,
    /// The delay follows the Fibonacci sequence scaled by the base delay.
    ///
    /// With a base delay of 1 second the retries wait 1s, 1s, 2s, 3s, 5s, 8s...
    /// This grows more gently than exponential backoff.
    FibonacciBackoff,
}

impl RetryStrategy {
    /// Calculates how long to wait after a failed attempt.
    ///
    /// # Arguments
    /// * `base_delay` - The delay unit, usually [`RetryConfig::delay`](crate::config::RetryConfig::delay).
    /// * `attempt` - The 1-based number of the attempt that just failed. `0` is
    ///   treated like `1`.
    ///
    /// # Returns
    /// The pause before the next attempt. Overflow saturates at [`Duration::MAX`].
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use retry_executor::strategies::RetryStrategy;
    ///
    /// let base = Duration::from_millis(200);
    /// assert_eq!(RetryStrategy::Linear.calculate_delay(base, 1), Duration::from_millis(200));
    /// assert_eq!(RetryStrategy::Linear.calculate_delay(base, 2), Duration::from_millis(400));
    /// ```
    pub fn calculate_delay(&self, base_delay: Duration, attempt: usize) -> Duration {
        let attempt = attempt.max(1);
        match self {
            RetryStrategy::Fixed => base_delay,
            RetryStrategy::Linear => scale(base_delay, attempt as u64),
            RetryStrategy::ExponentialBackoff => {
                let factor = u32::try_from(attempt - 1)
                    .ok()
                    .and_then(|exp| 2u64.checked_pow(exp))
                    .unwrap_or(u64::MAX);
                scale(base_delay, factor)
            }
            RetryStrategy::FibonacciBackoff => {
                let mut prev: u64 = 1;
                let mut curr: u64 = 1;
                for _ in 2..attempt {
                    let next = prev.saturating_add(curr);
                    prev = curr;
                    curr = next;
                    if curr == u64::MAX {
                        break;
                    }
                }
                scale(base_delay, curr)
            }
        }
    }
}

fn scale(base_delay: Duration, factor: u64) -> Duration {
    match u32::try_from(factor) {
        Ok(factor) => base_delay.saturating_mul(factor),
        Err(_) if base_delay.is_zero() => Duration::ZERO,
        Err(_) => Duration::MAX,
    }
}
