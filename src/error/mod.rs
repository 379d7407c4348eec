use thiserror::Error;

/// Outcome of a failed cancellable retry.
///
/// Returned only by the `retry_with_cancellation` entry points. Plain `retry`
/// hands back the operation's own error type untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The last attempt failed and no more attempts are allowed, or the retry
    /// condition rejected the error. The error is the one produced by that
    /// attempt, unchanged.
    #[error(transparent)]
    Operation(E),

    /// Cancellation was requested before the operation succeeded.
    #[error("retry cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Attempts made before cancellation was observed.
        attempts: usize,
    },
}

impl<E> RetryError<E> {
    /// Returns `true` if the retry loop stopped because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    /// Returns the operation's error, or `None` if the loop was cancelled.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            RetryError::Operation(err) => Some(err),
            RetryError::Cancelled { .. } => None,
        }
    }
}
