use async_std::channel::{Receiver, Sender, bounded};

/// A cloneable signal used to abort a retry loop early.
///
/// All clones observe the same state: once any clone calls [`cancel`](Self::cancel),
/// every clone reports [`is_cancelled`](Self::is_cancelled) and every pending
/// [`cancelled`](Self::cancelled) future resolves.
///
/// Cancellation is checked before each attempt and before each backoff pause.
/// An attempt that is already running is never interrupted.
///
/// # Example
/// ```
/// use retry_executor::cancellation::CancellationToken;
///
/// let token = CancellationToken::new();
/// let request_scope = token.clone();
/// assert!(!token.is_cancelled());
///
/// request_scope.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Sender<()>,
    receiver: Receiver<()>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        let (sender, receiver) = bounded(1);
        CancellationToken { sender, receiver }
    }

    /// Requests cancellation. Calling it more than once has no further effect.
    pub fn cancel(&self) {
        self.sender.close();
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.sender.is_closed()
    }

    /// Resolves once the token is cancelled.
    ///
    /// Nothing is ever sent on the underlying channel, so `recv` only returns
    /// when the channel is closed.
    pub async fn cancelled(&self) {
        while self.receiver.recv().await.is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_std::future::timeout;
    use async_std::task::{block_on, sleep, spawn};
    use std::time::Duration;

    #[test]
    fn test_new_token_is_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_is_visible_to_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();

        clone.cancel();
        clone.cancel();

        assert!(token.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_cancelled_resolves_after_cancel() {
        let token = CancellationToken::new();
        let canceller = token.clone();

        let result = block_on(async move {
            spawn(async move {
                sleep(Duration::from_millis(20)).await;
                canceller.cancel();
            });
            timeout(Duration::from_secs(2), token.cancelled()).await
        });

        assert!(result.is_ok());
    }

    #[test]
    fn test_cancelled_pending_while_active() {
        let token = CancellationToken::new();

        let result = block_on(timeout(Duration::from_millis(30), token.cancelled()));

        assert!(result.is_err());
    }
}
