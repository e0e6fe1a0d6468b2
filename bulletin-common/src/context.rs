use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The operation was cancelled")]
pub struct Cancelled;

/// Cancellation scope handed to every storage operation.
///
/// Cancelling a context cancels every context derived from it with [`Context::child`].
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    #[must_use]
    pub fn child(&self) -> Self {
        Self::from_token(self.token.child_token())
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drives `future` until it completes or this context is cancelled.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }

        self.token.run_until_cancelled(future).await.ok_or(Cancelled)
    }
}
