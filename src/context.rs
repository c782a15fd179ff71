use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Reason a [`Context`] is done.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation and deadline scope for a call.
///
/// Contexts form a tree: cancelling a parent cancels every context derived
/// from it, and a derived deadline is never later than the parent's.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

/// Releases a derived [`Context`].
///
/// Dropping the guard cancels the context it was returned with, so keep it
/// alive for as long as the context is in use.
#[must_use = "dropping the guard cancels the derived context immediately"]
#[derive(Debug)]
pub struct CancelGuard {
    _guard: DropGuard,
}

impl CancelGuard {
    /// Cancels the derived context now.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context that can be cancelled through the returned guard.
    pub fn with_cancel(&self) -> (Self, CancelGuard) {
        self.derive(self.deadline)
    }

    /// Derives a context that expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> (Self, CancelGuard) {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a context that expires at `deadline`, or at the parent's
    /// deadline if that comes first.
    pub fn with_deadline(&self, deadline: Instant) -> (Self, CancelGuard) {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        self.derive(Some(deadline))
    }

    fn derive(&self, deadline: Option<Instant>) -> (Self, CancelGuard) {
        let token = self.token.child_token();
        let guard = CancelGuard {
            _guard: token.clone().drop_guard(),
        };
        (Self { token, deadline }, guard)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Completes once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => ContextError::Canceled,
                _ = sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
        }
    }
}
