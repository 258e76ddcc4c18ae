//! Cancellation and deadline scopes passed to queue operations.
//!
//! A [`Context`] combines an optional [`CancellationToken`] with an optional
//! deadline. Clones share the same token, so cancelling any clone ends all of
//! them. Children created with [`Context::child`] or [`Context::with_timeout`]
//! end when their parent ends, but cancelling a child leaves the parent alone.
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use keyed_work_queue::core::Context;
//!
//! let root = Context::new();
//! let ctx = root.with_timeout(Duration::from_millis(50));
//! let reason = ctx.done().await; // DeadlineExceeded, unless root is cancelled first
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::ContextError;

/// Cancellation scope with an optional deadline.
#[derive(Debug, Clone)]
pub struct Context {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that never ends.
    #[must_use]
    pub const fn background() -> Self {
        Self {
            token: None,
            deadline: None,
        }
    }

    /// A fresh cancellable root context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: Some(CancellationToken::new()),
            deadline: None,
        }
    }

    /// A cancellable child that ends with `self` or on its own `cancel`.
    #[must_use]
    pub fn child(&self) -> Self {
        let token = self
            .token
            .as_ref()
            .map_or_else(CancellationToken::new, CancellationToken::child_token);
        Self {
            token: Some(token),
            deadline: self.deadline,
        }
    }

    /// A child whose deadline is `timeout` from now (or the parent's, if earlier).
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// A child whose deadline is `deadline` (or the parent's, if earlier).
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.child();
        child.deadline = earliest(self.deadline, Some(deadline));
        child
    }

    /// Cancel this context and every child derived from it.
    ///
    /// No-op on [`Context::background`].
    pub fn cancel(&self) {
        if let Some(token) = &self.token {
            token.cancel();
        }
    }

    /// Deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// False only for contexts that can never end.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        self.token.is_some() || self.deadline.is_some()
    }

    /// Why the context has ended, or `None` while it is still live.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context ends.
    ///
    /// Never resolves for [`Context::background`].
    pub async fn done(&self) -> ContextError {
        if let Some(reason) = self.err() {
            return reason;
        }
        match (&self.token, self.deadline) {
            (None, None) => std::future::pending().await,
            (Some(token), None) => {
                token.cancelled().await;
                ContextError::Cancelled
            }
            (None, Some(deadline)) => {
                tokio::time::sleep_until(deadline).await;
                ContextError::DeadlineExceeded
            }
            (Some(token), Some(deadline)) => tokio::select! {
                () = token.cancelled() => ContextError::Cancelled,
                () = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
        }
    }

    pub(crate) const fn token(&self) -> Option<&CancellationToken> {
        self.token.as_ref()
    }

    pub(crate) const fn from_parts(token: Option<CancellationToken>, deadline: Option<Instant>) -> Self {
        Self { token, deadline }
    }
}

pub(crate) fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
