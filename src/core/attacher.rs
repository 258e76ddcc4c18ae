//! Cancellation composition handed to each executing unit.
//!
//! A unit runs on behalf of a worker but usually also belongs to some outer
//! scope of its own (an inbound event's deadline, a shutdown signal for one
//! conversation). [`Attacher::attach`] derives a [`Context`] that ends as soon
//! as either the worker's context or that outer scope ends.

#[cfg(test)]
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::context::earliest;
use super::Context;

/// Derives contexts bound to both the worker's lifetime and a caller scope.
#[derive(Debug, Clone)]
pub struct Attacher {
    worker_ctx: Context,
}

impl Attacher {
    pub(crate) const fn new(worker_ctx: Context) -> Self {
        Self { worker_ctx }
    }

    /// The executing worker's context.
    #[must_use]
    pub const fn worker_context(&self) -> &Context {
        &self.worker_ctx
    }

    /// Derive a context that ends when the worker's context or `ctx` ends.
    ///
    /// The returned guard must be kept alive for as long as the derived
    /// context is in use; dropping it (or calling [`AttachGuard::release`])
    /// cancels the derived context and stops the task linking it to `ctx`.
    /// When `ctx` can never end, the worker's context is handed back as is
    /// and no linking task is spawned.
    ///
    /// # Panics
    ///
    /// Panics outside a tokio runtime when `ctx` carries a cancellation token.
    #[must_use]
    pub fn attach(&self, ctx: &Context) -> (Context, AttachGuard) {
        if !ctx.is_cancellable() {
            return (self.worker_ctx.clone(), AttachGuard::inert());
        }

        let token = self
            .worker_ctx
            .token()
            .map_or_else(CancellationToken::new, CancellationToken::child_token);
        let deadline = earliest(self.worker_ctx.deadline(), ctx.deadline());

        let linker = match ctx.token() {
            Some(outer) if outer.is_cancelled() => {
                token.cancel();
                None
            }
            Some(outer) => {
                let outer = outer.clone();
                let linked = token.clone();
                Some(tokio::spawn(async move {
                    tokio::select! {
                        () = outer.cancelled() => linked.cancel(),
                        () = linked.cancelled() => {}
                    }
                }))
            }
            None => None,
        };

        let guard = AttachGuard {
            _guard: Some(token.clone().drop_guard()),
            #[cfg(test)]
            linker,
        };
        #[cfg(not(test))]
        drop(linker);
        (Context::from_parts(Some(token), deadline), guard)
    }
}

/// Release handle for a context produced by [`Attacher::attach`].
#[derive(Debug)]
#[must_use = "dropping the guard cancels the derived context"]
pub struct AttachGuard {
    _guard: Option<DropGuard>,
    #[cfg(test)]
    linker: Option<JoinHandle<()>>,
}

impl AttachGuard {
    const fn inert() -> Self {
        Self {
            _guard: None,
            #[cfg(test)]
            linker: None,
        }
    }

    #[cfg(test)]
    fn take_linker(&mut self) -> Option<JoinHandle<()>> {
        self.linker.take()
    }

    /// Cancel the derived context now.
    pub fn release(self) {
        drop(self);
    }
}
