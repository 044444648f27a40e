//! A minimal stand-in for a Go-style `context.Context`: a deadline plus a
//! cancellation signal. `choose` requires a deadline up front so that a
//! misconfigured membership (no peers ever becoming available) cannot hang
//! a caller forever.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// Carries the deadline and cancellation signal for a single `choose` call.
#[derive(Clone)]
pub struct Context {
    deadline: Option<Instant>,
    cancellation: CancellationToken,
}

impl Context {
    /// A context with no deadline and no way to cancel it. `choose` rejects
    /// this with [`Error::NoDeadline`]; it exists for callers building up a
    /// context before attaching a deadline.
    pub fn background() -> Self {
        Context {
            deadline: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Context {
            deadline: Some(deadline),
            cancellation: CancellationToken::new(),
        }
    }

    /// A context that expires after `timeout` elapses.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// The context's deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The token that explicit cancellation is signalled through. Cloning a
    /// [`Context`] shares the same underlying token.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Cancels this context (and every clone of it).
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Resolves once the context is done, returning the error that
    /// `choose` should surface: [`Error::DeadlineExceeded`] if the deadline
    /// elapsed first, [`Error::Cancelled`] if cancellation happened first or
    /// the context has no deadline at all.
    pub async fn cancelled(&self) -> Error {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline.into()) => Error::DeadlineExceeded,
                    _ = self.cancellation.cancelled() => Error::Cancelled,
                }
            }
            None => {
                self.cancellation.cancelled().await;
                Error::Cancelled
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
