//! The error vocabulary surfaced by this crate.

use std::fmt;

/// A type-erased error returned by the transport or another external
/// collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`crate::PeerList`].
///
/// These fall into the three categories described by the design: programmer
/// or configuration errors that are never retried, transport errors that are
/// returned verbatim, and contextual cancellation.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// `Choose` was called before `Start`, or after `Stop`.
    #[error("peer list is not running")]
    NotStarted,

    /// `Start` was called on a peer list that is already running.
    #[error("peer list was already started")]
    AlreadyStarted,

    /// `Start` or `Stop` was called on a peer list that has already stopped.
    #[error("peer list was already stopped")]
    AlreadyStopped,

    /// `Choose` was called with a [`crate::Context`] that carries no deadline.
    #[error("choose requires a context with a deadline")]
    NoDeadline,

    /// `Update` tried to add an identifier that is already present.
    #[error("peer {0:?} is already present in the peer list")]
    AddAlreadyPresent(String),

    /// `Update` tried to remove an identifier that is not present.
    #[error("peer {0:?} is not present in the peer list")]
    RemoveNotPresent(String),

    /// The context's deadline elapsed while `Choose` was waiting for a peer.
    #[error("deadline exceeded while waiting for an available peer")]
    DeadlineExceeded,

    /// The context was cancelled while `Choose` was waiting for a peer.
    #[error("context cancelled while waiting for an available peer")]
    Cancelled,

    /// An error returned verbatim from the transport's `retain_peer` or
    /// `release_peer`.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// An aggregation of per-item failures from a batched `Update` or from
    /// `Stop` releasing every retained peer. A partial failure never
    /// suppresses the rest of the batch.
    #[error("{0}")]
    Composite(CompositeError),
}

impl Error {
    /// Builds a [`Error::Composite`] from a non-empty list of errors,
    /// or `Ok(())` if the list is empty.
    pub(crate) fn from_batch(errors: Vec<Error>) -> Result<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Composite(CompositeError(errors)))
        }
    }
}

/// The aggregated form of a batched operation's failures.
///
/// Mirrors the upstream Go source's `yerrors.MultiError`: every failure in
/// the batch is preserved, not just the first one.
#[derive(Debug)]
pub struct CompositeError(pub Vec<Error>);

impl CompositeError {
    /// The individual errors that make up this aggregate, in the order they
    /// occurred.
    pub fn errors(&self) -> &[Error] {
        &self.0
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) occurred", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            write!(f, "; [{i}] {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompositeError {}
