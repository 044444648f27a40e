//! The external `Peer`/`PeerIdentifier` contracts this crate selects over.
//!
//! Neither type is implemented here: the transport (an external collaborator,
//! see the crate's top-level docs) owns the concrete peer type and hands it
//! to [`crate::PeerList`] through [`crate::Transport::retain_peer`].

use std::fmt;

/// A value that identifies a peer. Two identifiers are equal iff their
/// [`identifier`](PeerIdentifier::identifier) strings are equal.
pub trait PeerIdentifier: fmt::Debug + Send + Sync {
    /// The stable string identifying this peer, e.g. a `host:port` address.
    fn identifier(&self) -> String;
}

/// A remote endpoint retained by the transport.
pub trait Peer: fmt::Debug + Send + Sync {
    /// A snapshot of the peer's current connection state and load.
    fn status(&self) -> PeerStatus;
}

/// A peer's connection state, as observed by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The peer has an established connection and can accept requests.
    Available,
    /// The peer is in the process of connecting.
    Connecting,
    /// The peer has no usable connection.
    Unavailable,
}

/// A peer's connection state plus its current in-flight request count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerStatus {
    /// The peer's current connection state.
    pub connection_status: ConnectionStatus,
    /// The number of requests currently outstanding on this peer.
    pub pending_request_count: u32,
}

/// An opaque per-request payload. This core does not inspect it; it exists
/// only so that `choose` has the same shape the dispatch pipeline expects.
#[derive(Debug, Default, Clone, Copy)]
pub struct Request;

impl PeerIdentifier for String {
    fn identifier(&self) -> String {
        self.clone()
    }
}
