//! A heap-based, load-aware peer list for an RPC client's outbound path.
//!
//! [`PeerList`] owns a dynamic set of peers supplied by an external
//! [`Transport`] and hands out the least-loaded `Available` one on each
//! [`PeerList::choose`] call, rotating fairly among peers tied on load. See
//! `DESIGN.md` for the concurrency and lifecycle contract.

pub mod context;
pub mod error;
mod heap;
mod lifecycle;
pub mod list;
pub mod peer;
mod scored_peer;
pub mod transport;

pub use context::Context;
pub use error::{BoxError, CompositeError, Error, Result};
pub use list::{Finish, PeerList};
pub use peer::{ConnectionStatus, Peer, PeerIdentifier, PeerStatus, Request};
pub use transport::{Subscriber, Transport};
