//! The external `Transport` contract.
//!
//! The transport is responsible for establishing connections and reporting
//! connection status; this crate only retains and releases peers through it
//! and subscribes to its status notifications. `retain_peer`/`release_peer`
//! are called while [`crate::PeerList`]'s internal mutex is held, so the
//! transport contract requires them to be non-blocking (see `DESIGN.md`).

use std::sync::Arc;

use crate::error::BoxError;
use crate::peer::{Peer, PeerIdentifier};

/// Receives status-changed notifications for a single retained peer.
pub trait Subscriber: Send + Sync {
    /// Called by the transport whenever the named peer's status may have
    /// changed. A subscriber whose peer has since been released ignores
    /// this call.
    fn notify_status_changed(&self, id: Arc<dyn PeerIdentifier>);
}

/// Establishes and tears down interest in a peer on behalf of a
/// [`crate::PeerList`].
pub trait Transport: Send + Sync {
    /// Registers interest in `id`, returning the live [`Peer`] handle.
    /// `subscriber` receives status-changed notifications for as long as the
    /// peer stays retained.
    fn retain_peer(
        &self,
        id: Arc<dyn PeerIdentifier>,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<Arc<dyn Peer>, BoxError>;

    /// Releases a previously retained peer.
    fn release_peer(
        &self,
        id: Arc<dyn PeerIdentifier>,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<(), BoxError>;
}
