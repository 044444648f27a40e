//! Per-peer bookkeeping: the current status/score pair, the peer's position
//! in [`crate::heap::ScoreHeap`], and the subscriber handed to the transport.

use std::sync::Arc;

use crate::error::BoxError;
use crate::peer::{ConnectionStatus, Peer, PeerIdentifier, PeerStatus};
use crate::transport::Subscriber;

/// Large enough that any `Available` peer outranks every non-`Available`
/// peer regardless of pending count.
pub(crate) const UNAVAILABLE_PENALTY: u64 = i32::MAX as u64;

/// Lower is better: pending request count, plus a penalty if the peer isn't
/// `Available`.
pub(crate) fn score_for(status: PeerStatus) -> u64 {
    let mut score = status.pending_request_count as u64;
    if status.connection_status != ConnectionStatus::Available {
        score += UNAVAILABLE_PENALTY;
    }
    score
}

/// A single retained peer's record.
///
/// `heap_index` and `insertion_seq` are maintained exclusively by
/// [`crate::heap::ScoreHeap`]; nothing outside that module should write to
/// them directly.
pub(crate) struct ScoredPeer {
    pub(crate) peer: Arc<dyn Peer>,
    pub(crate) id: Arc<dyn PeerIdentifier>,
    /// The subscriber handed to the transport at retention time. Reused
    /// (not recreated) when releasing, since the transport contract pairs
    /// `retain_peer`/`release_peer` calls by the same subscriber.
    pub(crate) subscription: Arc<dyn Subscriber>,
    pub(crate) status: PeerStatus,
    pub(crate) score: u64,
    pub(crate) heap_index: Option<usize>,
    pub(crate) insertion_seq: u64,
    /// Assigned once at retention time, distinct from `insertion_seq`.
    /// Lets a released peer's subscriber recognize that it no longer
    /// corresponds to the live entry for its identifier, even if that
    /// identifier has since been retained again. See `DESIGN.md`.
    pub(crate) generation: u64,
}

impl ScoredPeer {
    pub(crate) fn new(
        peer: Arc<dyn Peer>,
        id: Arc<dyn PeerIdentifier>,
        subscription: Arc<dyn Subscriber>,
        generation: u64,
    ) -> Self {
        let status = peer.status();
        let score = score_for(status);
        ScoredPeer {
            peer,
            id,
            subscription,
            status,
            score,
            heap_index: None,
            insertion_seq: 0,
            generation,
        }
    }

    /// Re-reads the peer's status, updating `status` and `score` in place.
    /// Returns whether anything actually changed, so callers can skip the
    /// re-sift and notification when a status callback is a no-op.
    pub(crate) fn refresh(&mut self) -> bool {
        let status = self.peer.status();
        if status == self.status {
            return false;
        }
        self.status = status;
        self.score = score_for(status);
        true
    }
}

/// The reserved hook for request completion.
///
/// The design permits recomputing the score on `finish` in anticipation of
/// the pending-count decrement, but the minimal correct implementation is a
/// no-op: the transport's subsequent status notification re-scores the
/// peer. This crate takes that option; see `DESIGN.md` for the rationale.
pub(crate) fn on_finish(_err: Option<BoxError>) {}
