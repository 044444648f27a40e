//! The peer list: owns membership and the concurrency envelope, and hands
//! out the least-loaded available peer on demand.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::{debug, info, trace, warn};

use crate::context::Context;
use crate::error::{BoxError, Error, Result};
use crate::heap::ScoreHeap;
use crate::lifecycle::LifecycleGate;
use crate::peer::{ConnectionStatus, Peer, PeerIdentifier, Request};
use crate::scored_peer::{on_finish, ScoredPeer};
use crate::transport::{Subscriber, Transport};

/// Run once a request completes. Reserved for anticipating a pending-count
/// decrement; the current implementation is a no-op (see `DESIGN.md`).
pub type Finish = Box<dyn FnOnce(Option<BoxError>) + Send + 'static>;

struct Inner {
    entries: HashMap<String, ScoredPeer>,
    heap: ScoreHeap,
    insertion_counter: u64,
    generation_counter: u64,
}

struct Shared {
    transport: Arc<dyn Transport>,
    inner: Mutex<Inner>,
    lifecycle: LifecycleGate,
    /// Single-slot, non-blocking: `notify_one` stores at most one permit
    /// when nobody is currently waiting, coalescing bursts of status
    /// changes into a single wakeup. Every waiter re-checks the heap after
    /// waking, so a coalesced or spurious wakeup is always safe.
    availability: Notify,
}

/// A dynamic set of peers with heap-based, load-aware selection.
///
/// See the crate-level documentation for the concurrency and lifecycle
/// contract. `PeerList` is cheap to clone (it's a handle around an `Arc`)
/// and every method is safe to call from multiple tasks concurrently.
#[derive(Clone)]
pub struct PeerList {
    shared: Arc<Shared>,
}

impl PeerList {
    /// Builds a new, not-yet-started peer list over `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        PeerList {
            shared: Arc::new(Shared {
                transport,
                inner: Mutex::new(Inner {
                    entries: HashMap::new(),
                    heap: ScoreHeap::new(),
                    insertion_counter: 0,
                    generation_counter: 0,
                }),
                lifecycle: LifecycleGate::new(),
                availability: Notify::new(),
            }),
        }
    }

    /// `true` iff the list is currently running (after `start`, before `stop`).
    pub fn is_running(&self) -> bool {
        self.shared.lifecycle.is_running()
    }

    /// Starts the list. Idempotency: a second call fails with
    /// [`Error::AlreadyStarted`].
    pub fn start(&self) -> Result<()> {
        self.shared.lifecycle.start(|| info!("peer list started"))
    }

    /// Stops the list, releasing every retained peer via the transport.
    /// Per-peer release failures are aggregated into a single
    /// [`Error::Composite`] without suppressing the rest. Subsequent
    /// `start`/`stop` calls fail with [`Error::AlreadyStopped`].
    pub fn stop(&self) -> Result<()> {
        self.shared.lifecycle.stop(|| {
            info!("peer list stopping, releasing all retained peers");
            let mut inner = self.shared.inner.lock().unwrap();
            let mut errors = Vec::new();
            while let Some(key) = inner.heap.peek().map(str::to_owned) {
                if let Err(err) = Self::release_locked(&self.shared, &mut inner, &key) {
                    errors.push(err);
                }
            }
            if !errors.is_empty() {
                warn!(count = errors.len(), "errors releasing peers on stop");
            }
            Error::from_batch(errors)
        })
    }

    /// Applies a batched membership delta atomically with respect to
    /// `choose`. Removals are processed before additions; every failure is
    /// aggregated rather than aborting the rest of the batch.
    pub fn update(
        &self,
        additions: Vec<Arc<dyn PeerIdentifier>>,
        removals: Vec<Arc<dyn PeerIdentifier>>,
    ) -> Result<()> {
        let mut errors = Vec::new();
        {
            let mut inner = self.shared.inner.lock().unwrap();
            for id in removals {
                let key = id.identifier();
                if let Err(err) = Self::release_locked(&self.shared, &mut inner, &key) {
                    errors.push(err);
                }
            }
            for id in additions {
                if let Err(err) = Self::retain_locked(&self.shared, &mut inner, id) {
                    errors.push(err);
                }
            }
        }
        if !errors.is_empty() {
            warn!(count = errors.len(), "errors applying peer list update");
        }
        Error::from_batch(errors)
    }

    /// Returns a peer suitable for one request, blocking until one is
    /// available or `ctx` expires/cancels.
    ///
    /// Requires `ctx` to carry a deadline ([`Error::NoDeadline`] otherwise):
    /// an unbounded wait would mask a misconfigured membership where no
    /// peer ever becomes available.
    pub async fn choose(&self, ctx: &Context, _request: &Request) -> Result<(Arc<dyn Peer>, Finish)> {
        if !self.is_running() {
            return Err(Error::NotStarted);
        }
        if ctx.deadline().is_none() {
            return Err(Error::NoDeadline);
        }
        loop {
            if let Some(chosen) = self.try_choose() {
                return Ok(chosen);
            }
            metrics::counter!("peer_list.choose_waits").increment(1);
            tokio::select! {
                () = self.shared.availability.notified() => {
                    trace!("choose woken by availability signal");
                }
                err = ctx.cancelled() => {
                    return Err(err);
                }
            }
        }
    }

    /// Called by the transport when a peer's status may have changed.
    /// Looks up the entry by identifier and, if still present, re-scores
    /// and re-sifts it.
    pub fn notify_status_changed(&self, id: &Arc<dyn PeerIdentifier>) {
        let key = id.identifier();
        let mut inner = self.shared.inner.lock().unwrap();
        Self::refresh_locked(&self.shared, &mut inner, &key);
    }

    /// Pops the heap's root and immediately re-pushes it with a fresh
    /// insertion sequence, which is what gives round-robin fairness among
    /// equal-score peers (the popped entry falls to the back of its tie
    /// class). Returns `Some` only if the popped entry is `Available`.
    fn try_choose(&self) -> Option<(Arc<dyn Peer>, Finish)> {
        let mut guard = self.shared.inner.lock().unwrap();
        let Inner {
            heap,
            entries,
            insertion_counter,
            ..
        } = &mut *guard;

        let key = heap.pop(entries)?;
        heap.push(key.clone(), insertion_counter, entries);
        let entry = entries.get(&key).expect("just re-pushed");

        if entry.status.connection_status != ConnectionStatus::Available {
            return None;
        }
        let peer = Arc::clone(&entry.peer);
        drop(guard);

        // Re-notify so other waiters see the pool is non-empty; a spurious
        // wakeup elsewhere just re-checks the heap.
        self.shared.availability.notify_one();
        metrics::counter!("peer_list.choose_hits").increment(1);

        let finish: Finish = Box::new(on_finish);
        Some((peer, finish))
    }

    fn retain_locked(shared: &Arc<Shared>, inner: &mut Inner, id: Arc<dyn PeerIdentifier>) -> Result<()> {
        let key = id.identifier();
        if inner.entries.contains_key(&key) {
            return Err(Error::AddAlreadyPresent(key));
        }

        inner.generation_counter += 1;
        let generation = inner.generation_counter;
        let subscription: Arc<dyn Subscriber> = Arc::new(PeerSubscription {
            id: Arc::clone(&id),
            shared: Arc::clone(shared),
            generation,
        });

        let peer = shared
            .transport
            .retain_peer(Arc::clone(&id), Arc::clone(&subscription))
            .map_err(Error::Transport)?;
        trace!(peer = %key, "retained peer");

        let entry = ScoredPeer::new(peer, id, subscription, generation);
        let available = entry.status.connection_status == ConnectionStatus::Available;

        let Inner {
            entries,
            heap,
            insertion_counter,
            ..
        } = inner;
        entries.insert(key.clone(), entry);
        heap.push(key, insertion_counter, entries);

        if available {
            shared.availability.notify_one();
        }
        metrics::gauge!("peer_list.peers").set(entries.len() as f64);
        metrics::counter!("peer_list.peers_retained").increment(1);
        Ok(())
    }

    fn release_locked(shared: &Arc<Shared>, inner: &mut Inner, key: &str) -> Result<()> {
        if !inner.entries.contains_key(key) {
            return Err(Error::RemoveNotPresent(key.to_string()));
        }
        debug_assert!(
            inner.heap.validate(key, &inner.entries),
            "heap and entries map disagree about {key}'s position"
        );

        let entry = inner.entries.remove(key).expect("presence checked above");
        if let Some(index) = entry.heap_index {
            inner.heap.delete_at(index, &mut inner.entries);
        }
        trace!(peer = %key, "releasing peer");

        let result = shared
            .transport
            .release_peer(Arc::clone(&entry.id), Arc::clone(&entry.subscription))
            .map_err(Error::Transport);

        metrics::gauge!("peer_list.peers").set(inner.entries.len() as f64);
        metrics::counter!("peer_list.peers_released").increment(1);
        result
    }

    fn refresh_locked(shared: &Arc<Shared>, inner: &mut Inner, key: &str) {
        let Some(entry) = inner.entries.get_mut(key) else {
            return;
        };
        if !entry.refresh() {
            return;
        }
        let available = entry.status.connection_status == ConnectionStatus::Available;
        let score = entry.score;
        let index = entry.heap_index;
        debug!(peer = %key, score, "peer rescored");

        if let Some(index) = index {
            inner.heap.update_at(index, &mut inner.entries);
        }
        if available {
            shared.availability.notify_one();
        }
    }
}

/// The `Subscriber` handed to the transport for a single retained peer.
///
/// Bound to the `generation` the entry had at retention time: once the
/// entry is released (and, in the map, possibly replaced by a fresh
/// retention of the same identifier), this subscriber's callbacks become
/// permanently inert. This is the Rust-idiomatic substitute for the
/// upstream Go source's trick of nil-ing out a pointer on release; see
/// `DESIGN.md`.
struct PeerSubscription {
    id: Arc<dyn PeerIdentifier>,
    shared: Arc<Shared>,
    generation: u64,
}

impl Subscriber for PeerSubscription {
    fn notify_status_changed(&self, _id: Arc<dyn PeerIdentifier>) {
        let key = self.id.identifier();
        let mut inner = self.shared.inner.lock().unwrap();
        match inner.entries.get(&key) {
            Some(entry) if entry.generation == self.generation => {}
            _ => return,
        }
        PeerList::refresh_locked(&self.shared, &mut inner, &key);
    }
}
