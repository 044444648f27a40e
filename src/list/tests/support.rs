//! A mock transport and peer used by this module's unit and property tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::BoxError;
use crate::peer::{ConnectionStatus, Peer, PeerIdentifier, PeerStatus};
use crate::transport::{Subscriber, Transport};

/// A test peer whose status can be flipped by the test, and which keeps the
/// subscriber handed to it at retention time so the test can push
/// notifications on the peer's behalf.
pub(crate) struct TestPeer {
    status: Mutex<PeerStatus>,
}

impl TestPeer {
    pub(crate) fn new(status: PeerStatus) -> Arc<Self> {
        Arc::new(TestPeer {
            status: Mutex::new(status),
        })
    }

    pub(crate) fn set_status(&self, status: PeerStatus) {
        *self.status.lock().unwrap() = status;
    }
}

impl std::fmt::Debug for TestPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestPeer").field("status", &*self.status.lock().unwrap()).finish()
    }
}

impl Peer for TestPeer {
    fn status(&self) -> PeerStatus {
        *self.status.lock().unwrap()
    }
}

pub(crate) fn available(pending: u32) -> PeerStatus {
    PeerStatus {
        connection_status: ConnectionStatus::Available,
        pending_request_count: pending,
    }
}

pub(crate) fn connecting() -> PeerStatus {
    PeerStatus {
        connection_status: ConnectionStatus::Connecting,
        pending_request_count: 0,
    }
}

pub(crate) fn unavailable(pending: u32) -> PeerStatus {
    PeerStatus {
        connection_status: ConnectionStatus::Unavailable,
        pending_request_count: pending,
    }
}

/// A transport backed by a fixed map of peers, keyed by identifier. Records
/// every retain/release call (including the subscriber, so tests can drive
/// `notify_status_changed` through it) and can be told to fail a specific
/// identifier's retain.
pub(crate) struct MockTransport {
    peers: Mutex<std::collections::HashMap<String, Arc<TestPeer>>>,
    retained: Mutex<Vec<String>>,
    released: Mutex<Vec<String>>,
    fail_retain: Mutex<HashSet<String>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(MockTransport {
            peers: Mutex::new(std::collections::HashMap::new()),
            retained: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
            fail_retain: Mutex::new(HashSet::new()),
        })
    }

    pub(crate) fn register(&self, id: &str, peer: Arc<TestPeer>) {
        self.peers.lock().unwrap().insert(id.to_string(), peer);
    }

    pub(crate) fn fail_retain(&self, id: &str) {
        self.fail_retain.lock().unwrap().insert(id.to_string());
    }

    pub(crate) fn retained(&self) -> Vec<String> {
        self.retained.lock().unwrap().clone()
    }

    pub(crate) fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn retain_peer(
        &self,
        id: Arc<dyn PeerIdentifier>,
        _subscriber: Arc<dyn Subscriber>,
    ) -> Result<Arc<dyn Peer>, BoxError> {
        let key = id.identifier();
        if self.fail_retain.lock().unwrap().contains(&key) {
            return Err(format!("refusing to retain {key}").into());
        }
        let peer = self
            .peers
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| TestPeer::new(available(0)));
        self.retained.lock().unwrap().push(key);
        Ok(peer as Arc<dyn Peer>)
    }

    fn release_peer(&self, id: Arc<dyn PeerIdentifier>, _subscriber: Arc<dyn Subscriber>) -> Result<(), BoxError> {
        self.released.lock().unwrap().push(id.identifier());
        Ok(())
    }
}

pub(crate) fn id(s: &str) -> Arc<dyn PeerIdentifier> {
    Arc::new(s.to_string())
}
