//! State of one inproc socket.
//!
//! Messages travel between sockets as whole multipart messages
//! (`Vec<Bytes>`), so a receiver never sees parts of two messages
//! interleaved. Parts sent with `SNDMORE` are staged in `pending` and only
//! handed to a peer when the final part arrives.

use crate::options::OptionStore;
use bytes::Bytes;
use flume::{Receiver, Sender};
use hashbrown::HashSet;
use parking_lot::Mutex;
use std::collections::VecDeque;
use zocket_core::monitor::EventMask;
use zocket_core::socket_type::SocketType;

/// Message type for inproc transport (multipart message)
pub type InprocMessage = Vec<Bytes>;

/// One link to another socket.
#[derive(Debug, Clone)]
pub struct Peer {
    /// Handle of the socket on the other end
    pub handle: usize,
    /// Endpoint the link was made through
    pub endpoint: String,
    /// Inbox of the socket on the other end
    pub tx: Sender<InprocMessage>,
}

/// Where a monitored socket publishes its events.
#[derive(Debug, Clone, Copy)]
pub struct MonitorSink {
    /// Handle of the internal PAIR socket bound to the monitor endpoint
    pub handle: usize,
    /// Events to publish
    pub events: EventMask,
}

/// A socket owned by the engine's handle table.
#[derive(Debug)]
pub struct SocketCell {
    pub kind: SocketType,
    pub inbox_tx: Sender<InprocMessage>,
    pub inbox_rx: Receiver<InprocMessage>,
    pub state: Mutex<SocketState>,
}

impl SocketCell {
    pub fn new(kind: SocketType) -> Self {
        let (inbox_tx, inbox_rx) = flume::unbounded();
        Self {
            kind,
            inbox_tx,
            inbox_rx,
            state: Mutex::new(SocketState::new(kind)),
        }
    }

    /// Whether this socket type may send at all.
    pub fn can_send(&self) -> bool {
        !matches!(self.kind, SocketType::Sub | SocketType::Pull)
    }

    /// Whether this socket type may receive at all.
    pub fn can_recv(&self) -> bool {
        !matches!(self.kind, SocketType::Pub | SocketType::Push)
    }
}

/// Mutable part of a socket, guarded by the cell's mutex.
#[derive(Debug)]
pub struct SocketState {
    pub options: OptionStore,
    pub peers: Vec<Peer>,
    pub bound: Vec<String>,
    pub connected: Vec<String>,
    /// Parts of an outgoing message waiting for their final part
    pub pending: Vec<Bytes>,
    /// Complete messages waiting for a first peer
    pub outbox: VecDeque<InprocMessage>,
    /// Remaining parts of the message currently being received
    pub current: VecDeque<Bytes>,
    pub rcvmore: bool,
    pub next_peer: usize,
    pub monitor: Option<MonitorSink>,
    pub groups: HashSet<String>,
}

impl SocketState {
    fn new(kind: SocketType) -> Self {
        Self {
            options: OptionStore::new(kind),
            peers: Vec::new(),
            bound: Vec::new(),
            connected: Vec::new(),
            pending: Vec::new(),
            outbox: VecDeque::new(),
            current: VecDeque::new(),
            rcvmore: false,
            next_peer: 0,
            monitor: None,
            groups: HashSet::new(),
        }
    }

    /// Hand a complete message to peers.
    ///
    /// Broadcast types copy it to every peer and drop it when there are
    /// none; every other type picks one peer round-robin, or queues the
    /// message until the first peer arrives.
    pub fn dispatch(&mut self, kind: SocketType, msg: InprocMessage) {
        if kind.is_broadcast() {
            for peer in &self.peers {
                let _ = peer.tx.send(msg.clone());
            }
            return;
        }

        if self.peers.is_empty() {
            self.outbox.push_back(msg);
            return;
        }

        let idx = self.next_peer % self.peers.len();
        self.next_peer = self.next_peer.wrapping_add(1);
        let _ = self.peers[idx].tx.send(msg);
    }

    /// Link a new peer and flush anything queued while there was none.
    pub fn add_peer(&mut self, peer: Peer) {
        for msg in self.outbox.drain(..) {
            let _ = peer.tx.send(msg);
        }
        self.peers.push(peer);
    }

    /// Remove links matching `pred`, returning the removed peers.
    pub fn remove_peers(&mut self, pred: impl Fn(&Peer) -> bool) -> Vec<Peer> {
        let (removed, kept): (Vec<Peer>, Vec<Peer>) =
            self.peers.drain(..).partition(|p| pred(p));
        self.peers = kept;
        removed
    }

    /// Take the next part of the message in progress, if any.
    pub fn next_part(&mut self) -> Option<(Bytes, bool)> {
        let part = self.current.pop_front()?;
        self.rcvmore = !self.current.is_empty();
        Some((part, self.rcvmore))
    }

    /// Start reading a freshly received message and return its first part.
    pub fn begin_message(&mut self, msg: InprocMessage) -> (Bytes, bool) {
        self.current = msg.into();
        self.next_part().unwrap_or_else(|| {
            self.rcvmore = false;
            (Bytes::new(), false)
        })
    }
}
