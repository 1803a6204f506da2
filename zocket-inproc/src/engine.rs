//! The inproc engine.
//!
//! Sockets live in a handle table owned by the engine; a handle is a plain
//! counter wrapped in a [`RawSocket`]. Endpoints are per-engine, the same
//! way libzmq scopes `inproc://` names to one context.
//!
//! Locking: every socket has its own mutex and no call holds two of them at
//! once. Monitor events are published after the monitored socket's lock is
//! released.

use crate::curve;
use crate::socket::{InprocMessage, MonitorSink, Peer, SocketCell};
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use zocket_core::endpoint::Endpoint;
use zocket_core::errno;
use zocket_core::error::TransportError;
use zocket_core::flags::Flags;
use zocket_core::monitor::{EventMask, MonitorEvent, SocketEvent};
use zocket_core::option::{encode_value, SocketOption};
use zocket_core::socket_type::SocketType;
use zocket_core::transport::{CurveKeyPair, Frame, RawSocket, Transport, TransportResult};

/// Longest group name accepted by `join`.
pub const MAX_GROUP_LENGTH: usize = 255;

const POLLIN: i32 = 1;
const POLLOUT: i32 = 2;

/// In-process transport engine.
///
/// Supports the `inproc://` transport only; binding or connecting any other
/// scheme fails with `EPROTONOSUPPORT`. Connecting requires the endpoint to
/// be bound already (`ECONNREFUSED` otherwise).
#[derive(Debug)]
pub struct InprocEngine {
    next_handle: AtomicUsize,
    sockets: DashMap<usize, Arc<SocketCell>>,
    endpoints: DashMap<String, usize>,
}

impl Default for InprocEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InprocEngine {
    /// Create an engine with no sockets.
    pub fn new() -> Self {
        Self {
            next_handle: AtomicUsize::new(1),
            sockets: DashMap::new(),
            endpoints: DashMap::new(),
        }
    }

    /// Number of open sockets, including internal monitor sockets.
    pub fn socket_count(&self) -> usize {
        self.sockets.len()
    }

    fn cell(&self, socket: RawSocket) -> TransportResult<Arc<SocketCell>> {
        self.cell_by(socket.get())
            .ok_or_else(TransportError::not_socket)
    }

    fn cell_by(&self, handle: usize) -> Option<Arc<SocketCell>> {
        self.sockets.get(&handle).map(|c| Arc::clone(c.value()))
    }

    fn allocate(&self, kind: SocketType) -> RawSocket {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.sockets.insert(handle, Arc::new(SocketCell::new(kind)));
        // Counter starts at 1, so the handle is never null
        RawSocket::from_usize(handle).unwrap_or_else(|| unreachable!("handle counter wrapped"))
    }

    /// Canonical form and inproc name of an endpoint string.
    fn resolve(endpoint: &str) -> TransportResult<(String, String)> {
        let parsed = Endpoint::parse(endpoint)?;
        match parsed.inproc_name() {
            Some(name) => Ok((parsed.to_string(), name.to_string())),
            None => Err(TransportError::new(
                errno::EPROTONOSUPPORT,
                format!(
                    "{} transport is not available in the inproc engine",
                    parsed.scheme.as_str()
                ),
            )),
        }
    }

    fn emit(&self, handle: usize, event: SocketEvent, endpoint: &str) {
        let Some(cell) = self.cell_by(handle) else {
            return;
        };
        let sink = cell.state.lock().monitor;
        if let Some(sink) = sink {
            self.publish(sink, event, endpoint);
        }
    }

    fn publish(&self, sink: MonitorSink, event: SocketEvent, endpoint: &str) {
        if !sink.events.selects(event) {
            return;
        }
        let Some(monitor) = self.cell_by(sink.handle) else {
            return;
        };
        let msg: InprocMessage = MonitorEvent::new(event, 0, endpoint).to_frames().to_vec();
        trace!("[INPROC] monitor {} <- {}", sink.handle, event);
        monitor.state.lock().dispatch(SocketType::Pair, msg);
    }

    fn stop_monitor(&self, sink: MonitorSink) {
        self.publish(sink, SocketEvent::MonitorStopped, "");
        if let Some(raw) = RawSocket::from_usize(sink.handle) {
            let _ = self.close(raw);
        }
    }

    /// Drop the reverse link held by `peer` towards `handle`.
    fn unlink(&self, peer: &Peer, handle: usize) {
        if let Some(cell) = self.cell_by(peer.handle) {
            let mut state = cell.state.lock();
            state.remove_peers(|q| q.handle == handle && q.endpoint == peer.endpoint);
            if !state.peers.iter().any(|q| q.endpoint == peer.endpoint) {
                state.connected.retain(|ep| ep != &peer.endpoint);
            }
        }
        self.emit(peer.handle, SocketEvent::Disconnected, &peer.endpoint);
    }

    fn write_fixed(option: SocketOption, value: &[u8], buf: &mut [u8]) -> TransportResult<usize> {
        if buf.len() != value.len() {
            return Err(TransportError::invalid(format!(
                "{option} needs a {}-byte buffer, got {}",
                value.len(),
                buf.len()
            )));
        }
        buf.copy_from_slice(value);
        Ok(value.len())
    }
}

impl Transport for InprocEngine {
    fn name(&self) -> &'static str {
        "inproc"
    }

    fn socket(&self, kind: SocketType) -> TransportResult<RawSocket> {
        let raw = self.allocate(kind);
        debug!("[INPROC] Created {} socket {}", kind, raw);
        Ok(raw)
    }

    fn close(&self, socket: RawSocket) -> TransportResult<()> {
        let handle = socket.get();
        let (_, cell) = self
            .sockets
            .remove(&handle)
            .ok_or_else(TransportError::not_socket)?;

        let (bound, peers, monitor) = {
            let mut state = cell.state.lock();
            (
                std::mem::take(&mut state.bound),
                std::mem::take(&mut state.peers),
                state.monitor.take(),
            )
        };

        for endpoint in &bound {
            if let Ok((_, name)) = Self::resolve(endpoint) {
                self.endpoints.remove_if(&name, |_, owner| *owner == handle);
            }
        }
        for peer in &peers {
            self.unlink(peer, handle);
        }
        if let Some(sink) = monitor {
            self.publish(sink, SocketEvent::Closed, "");
            self.stop_monitor(sink);
        }

        debug!("[INPROC] Closed {} socket {}", cell.kind, socket);
        Ok(())
    }

    fn connect(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        let cell = self.cell(socket)?;
        let (endpoint, name) = Self::resolve(endpoint)?;

        let target_handle = self
            .endpoints
            .get(&name)
            .map(|h| *h.value())
            .ok_or_else(|| TransportError::from_code(errno::ECONNREFUSED))?;
        if target_handle == socket.get() {
            return Err(TransportError::invalid("socket cannot connect to itself"));
        }
        let target = self
            .cell_by(target_handle)
            .ok_or_else(|| TransportError::from_code(errno::ECONNREFUSED))?;
        if !cell.kind.is_compatible(target.kind) {
            return Err(TransportError::new(
                errno::ENOCOMPATPROTO,
                format!("{} cannot talk to {}", cell.kind, target.kind),
            ));
        }

        {
            let mut state = cell.state.lock();
            state.connected.push(endpoint.clone());
            state.add_peer(Peer {
                handle: target_handle,
                endpoint: endpoint.clone(),
                tx: target.inbox_tx.clone(),
            });
        }
        target.state.lock().add_peer(Peer {
            handle: socket.get(),
            endpoint: endpoint.clone(),
            tx: cell.inbox_tx.clone(),
        });

        debug!("[INPROC] {} connected to {}", socket, endpoint);
        self.emit(socket.get(), SocketEvent::Connected, &endpoint);
        self.emit(target_handle, SocketEvent::Accepted, &endpoint);
        Ok(())
    }

    fn disconnect(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        let cell = self.cell(socket)?;
        let (endpoint, _) = Self::resolve(endpoint)?;

        let dropped = {
            let mut state = cell.state.lock();
            if !state.connected.contains(&endpoint) {
                return Err(TransportError::new(
                    errno::ENOENT,
                    format!("not connected to {endpoint}"),
                ));
            }
            state.connected.retain(|ep| ep != &endpoint);
            state.remove_peers(|p| p.endpoint == endpoint)
        };
        for peer in &dropped {
            self.unlink(peer, socket.get());
        }

        debug!("[INPROC] {} disconnected from {}", socket, endpoint);
        self.emit(socket.get(), SocketEvent::Disconnected, &endpoint);
        Ok(())
    }

    fn bind(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        let cell = self.cell(socket)?;
        let (endpoint, name) = Self::resolve(endpoint)?;

        match self.endpoints.entry(name) {
            Entry::Occupied(_) => {
                return Err(TransportError::new(
                    errno::EADDRINUSE,
                    format!("{endpoint} is already bound"),
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(socket.get());
            }
        }

        {
            let mut state = cell.state.lock();
            state.bound.push(endpoint.clone());
            state
                .options
                .set_internal(SocketOption::LastEndpoint, endpoint.clone().into_bytes());
        }

        debug!("[INPROC] {} bound to {}", socket, endpoint);
        self.emit(socket.get(), SocketEvent::Listening, &endpoint);
        Ok(())
    }

    fn unbind(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        let cell = self.cell(socket)?;
        let (endpoint, name) = Self::resolve(endpoint)?;

        self.endpoints
            .remove_if(&name, |_, owner| *owner == socket.get())
            .ok_or_else(|| {
                TransportError::new(errno::ENOENT, format!("{endpoint} is not bound here"))
            })?;

        let dropped = {
            let mut state = cell.state.lock();
            state.bound.retain(|ep| ep != &endpoint);
            state.remove_peers(|p| p.endpoint == endpoint)
        };
        for peer in &dropped {
            self.unlink(peer, socket.get());
        }

        debug!("[INPROC] {} unbound from {}", socket, endpoint);
        self.emit(socket.get(), SocketEvent::Closed, &endpoint);
        Ok(())
    }

    fn send(&self, socket: RawSocket, data: &[u8], flags: Flags) -> TransportResult<usize> {
        let cell = self.cell(socket)?;
        if !cell.can_send() {
            return Err(TransportError::new(
                errno::ENOTSUP,
                format!("{} sockets cannot send", cell.kind),
            ));
        }

        let mut state = cell.state.lock();
        if state.peers.is_empty()
            && !cell.kind.is_broadcast()
            && state.options.flag(SocketOption::Immediate)
        {
            return Err(TransportError::again());
        }

        state.pending.push(Bytes::copy_from_slice(data));
        if flags.contains(Flags::SNDMORE) {
            return Ok(data.len());
        }

        let msg = std::mem::take(&mut state.pending);
        trace!("[INPROC] {} sending {} frames", socket, msg.len());
        state.dispatch(cell.kind, msg);
        Ok(data.len())
    }

    fn recv(&self, socket: RawSocket, buf: &mut [u8], flags: Flags) -> TransportResult<usize> {
        let frame = self.recv_frame(socket, flags)?;
        let n = frame.data.len().min(buf.len());
        buf[..n].copy_from_slice(&frame.data[..n]);
        Ok(frame.data.len())
    }

    fn recv_frame(&self, socket: RawSocket, flags: Flags) -> TransportResult<Frame> {
        let cell = self.cell(socket)?;
        if !cell.can_recv() {
            return Err(TransportError::new(
                errno::ENOTSUP,
                format!("{} sockets cannot receive", cell.kind),
            ));
        }

        let timeout = {
            let mut state = cell.state.lock();
            if let Some((data, more)) = state.next_part() {
                return Ok(Frame { data, more });
            }
            if flags.contains(Flags::DONTWAIT) {
                Some(Duration::ZERO)
            } else {
                state.options.timeout(SocketOption::RcvTimeo)
            }
        };

        // Wait without holding the state lock so peers can keep delivering
        let msg = match timeout {
            Some(wait) if wait.is_zero() => cell
                .inbox_rx
                .try_recv()
                .map_err(|_| TransportError::again())?,
            Some(wait) => cell
                .inbox_rx
                .recv_timeout(wait)
                .map_err(|_| TransportError::again())?,
            None => cell
                .inbox_rx
                .recv()
                .map_err(|_| TransportError::from_code(errno::ETERM))?,
        };

        let (data, more) = cell.state.lock().begin_message(msg);
        trace!("[INPROC] {} received frame of {} bytes", socket, data.len());
        Ok(Frame { data, more })
    }

    fn setsockopt(&self, socket: RawSocket, code: i32, value: &[u8]) -> TransportResult<()> {
        let cell = self.cell(socket)?;
        let option = SocketOption::from_code(code)
            .ok_or_else(|| TransportError::invalid(format!("unknown option {code}")))?;
        let result = cell.state.lock().options.set(option, value);
        result
    }

    fn getsockopt(&self, socket: RawSocket, code: i32, buf: &mut [u8]) -> TransportResult<usize> {
        let cell = self.cell(socket)?;
        let option = SocketOption::from_code(code)
            .ok_or_else(|| TransportError::invalid(format!("unknown option {code}")))?;

        let state = cell.state.lock();
        match option {
            SocketOption::RcvMore => {
                Self::write_fixed(option, &encode_value(state.rcvmore), buf)
            }
            SocketOption::Events => {
                let mut events = 0;
                if !state.current.is_empty() || !cell.inbox_rx.is_empty() {
                    events |= POLLIN;
                }
                if cell.can_send()
                    && (!state.peers.is_empty()
                        || cell.kind.is_broadcast()
                        || !state.options.flag(SocketOption::Immediate))
                {
                    events |= POLLOUT;
                }
                Self::write_fixed(option, &encode_value(events), buf)
            }
            _ => state.options.get(option, buf),
        }
    }

    fn curve_keypair(&self) -> TransportResult<CurveKeyPair> {
        Ok(curve::generate_keypair())
    }

    fn monitor(
        &self,
        socket: RawSocket,
        endpoint: Option<&str>,
        events: EventMask,
    ) -> TransportResult<()> {
        let cell = self.cell(socket)?;
        // A bad endpoint leaves the running monitor in place
        if let Some(endpoint) = endpoint {
            Self::resolve(endpoint)?;
        }

        let previous = cell.state.lock().monitor.take();
        if let Some(sink) = previous {
            self.stop_monitor(sink);
        }
        let Some(endpoint) = endpoint else {
            return Ok(());
        };

        let pair = self.allocate(SocketType::Pair);
        if let Err(e) = self.bind(pair, endpoint) {
            let _ = self.close(pair);
            return Err(e);
        }
        cell.state.lock().monitor = Some(MonitorSink {
            handle: pair.get(),
            events,
        });

        debug!("[INPROC] Monitoring {} on {} ({:#x})", socket, endpoint, events.bits());
        Ok(())
    }

    fn join(&self, socket: RawSocket, group: &str) -> TransportResult<()> {
        let cell = self.cell(socket)?;
        if group.is_empty() || group.len() > MAX_GROUP_LENGTH {
            return Err(TransportError::invalid(format!(
                "group name must be 1-{MAX_GROUP_LENGTH} bytes"
            )));
        }
        if !cell.state.lock().groups.insert(group.to_string()) {
            return Err(TransportError::invalid(format!("already joined {group}")));
        }
        Ok(())
    }

    fn leave(&self, socket: RawSocket, group: &str) -> TransportResult<()> {
        let cell = self.cell(socket)?;
        if !cell.state.lock().groups.remove(group) {
            return Err(TransportError::invalid(format!("not a member of {group}")));
        }
        Ok(())
    }
}
