//! Socket lifecycle and identity.
//!
//! A [`Socket`] owns exactly one native handle from creation until it is
//! closed, either explicitly with [`Socket::close`] or implicitly on drop.
//! Once closed, every operation fails with `ENOTSOCK` instead of reaching the
//! engine with a stale handle.

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error};
use zocket_core::errno;
use zocket_core::error::{Error, Result, TransportError};
use zocket_core::option::SocketOption;
use zocket_core::socket_type::SocketType;
use zocket_core::transport::{RawSocket, Transport};

const ENDPOINT_LEN: usize = 256;

/// Largest endpoint buffer [`Socket::last_endpoint`] will try.
pub const MAX_ENDPOINT_LEN: usize = 64 * 1024;

/// Stable identity of a socket.
///
/// Made of the engine's address and the native handle, captured at creation.
/// It does not change when the socket is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId {
    engine: usize,
    raw: RawSocket,
}

impl SocketId {
    /// Handle the socket was created with.
    pub const fn raw(&self) -> RawSocket {
        self.raw
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}/{}", self.engine, self.raw)
    }
}

/// A socket bound to one native handle.
///
/// Sockets may be moved to another thread but not shared between threads;
/// the native handle is not thread-safe.
///
/// Two `Socket` values are equal when they name the same native handle on
/// the same engine.
pub struct Socket {
    transport: Arc<dyn Transport>,
    handle: Option<RawSocket>,
    kind: SocketType,
    id: SocketId,
    _not_sync: PhantomData<Cell<()>>,
}

impl Socket {
    pub(crate) fn new(transport: Arc<dyn Transport>, raw: RawSocket, kind: SocketType) -> Self {
        let engine = Arc::as_ptr(&transport).cast::<()>() as usize;
        Self {
            transport,
            handle: Some(raw),
            kind,
            id: SocketId { engine, raw },
            _not_sync: PhantomData,
        }
    }

    /// Socket type, fixed at creation.
    pub fn kind(&self) -> SocketType {
        self.kind
    }

    /// Identity used for equality and hashing.
    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Whether the native handle is still held.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// The native handle, for one engine call.
    ///
    /// Fails with `ENOTSOCK` after the socket has been closed.
    pub fn raw(&self) -> Result<RawSocket> {
        self.handle
            .ok_or_else(|| Error::Transport(TransportError::not_socket()))
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Connect to an endpoint such as `tcp://host:port` or `inproc://name`.
    pub fn connect(&self, endpoint: &str) -> Result<()> {
        let raw = self.raw()?;
        self.transport.connect(raw, endpoint)?;
        debug!("[SOCKET] {} {} connected to {}", self.kind, raw, endpoint);
        Ok(())
    }

    /// Drop a connection made with [`connect`](Self::connect).
    pub fn disconnect(&self, endpoint: &str) -> Result<()> {
        let raw = self.raw()?;
        self.transport.disconnect(raw, endpoint)?;
        debug!("[SOCKET] {} {} disconnected from {}", self.kind, raw, endpoint);
        Ok(())
    }

    /// Accept connections on an endpoint.
    pub fn bind(&self, endpoint: &str) -> Result<()> {
        let raw = self.raw()?;
        self.transport.bind(raw, endpoint)?;
        debug!("[SOCKET] {} {} bound to {}", self.kind, raw, endpoint);
        Ok(())
    }

    /// Stop accepting connections on an endpoint.
    pub fn unbind(&self, endpoint: &str) -> Result<()> {
        let raw = self.raw()?;
        self.transport.unbind(raw, endpoint)?;
        debug!("[SOCKET] {} {} unbound from {}", self.kind, raw, endpoint);
        Ok(())
    }

    /// Release the native handle.
    ///
    /// Closing an already closed socket does nothing. If the engine refuses,
    /// the handle is kept and the error returned, so a later `close` or the
    /// drop can retry.
    pub fn close(&mut self) -> Result<()> {
        let Some(raw) = self.handle else {
            return Ok(());
        };
        self.transport.close(raw)?;
        self.handle = None;
        debug!("[SOCKET] Closed {} socket {}", self.kind, raw);
        Ok(())
    }

    /// Endpoint of the most recent successful bind.
    ///
    /// Engines report a short buffer as `EINVAL`, so the read is retried
    /// with twice the room until [`MAX_ENDPOINT_LEN`] is reached.
    pub fn last_endpoint(&self) -> Result<String> {
        let mut capacity = ENDPOINT_LEN;
        loop {
            match self.get_string(SocketOption::LastEndpoint.code(), capacity) {
                Err(Error::Transport(e))
                    if e.code == errno::EINVAL && capacity < MAX_ENDPOINT_LEN =>
                {
                    capacity *= 2;
                }
                other => return other,
            }
        }
    }

    /// Socket type as reported by the engine (`ZMQ_TYPE`).
    pub fn socket_type_code(&self) -> Result<i32> {
        self.get::<i32>(SocketOption::Type.code())
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        if let Some(raw) = self.handle.take() {
            match self.transport.close(raw) {
                Ok(()) => debug!("[SOCKET] Closed {} socket {} on drop", self.kind, raw),
                Err(e) => error!("[SOCKET] Failed to close {} socket {}: {}", self.kind, raw, e),
            }
        }
    }
}

impl PartialEq for Socket {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Socket {}

impl Hash for Socket {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}
