//! The transport seam.
//!
//! [`Transport`] is the engine a socket talks to: the set of native calls
//! (`zmq_socket`, `zmq_bind`, `zmq_send`, `zmq_msg_recv`, `zmq_setsockopt`,
//! ...) expressed as safe methods over opaque [`RawSocket`] handles. The
//! libzmq backend forwards each method through FFI; the inproc engine
//! implements them in Rust. Sockets only ever reach the engine through this
//! trait, which also makes it the place to substitute a fake in tests.
//!
//! Every method reports failure as a [`TransportError`] captured at the
//! failure point, before any other call can overwrite the native error state.

use crate::error::TransportError;
use crate::flags::Flags;
use crate::monitor::EventMask;
use crate::socket_type::SocketType;
use bytes::Bytes;
use smallvec::SmallVec;
use std::fmt;
use std::num::NonZeroUsize;

/// Result of a transport call.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Opaque name of one native socket.
///
/// For libzmq this is the socket pointer's address; for the inproc engine
/// a counter. Never dereferenced outside the engine that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawSocket(NonZeroUsize);

impl RawSocket {
    /// Wrap a non-zero handle value.
    #[must_use]
    pub const fn new(value: NonZeroUsize) -> Self {
        Self(value)
    }

    /// Wrap a handle value, returning `None` for the null handle.
    #[must_use]
    pub const fn from_usize(value: usize) -> Option<Self> {
        match NonZeroUsize::new(value) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// The raw handle value.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for RawSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.get())
    }
}

/// One received part of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Part payload
    pub data: Bytes,
    /// Another part of the same message is pending
    pub more: bool,
}

impl Frame {
    /// Create a frame.
    pub fn new(data: impl Into<Bytes>, more: bool) -> Self {
        Self {
            data: data.into(),
            more,
        }
    }
}

/// A logical message: one or more parts in receive order.
pub type Multipart = SmallVec<[Bytes; 4]>;

/// A curve key pair in Z85 text form (40 characters each).
#[derive(Clone, PartialEq, Eq)]
pub struct CurveKeyPair {
    /// Public key, safe to share
    pub public: String,
    /// Secret key
    pub secret: String,
}

impl fmt::Debug for CurveKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveKeyPair")
            .field("public", &self.public)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// The native engine surface a socket is built on.
///
/// Implementations must be shareable across threads; individual handles are
/// not, and callers serialise access to each handle themselves.
pub trait Transport: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Create a socket of the given type (`zmq_socket`).
    fn socket(&self, kind: SocketType) -> TransportResult<RawSocket>;

    /// Release a socket (`zmq_close`). The handle is invalid afterwards.
    fn close(&self, socket: RawSocket) -> TransportResult<()>;

    /// Connect to an endpoint (`zmq_connect`).
    fn connect(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()>;

    /// Drop a connection (`zmq_disconnect`).
    fn disconnect(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()>;

    /// Accept connections on an endpoint (`zmq_bind`).
    fn bind(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()>;

    /// Stop accepting on an endpoint (`zmq_unbind`).
    fn unbind(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()>;

    /// Queue one frame (`zmq_send`). Returns the number of bytes queued.
    fn send(&self, socket: RawSocket, data: &[u8], flags: Flags) -> TransportResult<usize>;

    /// Receive one frame into `buf` (`zmq_recv`).
    ///
    /// Returns the full size of the frame, which can exceed `buf.len()`;
    /// in that case only `buf.len()` bytes were written.
    fn recv(&self, socket: RawSocket, buf: &mut [u8], flags: Flags) -> TransportResult<usize>;

    /// Receive one whole frame with its "more" flag (`zmq_msg_recv`).
    ///
    /// The native message object is released before this returns, on
    /// success and on failure.
    fn recv_frame(&self, socket: RawSocket, flags: Flags) -> TransportResult<Frame>;

    /// Set an option from its encoded value (`zmq_setsockopt`).
    fn setsockopt(&self, socket: RawSocket, code: i32, value: &[u8]) -> TransportResult<()>;

    /// Read an option into `buf` (`zmq_getsockopt`).
    ///
    /// Returns the number of bytes the engine wrote.
    fn getsockopt(&self, socket: RawSocket, code: i32, buf: &mut [u8]) -> TransportResult<usize>;

    /// Generate a fresh curve key pair (`zmq_curve_keypair`).
    fn curve_keypair(&self) -> TransportResult<CurveKeyPair>;

    /// Publish lifecycle events of `socket` on `endpoint`
    /// (`zmq_socket_monitor`). `None` stops monitoring.
    fn monitor(
        &self,
        socket: RawSocket,
        endpoint: Option<&str>,
        events: EventMask,
    ) -> TransportResult<()>;

    /// Join a group (`zmq_join`, draft API).
    fn join(&self, socket: RawSocket, group: &str) -> TransportResult<()>;

    /// Leave a group (`zmq_leave`, draft API).
    fn leave(&self, socket: RawSocket, group: &str) -> TransportResult<()>;
}
