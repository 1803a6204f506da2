//! Shared test transport: the inproc engine with call recording and
//! injectable failures.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zocket::{
    errno, Context, CurveKeyPair, EventMask, Flags, Frame, InprocEngine, RawSocket, SocketType,
    Transport, TransportError, TransportResult,
};

/// Wraps an [`InprocEngine`], recording calls and failing on demand.
#[derive(Default)]
pub struct ScriptedTransport {
    inner: InprocEngine,
    /// Total number of transport calls
    pub calls: AtomicUsize,
    /// Number of `close` calls that reached the engine
    pub closes: AtomicUsize,
    /// Option code whose `setsockopt` fails with `EINVAL` (0 for none)
    pub fail_option: AtomicI32,
    /// Make `close` fail with `EINTR`
    pub fail_close: AtomicBool,
    /// Codes passed to `setsockopt`, in call order
    pub set_codes: Mutex<Vec<i32>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn open_sockets(&self) -> usize {
        self.inner.socket_count()
    }

    pub fn set_codes(&self) -> Vec<i32> {
        self.set_codes.lock().unwrap().clone()
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// A context over a fresh scripted transport.
pub fn scripted_context() -> (Context, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::new();
    let ctx = Context::with_transport(transport.clone());
    (ctx, transport)
}

impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn socket(&self, kind: SocketType) -> TransportResult<RawSocket> {
        self.tick();
        self.inner.socket(kind)
    }

    fn close(&self, socket: RawSocket) -> TransportResult<()> {
        self.tick();
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(TransportError::new(errno::EINTR, "interrupted"));
        }
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close(socket)
    }

    fn connect(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        self.tick();
        self.inner.connect(socket, endpoint)
    }

    fn disconnect(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        self.tick();
        self.inner.disconnect(socket, endpoint)
    }

    fn bind(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        self.tick();
        self.inner.bind(socket, endpoint)
    }

    fn unbind(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        self.tick();
        self.inner.unbind(socket, endpoint)
    }

    fn send(&self, socket: RawSocket, data: &[u8], flags: Flags) -> TransportResult<usize> {
        self.tick();
        self.inner.send(socket, data, flags)
    }

    fn recv(&self, socket: RawSocket, buf: &mut [u8], flags: Flags) -> TransportResult<usize> {
        self.tick();
        self.inner.recv(socket, buf, flags)
    }

    fn recv_frame(&self, socket: RawSocket, flags: Flags) -> TransportResult<Frame> {
        self.tick();
        self.inner.recv_frame(socket, flags)
    }

    fn setsockopt(&self, socket: RawSocket, code: i32, value: &[u8]) -> TransportResult<()> {
        self.tick();
        self.set_codes.lock().unwrap().push(code);
        if self.fail_option.load(Ordering::SeqCst) == code {
            return Err(TransportError::new(errno::EINVAL, "injected failure"));
        }
        self.inner.setsockopt(socket, code, value)
    }

    fn getsockopt(&self, socket: RawSocket, code: i32, buf: &mut [u8]) -> TransportResult<usize> {
        self.tick();
        self.inner.getsockopt(socket, code, buf)
    }

    fn curve_keypair(&self) -> TransportResult<CurveKeyPair> {
        self.tick();
        self.inner.curve_keypair()
    }

    fn monitor(
        &self,
        socket: RawSocket,
        endpoint: Option<&str>,
        events: EventMask,
    ) -> TransportResult<()> {
        self.tick();
        self.inner.monitor(socket, endpoint, events)
    }

    fn join(&self, socket: RawSocket, group: &str) -> TransportResult<()> {
        self.tick();
        self.inner.join(socket, group)
    }

    fn leave(&self, socket: RawSocket, group: &str) -> TransportResult<()> {
        self.tick();
        self.inner.leave(socket, group)
    }
}

/// A bound/connected pair of sockets of the given types.
pub fn connected(
    ctx: &Context,
    endpoint: &str,
    server: SocketType,
    client: SocketType,
) -> (zocket::Socket, zocket::Socket) {
    let server = ctx.socket(server).unwrap();
    let client = ctx.socket(client).unwrap();
    server.bind(endpoint).unwrap();
    client.connect(endpoint).unwrap();
    (server, client)
}
