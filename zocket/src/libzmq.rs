//! libzmq backend.
//!
//! Forwards every transport call to libzmq through `zmq-sys`. A
//! [`RawSocket`] carries the `void*` socket pointer returned by
//! `zmq_socket`; it is only turned back into a pointer here.
//!
//! Errors are read with `zmq_errno` immediately after the failing call,
//! before anything else can touch the thread's error state.
//!
//! `zmq_join` and `zmq_leave` are draft API. They are linked only with the
//! `draft` feature; without it both report `ENOTSUP`.

#![allow(unsafe_code)]

use std::ffi::{c_void, CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr::{self, NonNull};
use tracing::{debug, error};
use zocket_core::error::TransportError;
use zocket_core::flags::Flags;
use zocket_core::monitor::EventMask;
use zocket_core::socket_type::SocketType;
use zocket_core::transport::{CurveKeyPair, Frame, RawSocket, Transport, TransportResult};
use zocket_core::z85::KEY_CHARS;

#[cfg(feature = "draft")]
extern "C" {
    fn zmq_join(s: *mut c_void, group: *const c_char) -> c_int;
    fn zmq_leave(s: *mut c_void, group: *const c_char) -> c_int;
}

/// Error state of the failing call on this thread.
fn last_error() -> TransportError {
    // SAFETY: zmq_errno has no preconditions; zmq_strerror returns a static
    // NUL-terminated string for any code.
    let code = unsafe { zmq_sys::zmq_errno() };
    let message = unsafe { CStr::from_ptr(zmq_sys::zmq_strerror(code)) };
    TransportError::new(code, message.to_string_lossy())
}

fn check(rc: c_int) -> TransportResult<c_int> {
    if rc == -1 {
        Err(last_error())
    } else {
        Ok(rc)
    }
}

fn as_ptr(socket: RawSocket) -> *mut c_void {
    socket.get() as *mut c_void
}

fn c_string(value: &str) -> TransportResult<CString> {
    CString::new(value).map_err(|_| TransportError::invalid(format!("{value:?} contains a NUL byte")))
}

/// An initialised `zmq_msg_t`, closed on drop.
struct MsgGuard(zmq_sys::zmq_msg_t);

impl MsgGuard {
    fn new() -> TransportResult<Self> {
        // SAFETY: zmq_msg_t is plain data; zmq_msg_init initialises it
        let mut msg: zmq_sys::zmq_msg_t = unsafe { std::mem::zeroed() };
        check(unsafe { zmq_sys::zmq_msg_init(&mut msg) })?;
        Ok(Self(msg))
    }

    fn data(&mut self) -> &[u8] {
        // SAFETY: the message is initialised; data and size describe one
        // buffer owned by the message until it is closed
        unsafe {
            let size = zmq_sys::zmq_msg_size(&self.0);
            if size == 0 {
                return &[];
            }
            let data = zmq_sys::zmq_msg_data(&mut self.0);
            std::slice::from_raw_parts(data.cast::<u8>(), size)
        }
    }

    fn more(&self) -> bool {
        // SAFETY: the message is initialised
        unsafe { zmq_sys::zmq_msg_more(&self.0) != 0 }
    }
}

impl Drop for MsgGuard {
    fn drop(&mut self) {
        // SAFETY: initialised in `new` and closed exactly once here
        unsafe {
            zmq_sys::zmq_msg_close(&mut self.0);
        }
    }
}

/// Transport engine backed by one libzmq context.
pub struct ZmqEngine {
    ctx: NonNull<c_void>,
}

// SAFETY: libzmq contexts are thread-safe. Socket pointers derived from the
// context are only used through `Socket`, which is not `Sync`.
unsafe impl Send for ZmqEngine {}
unsafe impl Sync for ZmqEngine {}

impl ZmqEngine {
    /// Create a libzmq context.
    pub fn new() -> TransportResult<Self> {
        // SAFETY: no preconditions
        let ctx = unsafe { zmq_sys::zmq_ctx_new() };
        let ctx = NonNull::new(ctx).ok_or_else(last_error)?;
        debug!("[LIBZMQ] Context created");
        Ok(Self { ctx })
    }
}

impl Drop for ZmqEngine {
    fn drop(&mut self) {
        loop {
            // SAFETY: the context is live and terminated exactly once
            let rc = unsafe { zmq_sys::zmq_ctx_term(self.ctx.as_ptr()) };
            if rc == 0 {
                debug!("[LIBZMQ] Context terminated");
                return;
            }
            let err = last_error();
            if err.code != libc::EINTR {
                error!("[LIBZMQ] Failed to terminate context: {}", err);
                return;
            }
        }
    }
}

impl std::fmt::Debug for ZmqEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqEngine").field("ctx", &self.ctx).finish()
    }
}

impl Transport for ZmqEngine {
    fn name(&self) -> &'static str {
        "libzmq"
    }

    fn socket(&self, kind: SocketType) -> TransportResult<RawSocket> {
        // SAFETY: the context is live
        let ptr = unsafe { zmq_sys::zmq_socket(self.ctx.as_ptr(), kind.code()) };
        RawSocket::from_usize(ptr as usize).ok_or_else(last_error)
    }

    fn close(&self, socket: RawSocket) -> TransportResult<()> {
        // SAFETY: `socket` came from `socket` and has not been closed
        check(unsafe { zmq_sys::zmq_close(as_ptr(socket)) })?;
        Ok(())
    }

    fn connect(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        let endpoint = c_string(endpoint)?;
        // SAFETY: live socket, NUL-terminated endpoint
        check(unsafe { zmq_sys::zmq_connect(as_ptr(socket), endpoint.as_ptr()) })?;
        Ok(())
    }

    fn disconnect(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        let endpoint = c_string(endpoint)?;
        // SAFETY: live socket, NUL-terminated endpoint
        check(unsafe { zmq_sys::zmq_disconnect(as_ptr(socket), endpoint.as_ptr()) })?;
        Ok(())
    }

    fn bind(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        let endpoint = c_string(endpoint)?;
        // SAFETY: live socket, NUL-terminated endpoint
        check(unsafe { zmq_sys::zmq_bind(as_ptr(socket), endpoint.as_ptr()) })?;
        Ok(())
    }

    fn unbind(&self, socket: RawSocket, endpoint: &str) -> TransportResult<()> {
        let endpoint = c_string(endpoint)?;
        // SAFETY: live socket, NUL-terminated endpoint
        check(unsafe { zmq_sys::zmq_unbind(as_ptr(socket), endpoint.as_ptr()) })?;
        Ok(())
    }

    fn send(&self, socket: RawSocket, data: &[u8], flags: Flags) -> TransportResult<usize> {
        // SAFETY: live socket; libzmq copies `data` before returning
        let rc = check(unsafe {
            zmq_sys::zmq_send(as_ptr(socket), data.as_ptr().cast(), data.len(), flags.bits())
        })?;
        Ok(rc as usize)
    }

    fn recv(&self, socket: RawSocket, buf: &mut [u8], flags: Flags) -> TransportResult<usize> {
        // SAFETY: live socket; libzmq writes at most buf.len() bytes
        let rc = check(unsafe {
            zmq_sys::zmq_recv(as_ptr(socket), buf.as_mut_ptr().cast(), buf.len(), flags.bits())
        })?;
        Ok(rc as usize)
    }

    fn recv_frame(&self, socket: RawSocket, flags: Flags) -> TransportResult<Frame> {
        let mut msg = MsgGuard::new()?;
        // SAFETY: live socket, initialised message
        check(unsafe { zmq_sys::zmq_msg_recv(&mut msg.0, as_ptr(socket), flags.bits()) })?;
        let data = bytes::Bytes::copy_from_slice(msg.data());
        Ok(Frame {
            data,
            more: msg.more(),
        })
    }

    fn setsockopt(&self, socket: RawSocket, code: i32, value: &[u8]) -> TransportResult<()> {
        // SAFETY: live socket; libzmq reads exactly value.len() bytes
        check(unsafe {
            zmq_sys::zmq_setsockopt(as_ptr(socket), code, value.as_ptr().cast(), value.len())
        })?;
        Ok(())
    }

    fn getsockopt(&self, socket: RawSocket, code: i32, buf: &mut [u8]) -> TransportResult<usize> {
        let mut size = buf.len();
        // SAFETY: live socket; libzmq writes at most `size` bytes and
        // stores the written length back into `size`
        check(unsafe {
            zmq_sys::zmq_getsockopt(as_ptr(socket), code, buf.as_mut_ptr().cast(), &mut size)
        })?;
        Ok(size)
    }

    fn curve_keypair(&self) -> TransportResult<CurveKeyPair> {
        let mut public = [0u8; KEY_CHARS + 1];
        let mut secret = [0u8; KEY_CHARS + 1];
        // SAFETY: both buffers hold 40 characters plus the terminator
        check(unsafe {
            zmq_sys::zmq_curve_keypair(
                public.as_mut_ptr().cast::<c_char>(),
                secret.as_mut_ptr().cast::<c_char>(),
            )
        })?;
        let text = |buf: &[u8]| -> TransportResult<String> {
            CStr::from_bytes_until_nul(buf)
                .map(|s| s.to_string_lossy().into_owned())
                .map_err(|_| TransportError::invalid("unterminated key from zmq_curve_keypair"))
        };
        Ok(CurveKeyPair {
            public: text(&public)?,
            secret: text(&secret)?,
        })
    }

    fn monitor(
        &self,
        socket: RawSocket,
        endpoint: Option<&str>,
        events: EventMask,
    ) -> TransportResult<()> {
        let endpoint = endpoint.map(c_string).transpose()?;
        let addr = endpoint.as_ref().map_or(ptr::null(), |e| e.as_ptr());
        // SAFETY: live socket; a null address stops monitoring
        check(unsafe { zmq_sys::zmq_socket_monitor(as_ptr(socket), addr, events.bits()) })?;
        Ok(())
    }

    #[cfg(feature = "draft")]
    fn join(&self, socket: RawSocket, group: &str) -> TransportResult<()> {
        let group = c_string(group)?;
        // SAFETY: live socket, NUL-terminated group
        check(unsafe { zmq_join(as_ptr(socket), group.as_ptr()) })?;
        Ok(())
    }

    #[cfg(feature = "draft")]
    fn leave(&self, socket: RawSocket, group: &str) -> TransportResult<()> {
        let group = c_string(group)?;
        // SAFETY: live socket, NUL-terminated group
        check(unsafe { zmq_leave(as_ptr(socket), group.as_ptr()) })?;
        Ok(())
    }

    #[cfg(not(feature = "draft"))]
    fn join(&self, _socket: RawSocket, _group: &str) -> TransportResult<()> {
        Err(TransportError::new(
            libc::ENOTSUP,
            "zmq_join needs the draft feature",
        ))
    }

    #[cfg(not(feature = "draft"))]
    fn leave(&self, _socket: RawSocket, _group: &str) -> TransportResult<()> {
        Err(TransportError::new(
            libc::ENOTSUP,
            "zmq_leave needs the draft feature",
        ))
    }
}
