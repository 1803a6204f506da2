//! # Zocket
//!
//! Safe, owned socket handles over a ZeroMQ-style transport.
//!
//! ## Architecture
//!
//! - **`zocket-core`**: Errors, socket types, flags, option codes and value
//!   marshaling, monitor events, Z85, and the `Transport` engine seam
//! - **`zocket-inproc`**: Pure-Rust `inproc://` engine (default)
//! - **`zocket`**: Public API surface (this crate), plus the libzmq backend
//!   behind the `libzmq` feature
//!
//! A [`Socket`] owns one native handle. It closes the handle exactly once,
//! explicitly or on drop, and refuses every call after that with `ENOTSOCK`.
//! Options are marshaled with the exact width the engine expects for each
//! option code, and every engine failure is returned as a
//! [`TransportError`] carrying the engine's error code and message.
//!
//! ## Quick Start
//!
//! ```rust
//! use zocket::prelude::*;
//!
//! let ctx = Context::new();
//! let server = ctx.socket(SocketType::Pair)?;
//! let client = ctx.socket(SocketType::Pair)?;
//!
//! server.bind("inproc://quickstart")?;
//! client.connect("inproc://quickstart")?;
//!
//! client.send_multipart([&b"Hello"[..], &b"World"[..]])?;
//! let msg = server.recv_multipart(Flags::NONE)?;
//! assert_eq!(&msg[0][..], b"Hello");
//! assert!(!server.has_more()?);
//! # Ok::<(), zocket::Error>(())
//! ```
//!
//! ## Features
//!
//! - **`libzmq`** - `Context::libzmq()` backed by libzmq through `zmq-sys`
//! - **`draft`** - links `zmq_join` / `zmq_leave` (needs a draft-enabled libzmq)

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

mod context;
mod framing;
mod membership;
mod options;
mod security;
mod socket;

pub mod dev_tracing;

#[cfg(feature = "libzmq")]
pub mod libzmq;

pub use context::Context;
pub use options::SocketOptions;
pub use socket::{Socket, SocketId};

pub use zocket_core::errno;
pub use zocket_core::error::{Error, Result, TransportError};
pub use zocket_core::flags::Flags;
pub use zocket_core::monitor::{EventMask, MonitorEvent, SocketEvent};
pub use zocket_core::option::{OptionKind, OptionValue, SocketOption};
pub use zocket_core::socket_type::SocketType;
pub use zocket_core::transport::{
    CurveKeyPair, Frame, Multipart, RawSocket, Transport, TransportResult,
};
pub use zocket_core::z85;
pub use zocket_inproc::InprocEngine;

/// Everything needed to create and use sockets.
pub mod prelude {
    pub use crate::{
        Context, CurveKeyPair, Error, EventMask, Flags, MonitorEvent, Multipart, Socket,
        SocketEvent, SocketOption, SocketOptions, SocketType, TransportError,
    };
}
