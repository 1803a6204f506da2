//! Zocket Core
//!
//! This crate contains the vocabulary shared by every zocket engine and the
//! public socket API:
//! - Error types and the transport errno table (`error`, `errno`)
//! - Socket types and send/receive flags (`socket_type`, `flags`)
//! - Option codes and fixed-width value marshaling (`option`)
//! - Monitor event masks and event decoding (`monitor`)
//! - Z85 key encoding (`z85`)
//! - Endpoint parsing (`endpoint`)
//! - The engine seam (`transport`)

#![deny(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_same_arms)]

pub mod endpoint;
pub mod errno;
pub mod error;
pub mod flags;
pub mod monitor;
pub mod option;
pub mod socket_type;
pub mod transport;
pub mod z85;

/// Names engines need when implementing [`transport::Transport`].
pub mod prelude {
    pub use crate::endpoint::Endpoint;
    pub use crate::error::{Error, Result, TransportError};
    pub use crate::flags::Flags;
    pub use crate::monitor::{EventMask, MonitorEvent, SocketEvent};
    pub use crate::option::{OptionKind, OptionValue, SocketOption};
    pub use crate::socket_type::SocketType;
    pub use crate::transport::{
        CurveKeyPair, Frame, Multipart, RawSocket, Transport, TransportResult,
    };
}
