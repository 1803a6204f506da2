//! Zocket Error Types
//!
//! Every fallible operation returns one of these. Transport failures carry
//! the native error number and text captured at the point of failure; the
//! remaining variants are local precondition failures raised before any
//! transport call is made.

use crate::errno;
use thiserror::Error;

/// A failure reported by the transport engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport error {code}: {message}")]
pub struct TransportError {
    /// Native error number (`errno` / `zmq_errno()`)
    pub code: i32,
    /// Native error text (`zmq_strerror()`)
    pub message: String,
}

impl TransportError {
    /// Create an error carrying an explicit code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create an error from a code, using the standard text for it.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        Self::new(code, errno::strerror(code))
    }

    /// Error returned for any operation on a closed or unknown socket.
    #[must_use]
    pub fn not_socket() -> Self {
        Self::from_code(errno::ENOTSOCK)
    }

    /// Error returned when a non-blocking call could not proceed.
    #[must_use]
    pub fn again() -> Self {
        Self::from_code(errno::EAGAIN)
    }

    /// Error returned for an invalid argument.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(errno::EINVAL, message)
    }

    /// Check if the call would have blocked (`EAGAIN`).
    #[must_use]
    pub const fn is_again(&self) -> bool {
        self.code == errno::EAGAIN
    }

    /// Check if the handle did not name an open socket (`ENOTSOCK`).
    #[must_use]
    pub const fn is_not_socket(&self) -> bool {
        self.code == errno::ENOTSOCK
    }

    /// Check if the owning context was terminated (`ETERM`).
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.code == errno::ETERM
    }
}

/// Main error type for zocket operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The transport engine rejected the call
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Local precondition failure on an option or flag argument
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// A multipart send was given no parts
    #[error("Multipart message must contain at least one part")]
    EmptyMessage,

    /// A value expected to be text was not valid UTF-8
    #[error("Value is not valid UTF-8")]
    InvalidUtf8,

    /// Key material had the wrong length or encoding
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Result type alias for zocket operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid option error with a message
    pub fn invalid_option(msg: impl Into<String>) -> Self {
        Self::InvalidOption(msg.into())
    }

    /// Create an invalid key error with a message
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    /// The transport error, if this is one.
    #[must_use]
    pub const fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }

    /// Check if this error is recoverable by retrying the same call later
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_again() || e.code == errno::EINTR,
            _ => false,
        }
    }

    /// Check if this error means the socket is no longer usable
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_not_socket() || e.is_terminated())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Self {
        Self::InvalidUtf8
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_: std::string::FromUtf8Error) -> Self {
        Self::InvalidUtf8
    }
}
