//! Error numbers reported across the transport seam.
//!
//! The transport reports failures as `errno`-style integers. Platform codes
//! come from `libc`; the codes libzmq defines on top of them live in the
//! `HAUSNUMERO` range so they never collide with an OS value.

/// Base of the transport-specific error range (`ZMQ_HAUSNUMERO`).
pub const HAUSNUMERO: i32 = 156_384_712;

/// Operation cannot be accomplished in the current socket state.
pub const EFSM: i32 = HAUSNUMERO + 51;

/// The requested transport protocol is not compatible with the socket type.
pub const ENOCOMPATPROTO: i32 = HAUSNUMERO + 52;

/// The context associated with the socket was terminated.
pub const ETERM: i32 = HAUSNUMERO + 53;

/// No I/O thread is available to accomplish the task.
pub const EMTHREAD: i32 = HAUSNUMERO + 54;

pub use libc::{
    EADDRINUSE, EADDRNOTAVAIL, EAGAIN, ECONNREFUSED, EFAULT, EHOSTUNREACH, EINTR, EINVAL,
    EMFILE, ENOENT, ENOTSOCK, ENOTSUP, EPROTONOSUPPORT,
};

/// Human-readable text for an error number.
///
/// Mirrors `zmq_strerror`: transport-specific codes get their own text, any
/// other value is described by the operating system.
pub fn strerror(code: i32) -> String {
    match code {
        EFSM => "Operation cannot be accomplished in current state".to_string(),
        ENOCOMPATPROTO => "The protocol is not compatible with the socket type".to_string(),
        ETERM => "Context was terminated".to_string(),
        EMTHREAD => "No thread available".to_string(),
        EAGAIN => "Resource temporarily unavailable".to_string(),
        ENOTSOCK => "Socket operation on non-socket".to_string(),
        EINVAL => "Invalid argument".to_string(),
        ENOTSUP => "Operation not supported".to_string(),
        EPROTONOSUPPORT => "Protocol not supported".to_string(),
        EADDRINUSE => "Address already in use".to_string(),
        ECONNREFUSED => "Connection refused".to_string(),
        ENOENT => "No such file or directory".to_string(),
        _ => {
            let text = std::io::Error::from_raw_os_error(code).to_string();
            // Drop the "(os error N)" suffix std appends
            match text.rfind(" (os error") {
                Some(idx) => text[..idx].to_string(),
                None => text,
            }
        }
    }
}
