//! Send and receive flags.
//!
//! One flag type covers both directions because the transport shares the
//! integer encoding. Only [`Flags::NONE`] and [`Flags::DONTWAIT`] are legal
//! on receive; [`Flags::validate_recv`] rejects the rest locally.

use crate::error::{Error, Result};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Bit set of `ZMQ_DONTWAIT` / `ZMQ_SNDMORE` style flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: i32 {
        /// Return `EAGAIN` instead of blocking (`ZMQ_DONTWAIT`).
        const DONTWAIT = 1;

        /// More parts of the same message follow (`ZMQ_SNDMORE`).
        const SNDMORE = 2;
    }
}

impl Flags {
    /// Blocking call, last part of the message.
    pub const NONE: Flags = Flags::empty();

    /// Flags for one frame of an outgoing message.
    #[must_use]
    pub const fn for_part(more: bool) -> Self {
        if more {
            Self::SNDMORE
        } else {
            Self::NONE
        }
    }

    /// Reject any flag a receive call does not understand.
    pub fn validate_recv(self) -> Result<Self> {
        if !Self::DONTWAIT.contains(self) {
            return Err(Error::invalid_option(format!(
                "receive flags {self} contain bits other than DONTWAIT"
            )));
        }
        Ok(self)
    }
}

impl Default for Flags {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.bits())
    }
}
