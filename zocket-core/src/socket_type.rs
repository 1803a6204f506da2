//! Socket type enumeration.
//!
//! The closed set of messaging patterns a socket can be created with. The
//! discriminants are the numeric codes the transport expects in
//! `zmq_socket()` and reports back through the `ZMQ_TYPE` option.

use crate::error::{Error, Result};
use std::fmt;

/// Messaging pattern of a socket, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SocketType {
    /// Exclusive one-to-one link
    Pair = 0,
    /// Fan-out publisher
    Pub = 1,
    /// Subscriber to a publisher
    Sub = 2,
    /// Strict request side of request/reply
    Req = 3,
    /// Strict reply side of request/reply
    Rep = 4,
    /// Load-balanced asynchronous request side
    Dealer = 5,
    /// Identity-addressed asynchronous reply side
    Router = 6,
    /// Pipeline sink
    Pull = 7,
    /// Pipeline source
    Push = 8,
    /// Publisher that also sees subscription frames
    XPub = 9,
    /// Subscriber that sends subscription frames itself
    XSub = 10,
    /// Raw byte stream to non-ZeroMQ peers
    Stream = 11,
}

impl SocketType {
    /// Every socket type, in code order.
    pub const ALL: [SocketType; 12] = [
        Self::Pair,
        Self::Pub,
        Self::Sub,
        Self::Req,
        Self::Rep,
        Self::Dealer,
        Self::Router,
        Self::Pull,
        Self::Push,
        Self::XPub,
        Self::XSub,
        Self::Stream,
    ];

    /// Numeric code passed to the transport.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Look up a socket type by its transport code.
    pub fn from_code(code: i32) -> Result<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| unknown_code(code))
    }

    /// Upper-case pattern name, as libzmq spells it.
    pub fn as_str(self) -> &'static str {
        const NAMES: [&str; 12] = [
            "PAIR", "PUB", "SUB", "REQ", "REP", "DEALER", "ROUTER", "PULL", "PUSH", "XPUB",
            "XSUB", "STREAM",
        ];
        NAMES[self as usize]
    }

    /// Whether messages sent on this type fan out to every peer.
    #[must_use]
    pub const fn is_broadcast(self) -> bool {
        matches!(self, Self::Pub | Self::XPub)
    }

    /// Peer types this socket may be linked with.
    pub fn peers(self) -> &'static [SocketType] {
        use SocketType::*;
        match self {
            Pair => &[Pair],
            Pub | XPub => &[Sub, XSub],
            Sub | XSub => &[Pub, XPub],
            Req => &[Rep, Router],
            Rep => &[Req, Dealer],
            Dealer => &[Rep, Dealer, Router],
            Router => &[Req, Dealer, Router],
            Pull => &[Push],
            Push => &[Pull],
            Stream => &[],
        }
    }

    /// Whether a link between `self` and `peer` is allowed.
    pub fn is_compatible(self, peer: SocketType) -> bool {
        self.peers().contains(&peer)
    }
}

fn unknown_code(code: i32) -> Error {
    Error::invalid_option(format!("unknown socket type code {code}"))
}

impl TryFrom<i32> for SocketType {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        Self::from_code(code)
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
