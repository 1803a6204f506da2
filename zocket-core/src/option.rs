//! Socket option codes and value marshaling.
//!
//! Each option is identified by the transport's numeric code and has a fixed
//! value domain. The width is hard-coded per option here: the transport reads
//! exactly as many bytes as it expects for a code, so inferring the width
//! from the caller's value would corrupt memory on the native side.

use crate::error::{Error, Result};
use std::fmt;

/// Value domain of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    /// 32-bit signed integer (`int`)
    Int32,
    /// 64-bit unsigned integer (`uint64_t`)
    UInt64,
    /// 64-bit signed integer (`int64_t`)
    Int64,
    /// Boolean carried as a 32-bit integer, 0 or 1
    Bool,
    /// Arbitrary binary buffer
    Bytes,
    /// Text without a terminator on set, NUL-terminated on get
    String,
    /// Curve key: 32 raw bytes or 40 Z85 characters
    Key,
}

impl OptionKind {
    /// Fixed byte width, or `None` for variable-length kinds.
    #[must_use]
    pub const fn width(self) -> Option<usize> {
        match self {
            Self::Int32 | Self::Bool => Some(4),
            Self::UInt64 | Self::Int64 => Some(8),
            Self::Bytes | Self::String | Self::Key => None,
        }
    }
}

/// Transport option codes used by zocket.
///
/// Codes match `zmq.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketOption {
    /// `ZMQ_AFFINITY`: I/O thread affinity bitmask
    Affinity,
    /// `ZMQ_ROUTING_ID` / `ZMQ_IDENTITY`
    Identity,
    /// `ZMQ_SUBSCRIBE`
    Subscribe,
    /// `ZMQ_UNSUBSCRIBE`
    Unsubscribe,
    /// `ZMQ_RATE`: multicast data rate in kbit/s
    Rate,
    /// `ZMQ_RECOVERY_IVL`: multicast recovery interval in ms
    RecoveryIvl,
    /// `ZMQ_SNDBUF`: kernel transmit buffer size
    SndBuf,
    /// `ZMQ_RCVBUF`: kernel receive buffer size
    RcvBuf,
    /// `ZMQ_RCVMORE`: more parts of the current message pending (read-only)
    RcvMore,
    /// `ZMQ_EVENTS`: poll state bits (read-only)
    Events,
    /// `ZMQ_TYPE`: socket type code (read-only)
    Type,
    /// `ZMQ_LINGER`: ms pending messages linger after close
    Linger,
    /// `ZMQ_RECONNECT_IVL`: initial reconnect interval in ms
    ReconnectIvl,
    /// `ZMQ_BACKLOG`: outstanding connection queue length
    Backlog,
    /// `ZMQ_RECONNECT_IVL_MAX`: maximum reconnect interval in ms
    ReconnectIvlMax,
    /// `ZMQ_MAXMSGSIZE`: largest accepted inbound message, -1 for no limit
    MaxMsgSize,
    /// `ZMQ_SNDHWM`: outbound high-water mark
    SndHwm,
    /// `ZMQ_RCVHWM`: inbound high-water mark
    RcvHwm,
    /// `ZMQ_RCVTIMEO`: receive timeout in ms, -1 for infinite
    RcvTimeo,
    /// `ZMQ_SNDTIMEO`: send timeout in ms, -1 for infinite
    SndTimeo,
    /// `ZMQ_LAST_ENDPOINT`: last endpoint bound (read-only)
    LastEndpoint,
    /// `ZMQ_IMMEDIATE`: queue only on completed connections
    Immediate,
    /// `ZMQ_CURVE_SERVER`: act as curve server
    CurveServer,
    /// `ZMQ_CURVE_PUBLICKEY`
    CurvePublicKey,
    /// `ZMQ_CURVE_SECRETKEY`
    CurveSecretKey,
    /// `ZMQ_CURVE_SERVERKEY`
    CurveServerKey,
    /// `ZMQ_ROUTER_HANDOVER`: hand identity over on duplicate reconnect
    RouterHandover,
    /// `ZMQ_CONNECT_ROUTING_ID`: identity assigned to the next connection
    ConnectRoutingId,
}

impl SocketOption {
    /// Every option known to zocket.
    pub const ALL: [SocketOption; 28] = [
        Self::Affinity,
        Self::Identity,
        Self::Subscribe,
        Self::Unsubscribe,
        Self::Rate,
        Self::RecoveryIvl,
        Self::SndBuf,
        Self::RcvBuf,
        Self::RcvMore,
        Self::Events,
        Self::Type,
        Self::Linger,
        Self::ReconnectIvl,
        Self::Backlog,
        Self::ReconnectIvlMax,
        Self::MaxMsgSize,
        Self::SndHwm,
        Self::RcvHwm,
        Self::RcvTimeo,
        Self::SndTimeo,
        Self::LastEndpoint,
        Self::Immediate,
        Self::CurveServer,
        Self::CurvePublicKey,
        Self::CurveSecretKey,
        Self::CurveServerKey,
        Self::RouterHandover,
        Self::ConnectRoutingId,
    ];

    /// Numeric code passed to `zmq_setsockopt` / `zmq_getsockopt`.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Affinity => 4,
            Self::Identity => 5,
            Self::Subscribe => 6,
            Self::Unsubscribe => 7,
            Self::Rate => 8,
            Self::RecoveryIvl => 9,
            Self::SndBuf => 11,
            Self::RcvBuf => 12,
            Self::RcvMore => 13,
            Self::Events => 15,
            Self::Type => 16,
            Self::Linger => 17,
            Self::ReconnectIvl => 18,
            Self::Backlog => 19,
            Self::ReconnectIvlMax => 21,
            Self::MaxMsgSize => 22,
            Self::SndHwm => 23,
            Self::RcvHwm => 24,
            Self::RcvTimeo => 27,
            Self::SndTimeo => 28,
            Self::LastEndpoint => 32,
            Self::Immediate => 39,
            Self::CurveServer => 47,
            Self::CurvePublicKey => 48,
            Self::CurveSecretKey => 49,
            Self::CurveServerKey => 50,
            Self::RouterHandover => 56,
            Self::ConnectRoutingId => 61,
        }
    }

    /// Value domain of the option.
    #[must_use]
    pub const fn kind(self) -> OptionKind {
        match self {
            Self::Affinity => OptionKind::UInt64,
            Self::MaxMsgSize => OptionKind::Int64,
            Self::Identity | Self::Subscribe | Self::Unsubscribe | Self::ConnectRoutingId => {
                OptionKind::Bytes
            }
            Self::LastEndpoint => OptionKind::String,
            Self::CurvePublicKey | Self::CurveSecretKey | Self::CurveServerKey => OptionKind::Key,
            Self::RcvMore | Self::Immediate | Self::CurveServer | Self::RouterHandover => {
                OptionKind::Bool
            }
            Self::Rate
            | Self::RecoveryIvl
            | Self::SndBuf
            | Self::RcvBuf
            | Self::Events
            | Self::Type
            | Self::Linger
            | Self::ReconnectIvl
            | Self::Backlog
            | Self::ReconnectIvlMax
            | Self::SndHwm
            | Self::RcvHwm
            | Self::RcvTimeo
            | Self::SndTimeo => OptionKind::Int32,
        }
    }

    /// Whether the transport accepts a value for this option.
    #[must_use]
    pub const fn is_settable(self) -> bool {
        !matches!(
            self,
            Self::RcvMore | Self::Events | Self::Type | Self::LastEndpoint
        )
    }

    /// Whether the transport reports a value for this option.
    ///
    /// Subscriptions, router handover and connect routing id are write-only.
    #[must_use]
    pub const fn is_gettable(self) -> bool {
        !matches!(
            self,
            Self::Subscribe | Self::Unsubscribe | Self::RouterHandover | Self::ConnectRoutingId
        )
    }

    /// Look up an option by its transport code.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|opt| opt.code() == code)
    }
}

impl fmt::Display for SocketOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// A fixed-width value that can be marshaled into an option buffer.
///
/// Encoding is native-endian, matching what the transport reads through its
/// `void*` option pointer.
pub trait OptionValue: Sized + Copy {
    /// Option kinds that carry this value type.
    const KIND: OptionKind;

    /// Exact byte width of the encoded value.
    const WIDTH: usize;

    /// Append the encoded value to `out`.
    fn encode(self, out: &mut Vec<u8>);

    /// Decode from a buffer of exactly [`Self::WIDTH`] bytes.
    fn decode(buf: &[u8]) -> Result<Self>;
}

fn width_mismatch(expected: usize, actual: usize) -> Error {
    Error::invalid_option(format!(
        "option value is {actual} bytes, expected {expected}"
    ))
}

impl OptionValue for i32 {
    const KIND: OptionKind = OptionKind::Int32;
    const WIDTH: usize = 4;

    fn encode(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_ne_bytes());
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        let raw: [u8; 4] = buf
            .try_into()
            .map_err(|_| width_mismatch(Self::WIDTH, buf.len()))?;
        Ok(i32::from_ne_bytes(raw))
    }
}

impl OptionValue for u64 {
    const KIND: OptionKind = OptionKind::UInt64;
    const WIDTH: usize = 8;

    fn encode(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_ne_bytes());
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        let raw: [u8; 8] = buf
            .try_into()
            .map_err(|_| width_mismatch(Self::WIDTH, buf.len()))?;
        Ok(u64::from_ne_bytes(raw))
    }
}

impl OptionValue for i64 {
    const KIND: OptionKind = OptionKind::Int64;
    const WIDTH: usize = 8;

    fn encode(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_ne_bytes());
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        let raw: [u8; 8] = buf
            .try_into()
            .map_err(|_| width_mismatch(Self::WIDTH, buf.len()))?;
        Ok(i64::from_ne_bytes(raw))
    }
}

impl OptionValue for bool {
    const KIND: OptionKind = OptionKind::Bool;
    const WIDTH: usize = 4;

    fn encode(self, out: &mut Vec<u8>) {
        i32::from(self).encode(out);
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        i32::decode(buf).map(|v| v != 0)
    }
}

/// Check that `T` is the value type the option is declared with.
pub fn check_kind<T: OptionValue>(option: SocketOption) -> Result<()> {
    if option.kind() == T::KIND {
        Ok(())
    } else {
        Err(Error::invalid_option(format!(
            "{option} holds {:?} values, not {:?}",
            option.kind(),
            T::KIND
        )))
    }
}

/// Encode a fixed-width value into a fresh buffer.
pub fn encode_value<T: OptionValue>(value: T) -> Vec<u8> {
    let mut out = Vec::with_capacity(T::WIDTH);
    value.encode(&mut out);
    out
}
