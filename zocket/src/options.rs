//! Socket options.
//!
//! Three layers, each built on the one below:
//!
//! - raw marshaling by numeric code (`set_i32`, `set_u64`, `set_str`,
//!   `set_bytes`, `get`), which always hands the engine a buffer of exactly
//!   the width the option expects;
//! - typed access by [`SocketOption`] (`set_option`, `option`), which also
//!   checks that the Rust value type matches the option's declared kind;
//! - named accessors (`set_linger`, `recv_hwm`, ...) and the [`SocketOptions`]
//!   builder applied with [`Socket::apply_options`].

use crate::socket::Socket;
use bytes::Bytes;
use std::time::Duration;
use tracing::trace;
use zocket_core::errno;
use zocket_core::error::{Error, Result, TransportError};
use zocket_core::option::{check_kind, encode_value, OptionValue, SocketOption};
use zocket_core::z85::KEY_CHARS;

/// Largest fixed-width option value.
const MAX_WIDTH: usize = 8;

impl Socket {
    fn set_raw(&self, code: i32, value: &[u8]) -> Result<()> {
        let raw = self.raw()?;
        self.transport().setsockopt(raw, code, value)?;
        trace!("[SOCKET] {} set option {} ({} bytes)", raw, code, value.len());
        Ok(())
    }

    /// Set a 32-bit integer option.
    pub fn set_i32(&self, code: i32, value: i32) -> Result<()> {
        self.set_raw(code, &value.to_ne_bytes())
    }

    /// Set a 64-bit unsigned option.
    pub fn set_u64(&self, code: i32, value: u64) -> Result<()> {
        self.set_raw(code, &value.to_ne_bytes())
    }

    /// Set a text option. `None` passes a zero-length value; for
    /// `ZMQ_SUBSCRIBE` that subscribes to every message.
    pub fn set_str(&self, code: i32, value: Option<&str>) -> Result<()> {
        self.set_raw(code, value.map_or(&[][..], str::as_bytes))
    }

    /// Set a binary option.
    pub fn set_bytes(&self, code: i32, value: &[u8]) -> Result<()> {
        self.set_raw(code, value)
    }

    /// Read a fixed-width option.
    ///
    /// The engine is given a buffer of exactly `T::WIDTH` bytes; if it
    /// reports any other size the read fails with `EINVAL`.
    pub fn get<T: OptionValue>(&self, code: i32) -> Result<T> {
        if T::WIDTH > MAX_WIDTH {
            return Err(Error::invalid_option(format!(
                "option values are at most {MAX_WIDTH} bytes, not {}",
                T::WIDTH
            )));
        }
        let raw = self.raw()?;
        let mut scratch = [0u8; MAX_WIDTH];
        let buf = &mut scratch[..T::WIDTH];
        let size = self.transport().getsockopt(raw, code, buf)?;
        if size != T::WIDTH {
            return Err(TransportError::new(
                errno::EINVAL,
                format!(
                    "option size mismatch: option {code} reported {size} bytes, expected {}",
                    T::WIDTH
                ),
            )
            .into());
        }
        T::decode(buf)
    }

    /// Read a variable-length option into a buffer of `capacity` bytes.
    pub fn get_bytes(&self, code: i32, capacity: usize) -> Result<Vec<u8>> {
        let raw = self.raw()?;
        let mut buf = vec![0u8; capacity];
        let size = self.transport().getsockopt(raw, code, &mut buf)?;
        buf.truncate(size.min(capacity));
        Ok(buf)
    }

    /// Read a text option, dropping the trailing NUL.
    pub fn get_string(&self, code: i32, capacity: usize) -> Result<String> {
        let mut bytes = self.get_bytes(code, capacity)?;
        if bytes.last() == Some(&0) {
            bytes.pop();
        }
        Ok(String::from_utf8(bytes)?)
    }

    /// Set a fixed-width option by name.
    ///
    /// Fails with [`Error::InvalidOption`], before reaching the engine, when
    /// `T` is not the option's value type or the option is read-only.
    pub fn set_option<T: OptionValue>(&self, option: SocketOption, value: T) -> Result<()> {
        check_kind::<T>(option)?;
        if !option.is_settable() {
            return Err(Error::invalid_option(format!("{option} is read-only")));
        }
        self.set_raw(option.code(), &encode_value(value))
    }

    /// Read a fixed-width option by name.
    pub fn option<T: OptionValue>(&self, option: SocketOption) -> Result<T> {
        check_kind::<T>(option)?;
        if !option.is_gettable() {
            return Err(Error::invalid_option(format!("{option} is write-only")));
        }
        self.get::<T>(option.code())
    }

    /// Apply every configured field of `options`.
    ///
    /// Fields are applied in option-code order, subscriptions last.
    /// Stops at the first failure; options applied before it stay applied.
    pub fn apply_options(&self, options: &SocketOptions) -> Result<()> {
        if let Some(v) = options.affinity {
            self.set_affinity(v)?;
        }
        if let Some(id) = &options.routing_id {
            self.set_identity(id)?;
        }
        if let Some(v) = options.rate {
            self.set_rate(v)?;
        }
        if let Some(d) = options.recovery_ivl {
            self.set_recovery_ivl(millis(d)?)?;
        }
        if let Some(v) = options.send_buffer {
            self.set_send_buffer(v)?;
        }
        if let Some(v) = options.recv_buffer {
            self.set_recv_buffer(v)?;
        }
        if let Some(d) = options.linger {
            self.set_linger(timeout_millis(d)?)?;
        }
        if let Some(d) = options.reconnect_ivl {
            self.set_reconnect_ivl(millis(d)?)?;
        }
        if let Some(v) = options.backlog {
            self.set_backlog(v)?;
        }
        if let Some(d) = options.reconnect_ivl_max {
            self.set_reconnect_ivl_max(millis(d)?)?;
        }
        if let Some(v) = options.max_msg_size {
            self.set_max_msg_size(v)?;
        }
        if let Some(v) = options.send_hwm {
            self.set_send_hwm(v)?;
        }
        if let Some(v) = options.recv_hwm {
            self.set_recv_hwm(v)?;
        }
        if let Some(d) = options.recv_timeout {
            self.set_recv_timeout(timeout_millis(d)?)?;
        }
        if let Some(d) = options.send_timeout {
            self.set_send_timeout(timeout_millis(d)?)?;
        }
        if let Some(v) = options.immediate {
            self.set_immediate(v)?;
        }
        if let Some(v) = options.router_handover {
            self.set_router_handover(v)?;
        }
        if let Some(id) = &options.connect_routing_id {
            self.set_connect_routing_id(id)?;
        }
        for topic in &options.subscriptions {
            self.subscribe(topic)?;
        }
        Ok(())
    }
}

macro_rules! int_options {
    ($( $(#[$doc:meta])* $getter:ident, $setter:ident => $option:ident; )*) => {
        impl Socket {
            $(
                $(#[$doc])*
                pub fn $getter(&self) -> Result<i32> {
                    self.option::<i32>(SocketOption::$option)
                }

                $(#[$doc])*
                pub fn $setter(&self, value: i32) -> Result<()> {
                    self.set_option(SocketOption::$option, value)
                }
            )*
        }
    };
}

int_options! {
    /// Milliseconds pending messages are kept after close (`ZMQ_LINGER`), -1 for forever.
    linger, set_linger => Linger;
    /// Outbound high-water mark in messages (`ZMQ_SNDHWM`).
    send_hwm, set_send_hwm => SndHwm;
    /// Inbound high-water mark in messages (`ZMQ_RCVHWM`).
    recv_hwm, set_recv_hwm => RcvHwm;
    /// Multicast data rate in kbit/s (`ZMQ_RATE`).
    rate, set_rate => Rate;
    /// Multicast recovery interval in milliseconds (`ZMQ_RECOVERY_IVL`).
    recovery_ivl, set_recovery_ivl => RecoveryIvl;
    /// Kernel transmit buffer size (`ZMQ_SNDBUF`), -1 for the OS default.
    send_buffer, set_send_buffer => SndBuf;
    /// Kernel receive buffer size (`ZMQ_RCVBUF`), -1 for the OS default.
    recv_buffer, set_recv_buffer => RcvBuf;
    /// Initial reconnect interval in milliseconds (`ZMQ_RECONNECT_IVL`).
    reconnect_ivl, set_reconnect_ivl => ReconnectIvl;
    /// Maximum reconnect interval in milliseconds (`ZMQ_RECONNECT_IVL_MAX`).
    reconnect_ivl_max, set_reconnect_ivl_max => ReconnectIvlMax;
    /// Send timeout in milliseconds (`ZMQ_SNDTIMEO`), -1 to block.
    send_timeout, set_send_timeout => SndTimeo;
    /// Receive timeout in milliseconds (`ZMQ_RCVTIMEO`), -1 to block.
    recv_timeout, set_recv_timeout => RcvTimeo;
    /// Pending connection queue length (`ZMQ_BACKLOG`).
    backlog, set_backlog => Backlog;
}

impl Socket {
    /// Queue only to completed connections (`ZMQ_IMMEDIATE`).
    pub fn immediate(&self) -> Result<bool> {
        self.option(SocketOption::Immediate)
    }

    /// Queue only to completed connections (`ZMQ_IMMEDIATE`).
    pub fn set_immediate(&self, value: bool) -> Result<()> {
        self.set_option(SocketOption::Immediate, value)
    }

    /// Let a new peer take over an existing routing id (`ZMQ_ROUTER_HANDOVER`).
    pub fn set_router_handover(&self, value: bool) -> Result<()> {
        self.set_option(SocketOption::RouterHandover, value)
    }

    /// Routing id for the next outgoing connection (`ZMQ_CONNECT_ROUTING_ID`).
    pub fn set_connect_routing_id(&self, id: &[u8]) -> Result<()> {
        self.set_bytes(SocketOption::ConnectRoutingId.code(), id)
    }

    /// Socket identity (`ZMQ_ROUTING_ID`).
    pub fn identity(&self) -> Result<Vec<u8>> {
        self.get_bytes(SocketOption::Identity.code(), 255)
    }

    /// Socket identity (`ZMQ_ROUTING_ID`), 1 to 255 bytes.
    pub fn set_identity(&self, id: &[u8]) -> Result<()> {
        self.set_bytes(SocketOption::Identity.code(), id)
    }

    /// I/O thread affinity bitmask (`ZMQ_AFFINITY`).
    pub fn affinity(&self) -> Result<u64> {
        self.option(SocketOption::Affinity)
    }

    /// I/O thread affinity bitmask (`ZMQ_AFFINITY`).
    pub fn set_affinity(&self, mask: u64) -> Result<()> {
        self.set_option(SocketOption::Affinity, mask)
    }

    /// Largest inbound message in bytes (`ZMQ_MAXMSGSIZE`), -1 for no limit.
    pub fn max_msg_size(&self) -> Result<i64> {
        self.option(SocketOption::MaxMsgSize)
    }

    /// Largest inbound message in bytes (`ZMQ_MAXMSGSIZE`), -1 for no limit.
    pub fn set_max_msg_size(&self, size: i64) -> Result<()> {
        self.set_option(SocketOption::MaxMsgSize, size)
    }

    /// Subscribe to messages starting with `prefix`. Empty matches everything.
    pub fn subscribe(&self, prefix: &[u8]) -> Result<()> {
        self.set_bytes(SocketOption::Subscribe.code(), prefix)
    }

    /// Remove a subscription made with [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&self, prefix: &[u8]) -> Result<()> {
        self.set_bytes(SocketOption::Unsubscribe.code(), prefix)
    }

    /// Subscribe to a text prefix.
    pub fn subscribe_str(&self, prefix: &str) -> Result<()> {
        self.subscribe(prefix.as_bytes())
    }

    /// Remove a text subscription.
    pub fn unsubscribe_str(&self, prefix: &str) -> Result<()> {
        self.unsubscribe(prefix.as_bytes())
    }

    /// Readiness bits (`ZMQ_EVENTS`): 1 readable, 2 writable.
    pub fn events(&self) -> Result<i32> {
        self.option(SocketOption::Events)
    }

    /// Whether the socket acts as a curve server (`ZMQ_CURVE_SERVER`).
    pub fn is_curve_server(&self) -> Result<bool> {
        self.option(SocketOption::CurveServer)
    }

    /// Configured curve public key in Z85.
    pub fn curve_public_key(&self) -> Result<String> {
        self.curve_key(SocketOption::CurvePublicKey)
    }

    /// Configured curve secret key in Z85.
    pub fn curve_secret_key(&self) -> Result<String> {
        self.curve_key(SocketOption::CurveSecretKey)
    }

    /// Configured server public key in Z85.
    pub fn curve_server_key(&self) -> Result<String> {
        self.curve_key(SocketOption::CurveServerKey)
    }

    fn curve_key(&self, option: SocketOption) -> Result<String> {
        self.get_string(option.code(), KEY_CHARS + 1)
    }
}

fn millis(d: Duration) -> Result<i32> {
    i32::try_from(d.as_millis())
        .map_err(|_| Error::invalid_option(format!("{d:?} does not fit in milliseconds")))
}

fn timeout_millis(d: Option<Duration>) -> Result<i32> {
    d.map_or(Ok(-1), millis)
}

/// Socket configuration.
///
/// Every field is optional; unset fields keep the engine's default when the
/// options are applied.
///
/// # Examples
///
/// ```
/// use zocket::SocketOptions;
/// use std::time::Duration;
///
/// let opts = SocketOptions::default()
///     .with_recv_timeout(Some(Duration::from_secs(5)))
///     .with_linger(Some(Duration::ZERO));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketOptions {
    /// I/O thread affinity (ZMQ_AFFINITY)
    pub affinity: Option<u64>,

    /// Socket identity / routing ID (ZMQ_ROUTING_ID)
    ///
    /// Must be 1-255 bytes and not start with a null byte.
    pub routing_id: Option<Bytes>,

    /// Multicast rate in kbit/s (ZMQ_RATE)
    pub rate: Option<i32>,

    /// Multicast recovery interval (ZMQ_RECOVERY_IVL)
    pub recovery_ivl: Option<Duration>,

    /// Kernel send buffer size in bytes (ZMQ_SNDBUF)
    pub send_buffer: Option<i32>,

    /// Kernel receive buffer size in bytes (ZMQ_RCVBUF)
    pub recv_buffer: Option<i32>,

    /// Linger timeout (ZMQ_LINGER)
    ///
    /// - `Some(None)`: Keep pending messages until delivered
    /// - `Some(Some(Duration::ZERO))`: Discard pending messages on close
    /// - `Some(Some(duration))`: Wait up to duration
    pub linger: Option<Option<Duration>>,

    /// Reconnect interval (ZMQ_RECONNECT_IVL)
    pub reconnect_ivl: Option<Duration>,

    /// Pending connection queue length (ZMQ_BACKLOG)
    pub backlog: Option<i32>,

    /// Maximum reconnect interval for exponential backoff (ZMQ_RECONNECT_IVL_MAX)
    pub reconnect_ivl_max: Option<Duration>,

    /// Maximum inbound message size in bytes, -1 for no limit (ZMQ_MAXMSGSIZE)
    pub max_msg_size: Option<i64>,

    /// High water mark for sending (ZMQ_SNDHWM)
    pub send_hwm: Option<i32>,

    /// High water mark for receiving (ZMQ_RCVHWM)
    pub recv_hwm: Option<i32>,

    /// Receive timeout (ZMQ_RCVTIMEO)
    ///
    /// - `Some(None)`: Block indefinitely
    /// - `Some(Some(Duration::ZERO))`: Non-blocking (EAGAIN when empty)
    /// - `Some(Some(duration))`: Wait up to duration before returning EAGAIN
    pub recv_timeout: Option<Option<Duration>>,

    /// Send timeout (ZMQ_SNDTIMEO), same encoding as `recv_timeout`
    pub send_timeout: Option<Option<Duration>>,

    /// Queue only to completed connections (ZMQ_IMMEDIATE)
    pub immediate: Option<bool>,

    /// ROUTER handover mode (ZMQ_ROUTER_HANDOVER)
    pub router_handover: Option<bool>,

    /// Routing ID for the next outgoing connection (ZMQ_CONNECT_ROUTING_ID)
    pub connect_routing_id: Option<Bytes>,

    /// Subscription prefixes for SUB/XSUB sockets (ZMQ_SUBSCRIBE)
    pub subscriptions: Vec<Bytes>,
}

impl SocketOptions {
    /// Create options with nothing configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set I/O thread affinity.
    pub fn with_affinity(mut self, mask: u64) -> Self {
        self.affinity = Some(mask);
        self
    }

    /// Set socket routing ID / identity.
    ///
    /// # Examples
    ///
    /// ```
    /// use zocket::SocketOptions;
    /// use bytes::Bytes;
    ///
    /// let opts = SocketOptions::new()
    ///     .with_routing_id(Bytes::from_static(b"worker-01"));
    /// ```
    pub fn with_routing_id(mut self, id: Bytes) -> Self {
        self.routing_id = Some(id);
        self
    }

    /// Set multicast rate.
    pub fn with_rate(mut self, kbits: i32) -> Self {
        self.rate = Some(kbits);
        self
    }

    /// Set multicast recovery interval.
    pub fn with_recovery_ivl(mut self, ivl: Duration) -> Self {
        self.recovery_ivl = Some(ivl);
        self
    }

    /// Set both kernel buffer sizes.
    pub fn with_buffer_sizes(mut self, send: i32, recv: i32) -> Self {
        self.send_buffer = Some(send);
        self.recv_buffer = Some(recv);
        self
    }

    /// Set linger timeout. `None` lingers forever.
    pub fn with_linger(mut self, linger: Option<Duration>) -> Self {
        self.linger = Some(linger);
        self
    }

    /// Set reconnection interval.
    pub fn with_reconnect_ivl(mut self, ivl: Duration) -> Self {
        self.reconnect_ivl = Some(ivl);
        self
    }

    /// Set maximum reconnection interval for exponential backoff.
    pub fn with_reconnect_ivl_max(mut self, max: Duration) -> Self {
        self.reconnect_ivl_max = Some(max);
        self
    }

    /// Set connection backlog.
    pub fn with_backlog(mut self, backlog: i32) -> Self {
        self.backlog = Some(backlog);
        self
    }

    /// Set maximum message size.
    pub fn with_max_msg_size(mut self, size: i64) -> Self {
        self.max_msg_size = Some(size);
        self
    }

    /// Set send high water mark.
    pub fn with_send_hwm(mut self, hwm: i32) -> Self {
        self.send_hwm = Some(hwm);
        self
    }

    /// Set receive high water mark.
    pub fn with_recv_hwm(mut self, hwm: i32) -> Self {
        self.recv_hwm = Some(hwm);
        self
    }

    /// Set receive timeout. `None` blocks indefinitely.
    ///
    /// # Examples
    ///
    /// ```
    /// use zocket::SocketOptions;
    /// use std::time::Duration;
    ///
    /// // Non-blocking receive
    /// let opts = SocketOptions::new().with_recv_timeout(Some(Duration::ZERO));
    /// assert!(opts.is_recv_nonblocking());
    /// ```
    pub fn with_recv_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }

    /// Set send timeout. `None` blocks indefinitely.
    pub fn with_send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Enable or disable immediate mode.
    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = Some(immediate);
        self
    }

    /// Enable ROUTER handover mode.
    pub fn with_router_handover(mut self, enabled: bool) -> Self {
        self.router_handover = Some(enabled);
        self
    }

    /// Set connect routing ID for the next connection.
    pub fn with_connect_routing_id(mut self, id: Bytes) -> Self {
        self.connect_routing_id = Some(id);
        self
    }

    /// Add a subscription prefix.
    pub fn with_subscription(mut self, prefix: impl Into<Bytes>) -> Self {
        self.subscriptions.push(prefix.into());
        self
    }

    /// Check if receive operation should be non-blocking.
    pub fn is_recv_nonblocking(&self) -> bool {
        matches!(self.recv_timeout, Some(Some(d)) if d.is_zero())
    }

    /// Check if send operation should be non-blocking.
    pub fn is_send_nonblocking(&self) -> bool {
        matches!(self.send_timeout, Some(Some(d)) if d.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;
    use zocket_core::socket_type::SocketType;

    #[test]
    fn test_default_options_are_empty() {
        let opts = SocketOptions::default();
        assert!(opts.recv_timeout.is_none());
        assert!(opts.send_hwm.is_none());
        assert!(opts.subscriptions.is_empty());
    }

    #[test]
    fn test_builder_pattern() {
        let opts = SocketOptions::new()
            .with_recv_timeout(Some(Duration::from_secs(5)))
            .with_send_timeout(None)
            .with_recv_hwm(2000);

        assert_eq!(opts.recv_timeout, Some(Some(Duration::from_secs(5))));
        assert_eq!(opts.send_timeout, Some(None));
        assert_eq!(opts.recv_hwm, Some(2000));
    }

    #[test]
    fn test_nonblocking_checks() {
        let blocking = SocketOptions::new().with_recv_timeout(None);
        assert!(!blocking.is_recv_nonblocking());
        assert!(!blocking.is_send_nonblocking());

        let nonblocking = SocketOptions::new()
            .with_recv_timeout(Some(Duration::ZERO))
            .with_send_timeout(Some(Duration::ZERO));
        assert!(nonblocking.is_recv_nonblocking());
        assert!(nonblocking.is_send_nonblocking());
    }

    #[test]
    fn test_timeout_conversion() {
        assert_eq!(timeout_millis(None).unwrap(), -1);
        assert_eq!(timeout_millis(Some(Duration::from_millis(250))).unwrap(), 250);
        assert!(millis(Duration::from_secs(u64::MAX)).is_err());
    }

    #[test]
    fn test_apply_options_sets_values() {
        let ctx = Context::new();
        let socket = ctx.socket(SocketType::Dealer).unwrap();
        let opts = SocketOptions::new()
            .with_linger(Some(Duration::ZERO))
            .with_send_hwm(500)
            .with_recv_timeout(Some(Duration::from_millis(20)))
            .with_routing_id(Bytes::from_static(b"worker-01"));

        socket.apply_options(&opts).unwrap();
        assert_eq!(socket.linger().unwrap(), 0);
        assert_eq!(socket.send_hwm().unwrap(), 500);
        assert_eq!(socket.recv_timeout().unwrap(), 20);
        assert_eq!(socket.identity().unwrap(), b"worker-01");
    }

    #[test]
    fn test_apply_options_stops_at_first_failure() {
        let ctx = Context::new();
        let socket = ctx.socket(SocketType::Pair).unwrap();
        // Subscriptions are applied last and PAIR rejects them
        let opts = SocketOptions::new()
            .with_send_hwm(42)
            .with_subscription(Bytes::from_static(b"topic"))
            .with_immediate(true);

        assert!(socket.apply_options(&opts).is_err());
        assert_eq!(socket.send_hwm().unwrap(), 42);
        assert!(socket.immediate().unwrap());
    }

    #[test]
    fn test_apply_options_skips_later_fields_on_failure() {
        let ctx = Context::new();
        let socket = ctx.socket(SocketType::Dealer).unwrap();
        // Rate is applied before linger; a zero rate is rejected
        let opts = SocketOptions::new()
            .with_rate(0)
            .with_linger(Some(Duration::from_millis(5)));

        assert!(socket.apply_options(&opts).is_err());
        assert_eq!(socket.linger().unwrap(), -1);
    }
}
