//! Socket event monitoring.
//!
//! A monitored socket publishes its lifecycle events on a PAIR endpoint.
//! Each event is a two-frame message: a 6-byte header (host byte order `u16`
//! event id, `u32` event value) followed by the affected endpoint address.

use crate::error::{Error, Result};
use bitflags::bitflags;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use std::ops::BitOr;

/// Socket lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SocketEvent {
    /// Connection established to a peer.
    Connected = 0x0001,

    /// Synchronous connect failed, it is being polled.
    ConnectDelayed = 0x0002,

    /// Asynchronous connect will be retried after the reconnect interval.
    ConnectRetried = 0x0004,

    /// Socket bound to an address and is listening.
    Listening = 0x0008,

    /// Bind operation failed.
    BindFailed = 0x0010,

    /// Connection accepted from a peer.
    Accepted = 0x0020,

    /// Accepting a connection failed.
    AcceptFailed = 0x0040,

    /// Connection closed.
    Closed = 0x0080,

    /// Closing the underlying descriptor failed.
    CloseFailed = 0x0100,

    /// Session disconnected unexpectedly.
    Disconnected = 0x0200,

    /// Monitoring on this socket ended.
    MonitorStopped = 0x0400,
}

impl SocketEvent {
    /// Every event, in bit order.
    pub const ALL: [SocketEvent; 11] = [
        Self::Connected,
        Self::ConnectDelayed,
        Self::ConnectRetried,
        Self::Listening,
        Self::BindFailed,
        Self::Accepted,
        Self::AcceptFailed,
        Self::Closed,
        Self::CloseFailed,
        Self::Disconnected,
        Self::MonitorStopped,
    ];

    /// The event's bit in a monitor mask.
    #[must_use]
    pub const fn bit(self) -> u16 {
        self as u16
    }

    /// Look up an event by its wire id.
    #[must_use]
    pub fn from_bit(bit: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.bit() == bit)
    }
}

impl fmt::Display for SocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connected => "connected",
            Self::ConnectDelayed => "connect delayed",
            Self::ConnectRetried => "connect retried",
            Self::Listening => "listening",
            Self::BindFailed => "bind failed",
            Self::Accepted => "accepted",
            Self::AcceptFailed => "accept failed",
            Self::Closed => "closed",
            Self::CloseFailed => "close failed",
            Self::Disconnected => "disconnected",
            Self::MonitorStopped => "monitor stopped",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Bit set of [`SocketEvent`]s passed to the monitor call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: i32 {
        const CONNECTED = 0x0001;
        const CONNECT_DELAYED = 0x0002;
        const CONNECT_RETRIED = 0x0004;
        const LISTENING = 0x0008;
        const BIND_FAILED = 0x0010;
        const ACCEPTED = 0x0020;
        const ACCEPT_FAILED = 0x0040;
        const CLOSED = 0x0080;
        const CLOSE_FAILED = 0x0100;
        const DISCONNECTED = 0x0200;
        const MONITOR_STOPPED = 0x0400;

        /// Every event the transport defines (`ZMQ_EVENT_ALL`).
        const ALL = 0xFFFF;
    }
}

impl EventMask {
    /// No events.
    pub const NONE: EventMask = EventMask::empty();

    /// Check whether the mask selects `event`.
    #[must_use]
    pub const fn selects(self, event: SocketEvent) -> bool {
        self.intersects(EventMask::from_event(event))
    }

    const fn from_event(event: SocketEvent) -> Self {
        Self::from_bits_retain(event.bit() as i32)
    }
}

impl Default for EventMask {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<SocketEvent> for EventMask {
    fn from(event: SocketEvent) -> Self {
        Self::from_event(event)
    }
}

impl BitOr<SocketEvent> for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: SocketEvent) -> EventMask {
        self | EventMask::from(rhs)
    }
}

impl BitOr for SocketEvent {
    type Output = EventMask;

    fn bitor(self, rhs: SocketEvent) -> EventMask {
        EventMask::from(self) | rhs
    }
}

/// One decoded monitor notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEvent {
    /// What happened.
    pub event: SocketEvent,
    /// Event-specific value (descriptor, errno or interval).
    pub value: u32,
    /// Endpoint the event concerns.
    pub endpoint: String,
}

const HEADER_LEN: usize = 6;

impl MonitorEvent {
    /// Create a new event record.
    pub fn new(event: SocketEvent, value: u32, endpoint: impl Into<String>) -> Self {
        Self {
            event,
            value,
            endpoint: endpoint.into(),
        }
    }

    /// Decode the two frames of a monitor message.
    pub fn from_frames(frames: &[Bytes]) -> Result<Self> {
        let [header, endpoint] = frames else {
            return Err(Error::invalid_option(format!(
                "monitor message has {} frames, expected 2",
                frames.len()
            )));
        };
        if header.len() != HEADER_LEN {
            return Err(Error::invalid_option(format!(
                "monitor header is {} bytes, expected {HEADER_LEN}",
                header.len()
            )));
        }

        let id = u16::from_ne_bytes([header[0], header[1]]);
        let value = u32::from_ne_bytes([header[2], header[3], header[4], header[5]]);
        let event = SocketEvent::from_bit(id)
            .ok_or_else(|| Error::invalid_option(format!("unknown monitor event {id:#06x}")))?;
        let endpoint = std::str::from_utf8(endpoint)?.to_string();

        Ok(Self {
            event,
            value,
            endpoint,
        })
    }

    /// Encode into the two frames a monitor endpoint publishes.
    #[must_use]
    pub fn to_frames(&self) -> [Bytes; 2] {
        let mut header = BytesMut::with_capacity(HEADER_LEN);
        header.put_u16_ne(self.event.bit());
        header.put_u32_ne(self.value);
        [header.freeze(), Bytes::from(self.endpoint.clone())]
    }
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.event, self.endpoint, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_event_display() {
        let event = MonitorEvent::new(SocketEvent::Connected, 7, "tcp://127.0.0.1:5555");
        assert_eq!(event.to_string(), "connected tcp://127.0.0.1:5555 (7)");
    }

    #[test]
    fn test_mask_composition() {
        let mask = SocketEvent::Connected | SocketEvent::Disconnected;
        assert_eq!(mask.bits(), 0x0201);
        assert!(mask.selects(SocketEvent::Connected));
        assert!(!mask.selects(SocketEvent::Listening));
        assert!(EventMask::ALL.selects(SocketEvent::MonitorStopped));
        assert_eq!(mask, EventMask::CONNECTED | EventMask::DISCONNECTED);
    }

    #[test]
    fn test_decode_frames() {
        let mut header = 0x0008u16.to_ne_bytes().to_vec();
        header.extend_from_slice(&42u32.to_ne_bytes());
        let frames = vec![Bytes::from(header), Bytes::from_static(b"inproc://svc")];
        let event = MonitorEvent::from_frames(&frames).unwrap();
        assert_eq!(event.event, SocketEvent::Listening);
        assert_eq!(event.value, 42);
        assert_eq!(event.endpoint, "inproc://svc");
        assert_eq!(event.to_frames().to_vec(), frames);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(MonitorEvent::from_frames(&[Bytes::from_static(b"x")]).is_err());
        let bad_id = [
            Bytes::from_static(&[0x00, 0x30, 0, 0, 0, 0]),
            Bytes::from_static(b"inproc://svc"),
        ];
        assert!(MonitorEvent::from_frames(&bad_id).is_err());
    }
}
