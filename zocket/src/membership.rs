//! Socket monitoring and group membership.

use crate::socket::Socket;
use tracing::debug;
use zocket_core::error::Result;
use zocket_core::monitor::EventMask;

impl Socket {
    /// Publish this socket's lifecycle events on `endpoint`.
    ///
    /// The endpoint must be `inproc://`. Connect a PAIR socket to it and
    /// decode each two-frame message with
    /// [`MonitorEvent::from_frames`](zocket_core::monitor::MonitorEvent::from_frames).
    /// Starting a new monitor replaces the previous one.
    pub fn monitor(&self, endpoint: &str, events: EventMask) -> Result<()> {
        let raw = self.raw()?;
        self.transport().monitor(raw, Some(endpoint), events)?;
        debug!("[SOCKET] {} monitored on {}", raw, endpoint);
        Ok(())
    }

    /// Stop publishing events. A `MonitorStopped` event is sent last.
    pub fn monitor_stop(&self) -> Result<()> {
        let raw = self.raw()?;
        self.transport().monitor(raw, None, EventMask::NONE)?;
        debug!("[SOCKET] {} monitor stopped", raw);
        Ok(())
    }

    /// Join a group (RADIO/DISH style sockets).
    pub fn join(&self, group: &str) -> Result<()> {
        let raw = self.raw()?;
        self.transport().join(raw, group)?;
        debug!("[SOCKET] {} joined {}", raw, group);
        Ok(())
    }

    /// Leave a group joined with [`join`](Self::join).
    pub fn leave(&self, group: &str) -> Result<()> {
        let raw = self.raw()?;
        self.transport().leave(raw, group)?;
        debug!("[SOCKET] {} left {}", raw, group);
        Ok(())
    }
}
