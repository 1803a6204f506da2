//! Engine handle shared by sockets.

use crate::socket::Socket;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use zocket_core::error::Result;
use zocket_core::socket_type::SocketType;
use zocket_core::transport::Transport;
use zocket_inproc::InprocEngine;

/// Entry point for creating sockets.
///
/// A context owns one transport engine. Cloning is cheap and every clone
/// talks to the same engine, so sockets created from clones can reach each
/// other's `inproc://` endpoints.
///
/// # Examples
///
/// ```
/// use zocket::prelude::*;
///
/// let ctx = Context::new();
/// let mut server = ctx.socket(SocketType::Pair)?;
/// server.bind("inproc://example")?;
/// server.close()?;
/// # Ok::<(), zocket::Error>(())
/// ```
#[derive(Clone)]
pub struct Context {
    transport: Arc<dyn Transport>,
}

impl Context {
    /// Create a context backed by a fresh in-process engine.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(InprocEngine::new()))
    }

    /// Create a context over any transport engine.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        debug!("[CONTEXT] Using {} transport", transport.name());
        Self { transport }
    }

    /// Create a context backed by libzmq.
    #[cfg(feature = "libzmq")]
    pub fn libzmq() -> Result<Self> {
        let engine = crate::libzmq::ZmqEngine::new()?;
        Ok(Self::with_transport(Arc::new(engine)))
    }

    /// Create a socket of the given type.
    ///
    /// Fails with the engine's error code and message when the engine
    /// refuses (for example `EMFILE` once the socket limit is reached).
    pub fn socket(&self, kind: SocketType) -> Result<Socket> {
        let raw = self.transport.socket(kind)?;
        debug!("[CONTEXT] Created {} socket {}", kind, raw);
        Ok(Socket::new(Arc::clone(&self.transport), raw, kind))
    }

    /// Name of the underlying engine.
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("transport", &self.transport.name())
            .finish()
    }
}
