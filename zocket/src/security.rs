//! CURVE key setup.
//!
//! Keys travel as 40-character Z85 strings. The helpers below set the
//! options a CURVE client or server needs, in a fixed order, and stop at the
//! first option the engine rejects.

use crate::context::Context;
use crate::socket::Socket;
use tracing::debug;
use zocket_core::error::Result;
use zocket_core::option::SocketOption;
use zocket_core::transport::CurveKeyPair;

impl Context {
    /// Generate a fresh CURVE key pair.
    pub fn curve_keypair(&self) -> Result<CurveKeyPair> {
        Ok(self.transport().curve_keypair()?)
    }
}

impl Socket {
    fn set_key(&self, option: SocketOption, key: &str) -> Result<()> {
        self.set_str(option.code(), Some(key))
    }

    /// Configure this socket as a CURVE client.
    ///
    /// Sets the client's public key, then its secret key, then the server's
    /// public key. Returns the first failure; options set before it are not
    /// rolled back.
    pub fn configure_client_security(
        &self,
        server_public: &str,
        client_public: &str,
        client_secret: &str,
    ) -> Result<()> {
        self.set_key(SocketOption::CurvePublicKey, client_public)?;
        self.set_key(SocketOption::CurveSecretKey, client_secret)?;
        self.set_key(SocketOption::CurveServerKey, server_public)?;
        debug!("[SOCKET] {} configured as CURVE client", self.id());
        Ok(())
    }

    /// Configure this socket as a CURVE server.
    ///
    /// Enables server mode, then sets the secret key, then the public key.
    /// Returns the first failure.
    pub fn configure_server_security(&self, server_secret: &str, server_public: &str) -> Result<()> {
        self.set_option(SocketOption::CurveServer, true)?;
        self.set_key(SocketOption::CurveSecretKey, server_secret)?;
        self.set_key(SocketOption::CurvePublicKey, server_public)?;
        debug!("[SOCKET] {} configured as CURVE server", self.id());
        Ok(())
    }
}
