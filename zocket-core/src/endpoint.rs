//! Endpoint parsing.
//!
//! Endpoints are opaque to the socket layer and passed to the transport
//! verbatim. Engines that interpret them themselves split them here into a
//! scheme and an address; the address is not validated beyond being
//! non-empty.

use crate::errno;
use crate::error::TransportError;
use std::fmt;

/// Transport schemes a ZeroMQ-style engine may understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Tcp,
    Ipc,
    Inproc,
    Pgm,
    Epgm,
    Tipc,
    Vmci,
    Udp,
    Ws,
}

impl Scheme {
    const NAMES: [(&'static str, Scheme); 9] = [
        ("tcp", Scheme::Tcp),
        ("ipc", Scheme::Ipc),
        ("inproc", Scheme::Inproc),
        ("pgm", Scheme::Pgm),
        ("epgm", Scheme::Epgm),
        ("tipc", Scheme::Tipc),
        ("vmci", Scheme::Vmci),
        ("udp", Scheme::Udp),
        ("ws", Scheme::Ws),
    ];

    /// Scheme name without the `://` separator.
    pub fn as_str(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, scheme)| *scheme == self)
            .map_or("", |(name, _)| name)
    }

    fn lookup(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, scheme)| *scheme)
    }
}

/// A parsed `scheme://address` endpoint, borrowing from its source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint<'a> {
    pub scheme: Scheme,
    pub address: &'a str,
}

impl<'a> Endpoint<'a> {
    /// Split an endpoint into scheme and address.
    ///
    /// ```
    /// use zocket_core::endpoint::{Endpoint, Scheme};
    ///
    /// let endpoint = Endpoint::parse("inproc://workers").unwrap();
    /// assert_eq!(endpoint.scheme, Scheme::Inproc);
    /// assert_eq!(endpoint.address, "workers");
    /// ```
    pub fn parse(s: &'a str) -> Result<Self, EndpointError> {
        let (scheme, address) = s
            .split_once("://")
            .ok_or_else(|| EndpointError::Malformed(s.to_string()))?;
        let scheme = Scheme::lookup(scheme)
            .ok_or_else(|| EndpointError::UnsupportedScheme(scheme.to_string()))?;
        if address.is_empty() {
            return Err(EndpointError::EmptyAddress(s.to_string()));
        }
        Ok(Self { scheme, address })
    }

    /// Address part when this is an `inproc://` endpoint.
    pub fn inproc_name(&self) -> Option<&'a str> {
        (self.scheme == Scheme::Inproc).then_some(self.address)
    }
}

impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.address)
    }
}

/// Errors that can occur when parsing endpoints.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("endpoint has no scheme: {0}")]
    Malformed(String),

    #[error("unsupported transport scheme: {0}")]
    UnsupportedScheme(String),

    #[error("endpoint has an empty address: {0}")]
    EmptyAddress(String),
}

impl From<EndpointError> for TransportError {
    fn from(err: EndpointError) -> Self {
        let code = match err {
            EndpointError::UnsupportedScheme(_) => errno::EPROTONOSUPPORT,
            EndpointError::Malformed(_) | EndpointError::EmptyAddress(_) => errno::EINVAL,
        };
        TransportError::new(code, err.to_string())
    }
}
