//! Per-socket option storage with the transport's validation rules.
//!
//! Values are kept in their encoded form. `set` checks the exact width for
//! fixed-size kinds and the legal range for each integer option; `get`
//! writes into the caller's buffer only when it has the width the option
//! requires, exactly like `zmq_getsockopt`.

use bytes::Bytes;
use hashbrown::HashMap;
use std::time::Duration;
use zocket_core::error::TransportError;
use zocket_core::option::{encode_value, OptionKind, OptionValue, SocketOption};
use zocket_core::socket_type::SocketType;
use zocket_core::transport::TransportResult;
use zocket_core::z85::{self, KEY_BYTES, KEY_CHARS};

/// Longest routing id the transport accepts.
pub const MAX_ROUTING_ID: usize = 255;

/// Encoded option values of one socket.
#[derive(Debug)]
pub struct OptionStore {
    kind: SocketType,
    values: HashMap<SocketOption, Bytes>,
    subscriptions: Vec<Bytes>,
}

impl OptionStore {
    /// Empty store; every option reads as its default.
    pub fn new(kind: SocketType) -> Self {
        Self {
            kind,
            values: HashMap::new(),
            subscriptions: Vec::new(),
        }
    }

    /// Set an option from its encoded value.
    pub fn set(&mut self, option: SocketOption, value: &[u8]) -> TransportResult<()> {
        if !option.is_settable() {
            return Err(TransportError::invalid(format!("{option} is read-only")));
        }

        match option.kind() {
            OptionKind::Int32 => {
                let v = decode::<i32>(option, value)?;
                check_range(option, v)?;
            }
            OptionKind::Bool => {
                let v = decode::<i32>(option, value)?;
                if v != 0 && v != 1 {
                    return Err(TransportError::invalid(format!(
                        "{option} takes 0 or 1, got {v}"
                    )));
                }
            }
            OptionKind::UInt64 => {
                decode::<u64>(option, value)?;
            }
            OptionKind::Int64 => {
                let v = decode::<i64>(option, value)?;
                if v < -1 {
                    return Err(TransportError::invalid(format!("{option} must be >= -1")));
                }
            }
            OptionKind::Key => {
                let key = parse_key(option, value)?;
                self.values.insert(option, Bytes::copy_from_slice(&key));
                return Ok(());
            }
            OptionKind::Bytes | OptionKind::String => {}
        }

        match option {
            SocketOption::Subscribe | SocketOption::Unsubscribe => {
                if !matches!(self.kind, SocketType::Sub | SocketType::XSub) {
                    return Err(TransportError::invalid(format!(
                        "{option} is only valid on SUB and XSUB sockets"
                    )));
                }
                self.update_subscriptions(option, value);
                return Ok(());
            }
            SocketOption::RouterHandover if self.kind != SocketType::Router => {
                return Err(TransportError::invalid(format!(
                    "{option} is only valid on ROUTER sockets"
                )));
            }
            SocketOption::Identity | SocketOption::ConnectRoutingId => {
                if value.is_empty() || value.len() > MAX_ROUTING_ID {
                    return Err(TransportError::invalid(format!(
                        "routing id must be 1-{MAX_ROUTING_ID} bytes (got {})",
                        value.len()
                    )));
                }
                if value[0] == 0 {
                    return Err(TransportError::invalid(
                        "routing id cannot start with a null byte",
                    ));
                }
            }
            _ => {}
        }

        self.values.insert(option, Bytes::copy_from_slice(value));
        Ok(())
    }

    /// Read an option into `buf`, returning the number of bytes written.
    pub fn get(&self, option: SocketOption, buf: &mut [u8]) -> TransportResult<usize> {
        if !option.is_gettable() {
            return Err(TransportError::invalid(format!("{option} is write-only")));
        }

        let value = self.value(option);
        match option.kind() {
            OptionKind::Int32 | OptionKind::Bool | OptionKind::UInt64 | OptionKind::Int64 => {
                if buf.len() != value.len() {
                    return Err(TransportError::invalid(format!(
                        "{option} needs a {}-byte buffer, got {}",
                        value.len(),
                        buf.len()
                    )));
                }
                buf.copy_from_slice(&value);
                Ok(value.len())
            }
            OptionKind::Key => {
                if buf.len() == KEY_BYTES {
                    buf.copy_from_slice(&value);
                    Ok(KEY_BYTES)
                } else if buf.len() > KEY_CHARS {
                    let mut raw = [0u8; KEY_BYTES];
                    raw.copy_from_slice(&value);
                    let text = z85::encode_key(&raw);
                    buf[..KEY_CHARS].copy_from_slice(text.as_bytes());
                    buf[KEY_CHARS] = 0;
                    Ok(KEY_CHARS + 1)
                } else {
                    Err(TransportError::invalid(format!(
                        "{option} needs {KEY_BYTES} or at least {} bytes",
                        KEY_CHARS + 1
                    )))
                }
            }
            OptionKind::Bytes => copy_into(option, &value, buf),
            OptionKind::String => {
                let mut text = value.to_vec();
                text.push(0);
                copy_into(option, &text, buf)
            }
        }
    }

    /// Store a value the engine itself maintains (e.g. the last endpoint).
    pub fn set_internal(&mut self, option: SocketOption, value: impl Into<Bytes>) {
        self.values.insert(option, value.into());
    }

    /// Decoded integer value of an option.
    pub fn int(&self, option: SocketOption) -> i32 {
        i32::decode(&self.value(option)).unwrap_or_default()
    }

    /// Decoded boolean value of an option.
    pub fn flag(&self, option: SocketOption) -> bool {
        self.int(option) != 0
    }

    /// Timeout option as a wait bound: `None` blocks forever.
    pub fn timeout(&self, option: SocketOption) -> Option<Duration> {
        let ms = self.int(option);
        u64::try_from(ms).ok().map(Duration::from_millis)
    }

    /// Active subscription prefixes, in subscribe order.
    pub fn subscriptions(&self) -> &[Bytes] {
        &self.subscriptions
    }

    fn value(&self, option: SocketOption) -> Bytes {
        self.values
            .get(&option)
            .cloned()
            .unwrap_or_else(|| default_value(option, self.kind))
    }

    fn update_subscriptions(&mut self, option: SocketOption, topic: &[u8]) {
        if option == SocketOption::Subscribe {
            self.subscriptions.push(Bytes::copy_from_slice(topic));
        } else if let Some(idx) = self.subscriptions.iter().position(|s| s == topic) {
            self.subscriptions.remove(idx);
        }
    }
}

fn decode<T: OptionValue>(option: SocketOption, value: &[u8]) -> TransportResult<T> {
    T::decode(value).map_err(|_| {
        TransportError::invalid(format!(
            "{option} takes {} bytes, got {}",
            T::WIDTH,
            value.len()
        ))
    })
}

fn check_range(option: SocketOption, v: i32) -> TransportResult<()> {
    let min = match option {
        SocketOption::Linger
        | SocketOption::RcvTimeo
        | SocketOption::SndTimeo
        | SocketOption::SndBuf
        | SocketOption::RcvBuf
        | SocketOption::ReconnectIvl => -1,
        SocketOption::Rate => 1,
        _ => 0,
    };
    if v < min {
        return Err(TransportError::invalid(format!(
            "{option} must be >= {min}, got {v}"
        )));
    }
    Ok(())
}

fn parse_key(option: SocketOption, value: &[u8]) -> TransportResult<[u8; KEY_BYTES]> {
    let text = match value.len() {
        KEY_BYTES => {
            let mut raw = [0u8; KEY_BYTES];
            raw.copy_from_slice(value);
            return Ok(raw);
        }
        KEY_CHARS => value,
        // Accept the NUL-terminated form C callers pass
        n if n == KEY_CHARS + 1 && value[KEY_CHARS] == 0 => &value[..KEY_CHARS],
        n => {
            return Err(TransportError::invalid(format!(
                "{option} takes {KEY_BYTES} raw bytes or {KEY_CHARS} Z85 characters, got {n} bytes"
            )))
        }
    };
    std::str::from_utf8(text)
        .ok()
        .and_then(|text| z85::decode_key(text).ok())
        .ok_or_else(|| TransportError::invalid(format!("{option} is not a valid Z85 key")))
}

fn copy_into(option: SocketOption, value: &[u8], buf: &mut [u8]) -> TransportResult<usize> {
    if buf.len() < value.len() {
        return Err(TransportError::invalid(format!(
            "{option} needs {} bytes, buffer holds {}",
            value.len(),
            buf.len()
        )));
    }
    buf[..value.len()].copy_from_slice(value);
    Ok(value.len())
}

fn default_value(option: SocketOption, kind: SocketType) -> Bytes {
    let encoded = match option {
        SocketOption::Affinity => encode_value(0u64),
        SocketOption::MaxMsgSize => encode_value(-1i64),
        SocketOption::Type => encode_value(kind.code()),
        SocketOption::Linger
        | SocketOption::RcvTimeo
        | SocketOption::SndTimeo
        | SocketOption::SndBuf
        | SocketOption::RcvBuf => encode_value(-1i32),
        SocketOption::SndHwm | SocketOption::RcvHwm => encode_value(1000i32),
        SocketOption::Rate | SocketOption::ReconnectIvl | SocketOption::Backlog => {
            encode_value(100i32)
        }
        SocketOption::RecoveryIvl => encode_value(10_000i32),
        SocketOption::CurvePublicKey
        | SocketOption::CurveSecretKey
        | SocketOption::CurveServerKey => vec![0u8; KEY_BYTES],
        SocketOption::Identity | SocketOption::LastEndpoint => Vec::new(),
        _ => match option.kind() {
            OptionKind::Int32 | OptionKind::Bool => encode_value(0i32),
            _ => Vec::new(),
        },
    };
    Bytes::from(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_i32(store: &OptionStore, option: SocketOption) -> i32 {
        let mut buf = [0u8; 4];
        assert_eq!(store.get(option, &mut buf).unwrap(), 4);
        i32::from_ne_bytes(buf)
    }

    #[test]
    fn test_defaults() {
        let store = OptionStore::new(SocketType::Dealer);
        assert_eq!(get_i32(&store, SocketOption::SndHwm), 1000);
        assert_eq!(get_i32(&store, SocketOption::Linger), -1);
        assert_eq!(get_i32(&store, SocketOption::Type), SocketType::Dealer.code());
        assert_eq!(store.timeout(SocketOption::RcvTimeo), None);
    }

    #[test]
    fn test_int_round_trip_and_width() {
        let mut store = OptionStore::new(SocketType::Pair);
        store.set(SocketOption::Linger, &encode_value(1000i32)).unwrap();
        assert_eq!(get_i32(&store, SocketOption::Linger), 1000);

        // Wrong widths are rejected both ways
        assert!(store.set(SocketOption::Linger, &encode_value(5u64)).is_err());
        let mut wide = [0u8; 8];
        assert!(store.get(SocketOption::Linger, &mut wide).is_err());
    }

    #[test]
    fn test_range_checks() {
        let mut store = OptionStore::new(SocketType::Pair);
        assert!(store.set(SocketOption::SndHwm, &encode_value(-1i32)).is_err());
        assert!(store.set(SocketOption::Linger, &encode_value(-2i32)).is_err());
        assert!(store.set(SocketOption::Immediate, &encode_value(2i32)).is_err());
        assert!(store.set(SocketOption::RcvTimeo, &encode_value(-1i32)).is_ok());
    }

    #[test]
    fn test_subscriptions_only_on_sub() {
        let mut pair = OptionStore::new(SocketType::Pair);
        assert!(pair.set(SocketOption::Subscribe, b"topic").is_err());

        let mut sub = OptionStore::new(SocketType::Sub);
        sub.set(SocketOption::Subscribe, b"").unwrap();
        sub.set(SocketOption::Subscribe, b"weather").unwrap();
        sub.set(SocketOption::Unsubscribe, b"").unwrap();
        assert_eq!(sub.subscriptions(), &[Bytes::from_static(b"weather")]);
    }

    #[test]
    fn test_routing_id_rules() {
        let mut store = OptionStore::new(SocketType::Dealer);
        assert!(store.set(SocketOption::Identity, b"").is_err());
        assert!(store.set(SocketOption::Identity, b"\x00peer").is_err());
        assert!(store.set(SocketOption::Identity, &[b'a'; 256]).is_err());
        store.set(SocketOption::Identity, b"worker-01").unwrap();

        let mut buf = [0u8; 255];
        let n = store.get(SocketOption::Identity, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"worker-01");
    }

    #[test]
    fn test_key_forms() {
        let mut store = OptionStore::new(SocketType::Dealer);
        let raw = [7u8; KEY_BYTES];
        let text = z85::encode_key(&raw);
        store.set(SocketOption::CurvePublicKey, text.as_bytes()).unwrap();

        let mut bin = [0u8; KEY_BYTES];
        store.get(SocketOption::CurvePublicKey, &mut bin).unwrap();
        assert_eq!(bin, raw);

        let mut z = [0u8; KEY_CHARS + 1];
        assert_eq!(store.get(SocketOption::CurvePublicKey, &mut z).unwrap(), KEY_CHARS + 1);
        assert_eq!(&z[..KEY_CHARS], text.as_bytes());

        assert!(store.set(SocketOption::CurveSecretKey, b"short").is_err());
    }

    #[test]
    fn test_router_handover_only_on_router() {
        let mut dealer = OptionStore::new(SocketType::Dealer);
        assert!(dealer.set(SocketOption::RouterHandover, &encode_value(1i32)).is_err());
        let mut router = OptionStore::new(SocketType::Router);
        assert!(router.set(SocketOption::RouterHandover, &encode_value(1i32)).is_ok());
    }
}
