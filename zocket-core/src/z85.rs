//! Z85 text encoding for curve keys (ZeroMQ RFC 32).
//!
//! Every 4 bytes of input become 5 printable characters, so a 32-byte key is
//! carried as a 40-character string.

use crate::error::{Error, Result};

/// Length of a raw curve key in bytes.
pub const KEY_BYTES: usize = 32;

/// Length of a Z85-encoded curve key in characters.
pub const KEY_CHARS: usize = 40;

const ALPHABET: &[u8; 85] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ.-:+=^!/*?&<>()[]{}@%$#";

/// Reverse lookup table, indexed by `byte - 32`; 0xFF marks invalid input.
const DECODER: [u8; 96] = build_decoder();

const fn build_decoder() -> [u8; 96] {
    let mut table = [0xFF; 96];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[(ALPHABET[i] - 32) as usize] = i as u8;
        i += 1;
    }
    table
}

/// Encode bytes whose length is a multiple of 4.
pub fn encode(data: &[u8]) -> Result<String> {
    if data.len() % 4 != 0 {
        return Err(Error::invalid_key(format!(
            "Z85 input must be a multiple of 4 bytes (got {})",
            data.len()
        )));
    }

    let mut out = String::with_capacity(data.len() / 4 * 5);
    for chunk in data.chunks_exact(4) {
        let mut value = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let mut block = [0u8; 5];
        for slot in block.iter_mut().rev() {
            *slot = ALPHABET[(value % 85) as usize];
            value /= 85;
        }
        out.extend(block.iter().map(|&b| b as char));
    }
    Ok(out)
}

/// Decode a string whose length is a multiple of 5.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    if bytes.len() % 5 != 0 {
        return Err(Error::invalid_key(format!(
            "Z85 input must be a multiple of 5 characters (got {})",
            bytes.len()
        )));
    }

    let mut out = Vec::with_capacity(bytes.len() / 5 * 4);
    for chunk in bytes.chunks_exact(5) {
        let mut value: u64 = 0;
        for &c in chunk {
            let digit = c
                .checked_sub(32)
                .and_then(|idx| DECODER.get(idx as usize))
                .copied()
                .filter(|&d| d != 0xFF)
                .ok_or_else(|| Error::invalid_key(format!("invalid Z85 character {:?}", c as char)))?;
            value = value * 85 + u64::from(digit);
        }
        let value = u32::try_from(value)
            .map_err(|_| Error::invalid_key("Z85 block overflows 32 bits"))?;
        out.extend_from_slice(&value.to_be_bytes());
    }
    Ok(out)
}

/// Decode a 40-character curve key into its 32 raw bytes.
pub fn decode_key(text: &str) -> Result<[u8; KEY_BYTES]> {
    if text.len() != KEY_CHARS {
        return Err(Error::invalid_key(format!(
            "curve key must be {KEY_CHARS} Z85 characters (got {})",
            text.len()
        )));
    }
    let raw = decode(text)?;
    raw.try_into()
        .map_err(|_| Error::invalid_key("decoded key has wrong length"))
}

/// Encode 32 raw key bytes as 40 Z85 characters.
#[must_use]
pub fn encode_key(key: &[u8; KEY_BYTES]) -> String {
    // 32 is a multiple of 4, so this cannot fail
    encode(key).unwrap_or_default()
}
