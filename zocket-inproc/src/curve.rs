//! Curve key material.
//!
//! Long-term X25519 key pairs, generated from the OS RNG and handed out in
//! Z85 text form the same way `zmq_curve_keypair` does.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zocket_core::transport::CurveKeyPair;
use zocket_core::z85::{self, KEY_BYTES};

/// CURVE secret key (32 bytes)
#[derive(Clone)]
pub struct CurveSecretKey(StaticSecret);

impl CurveSecretKey {
    /// Generate a new random secret key
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(OsRng))
    }

    /// Create from bytes
    pub fn from_bytes(bytes: [u8; KEY_BYTES]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Raw secret bytes
    pub fn to_bytes(&self) -> [u8; KEY_BYTES] {
        self.0.to_bytes()
    }

    /// Derive the matching public key
    pub fn public_key(&self) -> [u8; KEY_BYTES] {
        *PublicKey::from(&self.0).as_bytes()
    }
}

impl std::fmt::Debug for CurveSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CurveSecretKey([REDACTED])")
    }
}

/// Generate a key pair encoded as two 40-character Z85 strings.
pub fn generate_keypair() -> CurveKeyPair {
    let secret = CurveSecretKey::generate();
    CurveKeyPair {
        public: z85::encode_key(&secret.public_key()),
        secret: z85::encode_key(&secret.to_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zocket_core::z85::KEY_CHARS;

    #[test]
    fn test_keypair_shape() {
        let pair = generate_keypair();
        assert_eq!(pair.public.len(), KEY_CHARS);
        assert_eq!(pair.secret.len(), KEY_CHARS);
    }

    #[test]
    fn test_public_key_matches_secret() {
        let pair = generate_keypair();
        let secret = CurveSecretKey::from_bytes(z85::decode_key(&pair.secret).unwrap());
        assert_eq!(z85::encode_key(&secret.public_key()), pair.public);
    }

    #[test]
    fn test_multiple_keypairs_are_unique() {
        let a = generate_keypair();
        let b = generate_keypair();
        // Extremely unlikely to generate same key twice
        assert_ne!(a.public, b.public);
        assert_ne!(a.secret, b.secret);
    }
}
