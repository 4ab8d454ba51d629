//! Asymmetric key pairs and bounded-size sealing.
//!
//! A seal is an ephemeral X25519 agreement with the recipient's static key,
//! stretched with HKDF-SHA256 into an AES-256-GCM key. The sealed form is
//!
//! ```text
//! ephemeral public key (32) || nonce (12) || ciphertext + tag
//! ```
//!
//! A single seal accepts at most [`MAX_SEALED_PAYLOAD`] bytes, the same bound
//! RSA-OAEP-2048 with SHA-256 imposes. Larger payloads must be wrapped with a
//! [`SymmetricKey`](crate::SymmetricKey) that is itself sealed.

use crate::encoding;
use crate::error::{CryptoError, Result};
use crate::symmetric::{NONCE_LEN, TAG_LEN};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use std::fmt;
use x25519_dalek::{EphemeralSecret, StaticSecret};
use zeroize::Zeroizing;

/// Largest payload a single asymmetric seal accepts.
pub const MAX_SEALED_PAYLOAD: usize = 190;

/// Length of an X25519 key in bytes.
pub const KEY_LEN: usize = 32;

/// Fixed framing added by a seal.
pub const SEAL_OVERHEAD: usize = KEY_LEN + NONCE_LEN + TAG_LEN;

const SEAL_INFO: &[u8] = b"onionnet/seal/v1";

/// A relay's public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(x25519_dalek::PublicKey);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(x25519_dalek::PublicKey::from(raw)))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        self.0.as_bytes()
    }

    /// Exports the key as base64 text.
    pub fn to_base64(&self) -> String {
        encoding::encode(self.0.as_bytes())
    }

    /// Imports a key from base64 text.
    pub fn from_base64(text: &str) -> Result<Self> {
        Self::from_bytes(&encoding::decode(text)?)
    }

    /// Seals `payload` so that only the matching private key can open it.
    pub fn seal(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() > MAX_SEALED_PAYLOAD {
            return Err(CryptoError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_SEALED_PAYLOAD,
            });
        }

        let ephemeral = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&self.0);
        let cipher = seal_cipher(shared.as_bytes(), ephemeral_public.as_bytes(), self.as_bytes())?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), payload)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut sealed = Vec::with_capacity(SEAL_OVERHEAD + payload.len());
        sealed.extend_from_slice(ephemeral_public.as_bytes());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base64())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

/// A relay's private key. Zeroized on drop and never printed.
#[derive(Clone)]
pub struct PrivateKey(StaticSecret);

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: bytes.len(),
        })?;
        let raw = Zeroizing::new(raw);
        Ok(Self(StaticSecret::from(*raw)))
    }

    /// Exports the key as base64 text.
    pub fn to_base64(&self) -> String {
        let raw = Zeroizing::new(self.0.to_bytes());
        encoding::encode(raw.as_slice())
    }

    /// Imports a key from base64 text.
    pub fn from_base64(text: &str) -> Result<Self> {
        let raw = Zeroizing::new(encoding::decode(text)?);
        Self::from_bytes(&raw)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(x25519_dalek::PublicKey::from(&self.0))
    }

    /// Opens a payload sealed by [`PublicKey::seal`].
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < SEAL_OVERHEAD {
            return Err(CryptoError::Truncated {
                min: SEAL_OVERHEAD,
                actual: sealed.len(),
            });
        }

        let (ephemeral, rest) = sealed.split_at(KEY_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
        let ephemeral = PublicKey::from_bytes(ephemeral)?;
        let shared = self.0.diffie_hellman(&ephemeral.0);
        let cipher = seal_cipher(
            shared.as_bytes(),
            ephemeral.as_bytes(),
            self.public_key().as_bytes(),
        )?;

        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decryption)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A matching public/private key pair.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl KeyPair {
    /// Generates a key pair from the OS random source.
    pub fn generate() -> Self {
        let private = PrivateKey(StaticSecret::random_from_rng(OsRng));
        Self {
            public: private.public_key(),
            private,
        }
    }
}

fn seal_cipher(shared: &[u8], ephemeral: &[u8], recipient: &[u8]) -> Result<Aes256Gcm> {
    let mut salt = [0u8; 2 * KEY_LEN];
    salt[..KEY_LEN].copy_from_slice(ephemeral);
    salt[KEY_LEN..].copy_from_slice(recipient);

    let hk = Hkdf::<Sha256>::new(Some(&salt), shared);
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(SEAL_INFO, okm.as_mut_slice())
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(okm.as_slice())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_and_open() {
        let pair = KeyPair::generate();
        let sealed = pair.public.seal(b"hello").unwrap();
        assert_eq!(sealed.len(), SEAL_OVERHEAD + 5);
        assert_eq!(pair.private.open(&sealed).unwrap(), b"hello");
    }

    #[test]
    fn payload_bound_is_enforced() {
        let pair = KeyPair::generate();
        assert!(pair.public.seal(&[7u8; MAX_SEALED_PAYLOAD]).is_ok());
        assert_eq!(
            pair.public.seal(&[7u8; MAX_SEALED_PAYLOAD + 1]),
            Err(CryptoError::PayloadTooLarge {
                len: MAX_SEALED_PAYLOAD + 1,
                max: MAX_SEALED_PAYLOAD
            })
        );
    }

    #[test]
    fn wrong_private_key_fails() {
        let alice = KeyPair::generate();
        let mallory = KeyPair::generate();
        let sealed = alice.public.seal(b"for alice").unwrap();
        assert_eq!(mallory.private.open(&sealed), Err(CryptoError::Decryption));
    }

    #[test]
    fn truncated_seal_fails() {
        let pair = KeyPair::generate();
        let sealed = pair.public.seal(b"hello").unwrap();
        assert!(matches!(
            pair.private.open(&sealed[..SEAL_OVERHEAD - 1]),
            Err(CryptoError::Truncated { .. })
        ));
        assert_eq!(
            pair.private.open(&sealed[..sealed.len() - 1]),
            Err(CryptoError::Decryption)
        );
    }

    #[test]
    fn tampered_seal_fails() {
        let pair = KeyPair::generate();
        let mut sealed = pair.public.seal(b"hello").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert_eq!(pair.private.open(&sealed), Err(CryptoError::Decryption));
    }

    #[test]
    fn exported_keys_stay_functional() {
        let pair = KeyPair::generate();
        let public = PublicKey::from_base64(&pair.public.to_base64()).unwrap();
        let private = PrivateKey::from_base64(&pair.private.to_base64()).unwrap();
        assert_eq!(public, pair.public);
        assert_eq!(private.public_key(), pair.public);

        let sealed = public.seal(b"imported").unwrap();
        assert_eq!(private.open(&sealed).unwrap(), b"imported");
    }

    #[test]
    fn debug_hides_private_material() {
        let pair = KeyPair::generate();
        let rendered = format!("{:?}", pair.private);
        assert_eq!(rendered, "PrivateKey(..)");
        assert!(!rendered.contains(&pair.private.to_base64()));
    }
}
