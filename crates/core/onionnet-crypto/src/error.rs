//! Error types for key management operations

use thiserror::Error;

/// Type alias for Results in this crate.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors raised by the key management primitives.
///
/// Every failure mode is a distinct variant so callers can tell a bad
/// encoding apart from a ciphertext that does not authenticate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Text form of a key or ciphertext is not valid base64
    #[error("Invalid encoding: {0}")]
    Encoding(String),

    /// Key material has the wrong length
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Payload exceeds what a single asymmetric seal accepts
    #[error("Payload of {len} bytes exceeds the asymmetric limit of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    /// Ciphertext is shorter than its fixed framing
    #[error("Ciphertext truncated: need at least {min} bytes, got {actual}")]
    Truncated { min: usize, actual: usize },

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Authentication failed: wrong key or tampered ciphertext
    #[error("Decryption failed: ciphertext does not authenticate under this key")]
    Decryption,

    /// Key derivation failed
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}

impl From<base64::DecodeError> for CryptoError {
    fn from(err: base64::DecodeError) -> Self {
        CryptoError::Encoding(err.to_string())
    }
}
