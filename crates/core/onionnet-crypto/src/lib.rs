//! # Onionnet Crypto
//!
//! Key management primitives used by the onionnet relay network:
//!
//! - **Asymmetric key pairs** ([`KeyPair`]) with base64 text export/import
//! - **Bounded sealing** ([`PublicKey::seal`] / [`PrivateKey::open`]) of payloads up to
//!   [`MAX_SEALED_PAYLOAD`] bytes
//! - **Symmetric encryption** ([`SymmetricKey`]) with a fresh random nonce per call
//!
//! Every failure surfaces as a distinct [`CryptoError`]; opening with the wrong key or a
//! truncated ciphertext never yields bytes.
//!
//! ## Example
//!
//! ```rust
//! use onionnet_crypto::{KeyPair, SymmetricKey};
//!
//! # fn main() -> onionnet_crypto::Result<()> {
//! let relay = KeyPair::generate();
//! let sealed = relay.public.seal(b"short payload")?;
//! assert_eq!(relay.private.open(&sealed)?, b"short payload");
//!
//! let session = SymmetricKey::generate();
//! let body = session.encrypt(b"arbitrarily long payload")?;
//! assert_eq!(session.decrypt(&body)?, b"arbitrarily long payload");
//! # Ok(())
//! # }
//! ```

pub mod encoding;
pub mod error;
pub mod keys;
pub mod symmetric;

pub use error::{CryptoError, Result};
pub use keys::{KeyPair, PrivateKey, PublicKey, MAX_SEALED_PAYLOAD, SEAL_OVERHEAD};
pub use symmetric::{SymmetricCiphertext, SymmetricKey};
