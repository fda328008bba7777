//! AEAD sealing primitives.
//!
//! This module is free of record, schema and codec concerns. It turns key
//! bytes into a [`CipherEngine`] and exposes the [`Sealer`] seam the record
//! orchestrator depends on.
//!
//! # Sealed value format
//!
//! ```text
//! [ nonce (12 bytes) ][ ciphertext + 16-byte tag ]
//! ```
//!
//! The nonce length is a constant of the engine, so the format needs no
//! header to be split again on open.

pub mod cipher;
pub mod key;

pub use cipher::{CipherEngine, CipherError, CipherSuite, NONCE_LEN, TAG_LEN};
pub use key::DataKey;

/// Seal/open seam between the record orchestrator and the cipher.
///
/// Implementations own their key material and generate their own nonces.
#[cfg_attr(test, mockall::automock)]
pub trait Sealer: Send + Sync {
    /// Encrypt and authenticate `plaintext`, returning a self-contained sealed value.
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Verify and decrypt a value produced by [`Sealer::seal`].
    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError>;
}
