//! AES-GCM and AES-GCM-SIV sealing and opening of opaque byte payloads.
//!
//! **Nonces are never caller-supplied.** Every call to [`CipherEngine::seal`]
//! draws a fresh 96-bit nonce from the OS CSPRNG. GCM nonce reuse under one
//! key breaks both confidentiality and authentication.

use std::{fmt, str::FromStr};

use aes_gcm::{
    aead::{consts::U12, rand_core::RngCore, Aead, KeyInit, OsRng},
    aes::Aes192,
    Aes128Gcm, Aes256Gcm, AesGcm,
};
use aes_gcm_siv::{Aes128GcmSiv, Aes256GcmSiv};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Sealer;

/// Byte length of the nonce prefixed to every sealed value (96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the authentication tag appended by both suites.
pub const TAG_LEN: usize = 16;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Errors produced by the cipher layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The key is not a valid size for the selected suite.
    #[error("invalid key length: {len} bytes is not a supported {suite} key size")]
    InvalidKeyLength { len: usize, suite: CipherSuite },

    /// Key material could not be decoded from its configured text form.
    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    /// Tag verification failed: tampered, truncated, or sealed under another key.
    ///
    /// A value that never existed under this key and a value that was
    /// tampered with are indistinguishable here.
    #[error("authentication failed")]
    AuthenticationFailure,

    /// The sealed payload cannot possibly be valid (too short, bad encoding).
    #[error("malformed sealed value: {0}")]
    MalformedInput(String),

    /// The OS random number generator could not produce a nonce.
    #[error("randomness source failed")]
    RandomnessFailure,

    /// The AEAD primitive refused to seal (unreachable with a valid key).
    #[error("aead seal operation failed")]
    SealFailure,

    /// The cipher suite name is not recognised.
    #[error("unknown cipher suite: {0}")]
    UnknownSuite(String),
}

/// Authenticated cipher used by a [`CipherEngine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherSuite {
    /// AES-GCM with 128, 192 or 256-bit keys.
    #[default]
    AesGcm,
    /// AES-GCM-SIV (RFC 8452) with 128 or 256-bit keys.
    AesGcmSiv,
}

impl CipherSuite {
    /// Canonical configuration name of the suite.
    pub fn as_str(&self) -> &'static str {
        match self {
            CipherSuite::AesGcm => "aes-gcm",
            CipherSuite::AesGcmSiv => "aes-gcm-siv",
        }
    }

    /// Key sizes in bytes accepted by the suite.
    pub fn key_lengths(&self) -> &'static [usize] {
        match self {
            CipherSuite::AesGcm => &[16, 24, 32],
            CipherSuite::AesGcmSiv => &[16, 32],
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherSuite {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-gcm" | "aes_gcm" => Ok(CipherSuite::AesGcm),
            "aes-gcm-siv" | "aes_gcm_siv" => Ok(CipherSuite::AesGcmSiv),
            other => Err(CipherError::UnknownSuite(other.to_owned())),
        }
    }
}

/// The keyed AEAD primitive, one variant per supported suite and key size.
enum AeadImpl {
    Gcm128(Aes128Gcm),
    Gcm192(Aes192Gcm),
    Gcm256(Aes256Gcm),
    Siv128(Aes128GcmSiv),
    Siv256(Aes256GcmSiv),
}

impl AeadImpl {
    fn encrypt(&self, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let sealed = match self {
            AeadImpl::Gcm128(c) => c.encrypt(aes_gcm::Nonce::from_slice(nonce), plaintext).ok(),
            AeadImpl::Gcm192(c) => c.encrypt(aes_gcm::Nonce::from_slice(nonce), plaintext).ok(),
            AeadImpl::Gcm256(c) => c.encrypt(aes_gcm::Nonce::from_slice(nonce), plaintext).ok(),
            AeadImpl::Siv128(c) => c
                .encrypt(aes_gcm_siv::Nonce::from_slice(nonce), plaintext)
                .ok(),
            AeadImpl::Siv256(c) => c
                .encrypt(aes_gcm_siv::Nonce::from_slice(nonce), plaintext)
                .ok(),
        };
        sealed.ok_or(CipherError::SealFailure)
    }

    /// `nonce` must be exactly [`NONCE_LEN`] bytes.
    fn decrypt(&self, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let opened = match self {
            AeadImpl::Gcm128(c) => c.decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext).ok(),
            AeadImpl::Gcm192(c) => c.decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext).ok(),
            AeadImpl::Gcm256(c) => c.decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext).ok(),
            AeadImpl::Siv128(c) => c
                .decrypt(aes_gcm_siv::Nonce::from_slice(nonce), ciphertext)
                .ok(),
            AeadImpl::Siv256(c) => c
                .decrypt(aes_gcm_siv::Nonce::from_slice(nonce), ciphertext)
                .ok(),
        };
        opened.ok_or(CipherError::AuthenticationFailure)
    }
}

/// Seals and opens byte payloads under one immutable key.
///
/// The engine holds no mutable state; a single instance can be shared across
/// threads and used for any number of concurrent seal/open calls.
pub struct CipherEngine {
    aead: AeadImpl,
    suite: CipherSuite,
}

impl CipherEngine {
    /// Build an AES-GCM engine. The key must be 16, 24 or 32 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] for any other key size.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        Self::with_suite(key, CipherSuite::AesGcm)
    }

    /// Build an engine for an explicit [`CipherSuite`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] if `key` is not one of
    /// [`CipherSuite::key_lengths`].
    pub fn with_suite(key: &[u8], suite: CipherSuite) -> Result<Self, CipherError> {
        let invalid = || CipherError::InvalidKeyLength {
            len: key.len(),
            suite,
        };
        let aead = match (suite, key.len()) {
            (CipherSuite::AesGcm, 16) => AeadImpl::Gcm128(Aes128Gcm::new_from_slice(key).map_err(|_| invalid())?),
            (CipherSuite::AesGcm, 24) => AeadImpl::Gcm192(Aes192Gcm::new_from_slice(key).map_err(|_| invalid())?),
            (CipherSuite::AesGcm, 32) => AeadImpl::Gcm256(Aes256Gcm::new_from_slice(key).map_err(|_| invalid())?),
            (CipherSuite::AesGcmSiv, 16) => {
                AeadImpl::Siv128(Aes128GcmSiv::new_from_slice(key).map_err(|_| invalid())?)
            }
            (CipherSuite::AesGcmSiv, 32) => {
                AeadImpl::Siv256(Aes256GcmSiv::new_from_slice(key).map_err(|_| invalid())?)
            }
            _ => return Err(invalid()),
        };
        Ok(Self { aead, suite })
    }

    /// The suite this engine was built for.
    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    /// Length of the nonce prefix on every sealed value.
    pub fn nonce_len(&self) -> usize {
        NONCE_LEN
    }

    /// Encrypt and authenticate `plaintext` under a fresh random nonce.
    ///
    /// # Layout of returned bytes
    /// ```text
    /// [ nonce (12 bytes) ][ ciphertext ][ tag (16 bytes) ]
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::RandomnessFailure`] if the OS RNG fails.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|_| CipherError::RandomnessFailure)?;

        let ciphertext = self.aead.encrypt(&nonce, plaintext)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Verify and decrypt a value produced by [`CipherEngine::seal`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::MalformedInput`] if `sealed` is shorter than the
    /// nonce, and [`CipherError::AuthenticationFailure`] if the tag does not
    /// verify. No partial plaintext is ever returned.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        if sealed.len() < NONCE_LEN {
            return Err(CipherError::MalformedInput(format!(
                "{} bytes is shorter than the {NONCE_LEN}-byte nonce",
                sealed.len()
            )));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.aead.decrypt(nonce, ciphertext)
    }
}

impl Sealer for CipherEngine {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        CipherEngine::seal(self, plaintext)
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        CipherEngine::open(self, sealed)
    }
}

impl fmt::Debug for CipherEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherEngine")
            .field("suite", &self.suite)
            .field("key", &"[REDACTED]")
            .finish()
    }
}
