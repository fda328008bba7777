//! [`DataKey`]: owned AES key material loaded from configuration.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::cipher::CipherError;

/// Key sizes in bytes accepted by at least one [`super::CipherSuite`].
pub const KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// Raw AES key bytes.
///
/// The buffer is overwritten with zeroes when dropped, and `Debug` never
/// prints it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DataKey(Vec<u8>);

impl DataKey {
    /// Wrap raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] unless `bytes` is 16, 24 or 32
    /// bytes long. Suite-specific sizes are checked again by the engine.
    pub fn new(bytes: Vec<u8>) -> Result<Self, CipherError> {
        if !KEY_LENGTHS.contains(&bytes.len()) {
            let len = bytes.len();
            drop(Zeroizing::new(bytes));
            return Err(CipherError::InvalidKeyLength {
                len,
                suite: Default::default(),
            });
        }
        Ok(Self(bytes))
    }

    /// Decode a standard-alphabet base64 key, as stored in `DATA_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyEncoding`] if the text is not base64
    /// and [`CipherError::InvalidKeyLength`] if the decoded length is wrong.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CipherError::InvalidKeyEncoding(e.to_string()))?;
        Self::new(bytes)
    }

    /// Borrow the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a constructed key; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataKey([REDACTED])")
    }
}
