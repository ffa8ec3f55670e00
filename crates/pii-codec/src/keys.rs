//! Symmetric key material handling.

use thiserror::Error;

use crate::cipher::KEY_LEN;

/// Errors produced when parsing key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The decoded key has the wrong length.
    #[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),

    /// The key string is not valid hex.
    #[error("key material is not valid hex")]
    InvalidHex,
}

/// Fixed-size buffer holding exactly [`KEY_LEN`] bytes of key material.
///
/// When this type is dropped the memory is overwritten with zeroes to
/// minimise the window during which plaintext key material lives in RAM.
#[derive(Clone)]
pub struct KeyBytes(Box<[u8; KEY_LEN]>);

impl KeyBytes {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(Box::new(bytes))
    }

    /// Parse hex-encoded key material (exactly `2 * KEY_LEN` hex characters).
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidHex`] for non-hex input and
    /// [`KeyError::InvalidLength`] if the decoded material is not [`KEY_LEN`]
    /// bytes.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|_| KeyError::InvalidHex)?;
        if bytes.len() != KEY_LEN {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(&bytes);
        Ok(Self(buf))
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for KeyBytes {
    fn drop(&mut self) {
        // Zero the key material on drop.
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("KeyBytes([REDACTED])")
    }
}
