//! [`PiiCodec`]: the policy layer over the cipher and index primitives.
//!
//! This is what persistence code talks to. Beyond the raw crypto it applies
//! the rules that keep entity reads and writes well-behaved:
//!
//! - empty input passes through every operation unchanged,
//! - stored values without the `:` delimiter are treated as legacy plaintext,
//! - decryption failures are recovered (logged, raw value returned) so one
//!   corrupt field can never fail the read of a whole entity,
//! - encryption failures propagate so a write is never silently committed
//!   with plaintext in an encrypted slot.

use tracing::warn;

use crate::cipher::{self, CipherError, EncryptedValue, DELIMITER};
use crate::index;
use crate::keys::KeyBytes;

/// Field-level PII codec bound to one symmetric key.
///
/// All operations are synchronous and take `&self`; aside from the random IV
/// drawn inside [`encrypt_field`](Self::encrypt_field) they are pure functions
/// of their inputs, so a single codec can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct PiiCodec {
    key: KeyBytes,
}

impl PiiCodec {
    /// Build a codec around explicitly injected key material.
    pub fn new(key: KeyBytes) -> Self {
        Self { key }
    }

    /// Encrypt a field value for storage at rest.
    ///
    /// Empty input is returned unchanged: callers may legitimately clear
    /// optional fields, and there is nothing to protect in an empty string.
    /// Non-empty input becomes `<hex(iv)>:<hex(ciphertext)>` with a fresh
    /// random IV, so repeated calls produce distinct outputs.
    ///
    /// # Errors
    ///
    /// Propagates [`CipherError`] on a cipher-layer fault. Callers must treat
    /// this as fatal for the write in progress.
    pub fn encrypt_field(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        let value = cipher::encrypt_value(plaintext.as_bytes(), self.key.as_bytes())?;
        Ok(value.to_string_repr())
    }

    /// Decrypt a stored field value back to plaintext.
    ///
    /// A value without the delimiter is returned unchanged — it predates
    /// encryption and is already plaintext. A value that looks encrypted but
    /// fails to parse or decrypt is ALSO returned unchanged, with a warning
    /// logged: a corrupt field must degrade to showing its raw stored value,
    /// not crash the read path.
    pub fn decrypt_field(&self, stored: &str) -> String {
        if !stored.contains(DELIMITER) {
            return stored.to_owned();
        }
        match self.try_decrypt(stored) {
            Ok(plaintext) => plaintext,
            Err(error) => {
                warn!(%error, "field decryption failed; returning stored value");
                stored.to_owned()
            }
        }
    }

    fn try_decrypt(&self, stored: &str) -> Result<String, CipherError> {
        let value = EncryptedValue::parse(stored)?;
        let bytes = cipher::decrypt_value(&value, self.key.as_bytes())?;
        String::from_utf8(bytes).map_err(|_| CipherError::CipherFailure)
    }

    /// Compute the deterministic blind-index digest for a field value.
    ///
    /// The value is normalised (trimmed, lowercased) before hashing, so
    /// case and whitespace variants of the same logical value share a digest.
    /// Empty input returns an empty string — no index is computed, which
    /// keeps all empty-valued records from colliding on one digest.
    pub fn blind_index(&self, plaintext: &str) -> String {
        if plaintext.is_empty() {
            return String::new();
        }
        index::digest(&index::normalize(plaintext), self.key.as_bytes())
    }
}
