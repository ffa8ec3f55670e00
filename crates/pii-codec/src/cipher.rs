//! AES-256-CBC encryption and decryption of individual string fields.
//!
//! # Stored format
//!
//! ```text
//! <hex(iv)>:<hex(ciphertext)>
//! ```
//!
//! The IV is 16 random bytes drawn from the OS CSPRNG on every call, so
//! encrypting the same plaintext twice yields two different stored strings.
//! Equality lookup over encrypted fields must therefore go through the blind
//! index (see [`crate::index`]), never through ciphertext comparison.
//!
//! The `:` delimiter never appears in hex output, which is how
//! [`PiiCodec::decrypt_field`](crate::PiiCodec::decrypt_field) distinguishes
//! encrypted values from legacy plaintext records.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of a CBC initialisation vector (16 bytes = one AES block).
pub const IV_LEN: usize = 16;

/// Separator between the hex-encoded IV and ciphertext.
pub const DELIMITER: char = ':';

/// A parsed, encrypted field value.
///
/// The string representation is `<hex(iv)>:<hex(ciphertext)>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedValue {
    /// Raw IV bytes.
    pub iv: [u8; IV_LEN],
    /// Raw ciphertext bytes (always a whole number of AES blocks).
    pub ciphertext: Vec<u8>,
}

impl EncryptedValue {
    /// Encode this value to its canonical string representation.
    pub fn to_string_repr(&self) -> String {
        format!(
            "{}{}{}",
            hex::encode(self.iv),
            DELIMITER,
            hex::encode(&self.ciphertext),
        )
    }

    /// Parse a stored string back into an [`EncryptedValue`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidFormat`] if the string lacks the
    /// delimiter, either part is not valid hex, the IV is not [`IV_LEN`]
    /// bytes, or the ciphertext is empty or not block-aligned.
    pub fn parse(s: &str) -> Result<Self, CipherError> {
        let (iv_hex, ct_hex) = s.split_once(DELIMITER).ok_or(CipherError::InvalidFormat)?;

        let iv_bytes = hex::decode(iv_hex).map_err(|_| CipherError::InvalidFormat)?;
        if iv_bytes.len() != IV_LEN {
            return Err(CipherError::InvalidFormat);
        }
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&iv_bytes);

        let ciphertext = hex::decode(ct_hex).map_err(|_| CipherError::InvalidFormat)?;
        if ciphertext.is_empty() || ciphertext.len() % IV_LEN != 0 {
            return Err(CipherError::InvalidFormat);
        }

        Ok(Self { iv, ciphertext })
    }
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes")]
    InvalidKeyLength,

    /// The stored string does not match the expected `iv:ciphertext` format.
    #[error("invalid encrypted value format")]
    InvalidFormat,

    /// Decryption produced no valid plaintext (wrong key or corrupted data).
    #[error("cipher operation failed")]
    CipherFailure,
}

/// Encrypt a plaintext field using AES-256-CBC with PKCS#7 padding.
///
/// A random 128-bit IV is generated per call via the OS CSPRNG, so repeated
/// calls with identical inputs produce distinct outputs.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
pub fn encrypt_value(plaintext: &[u8], key: &[u8]) -> Result<EncryptedValue, CipherError> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let enc = Aes256CbcEnc::new_from_slices(key, &iv)
        .map_err(|_| CipherError::InvalidKeyLength)?;
    let ciphertext = enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    Ok(EncryptedValue { iv, ciphertext })
}

/// Decrypt an [`EncryptedValue`] back to plaintext bytes.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
/// Returns [`CipherError::CipherFailure`] if the padding check fails, which is
/// what a wrong key or corrupted ciphertext usually looks like.
pub fn decrypt_value(value: &EncryptedValue, key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let dec = Aes256CbcDec::new_from_slices(key, &value.iv)
        .map_err(|_| CipherError::InvalidKeyLength)?;
    dec.decrypt_padded_vec_mut::<Pkcs7>(&value.ciphertext)
        .map_err(|_| CipherError::CipherFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = random_key();
        let plaintext = b"user@example.com";
        let encrypted = encrypt_value(plaintext, &key).unwrap();
        let decrypted = decrypt_value(&encrypted, &key).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn fresh_iv_per_call() {
        let key = random_key();
        let a = encrypt_value(b"same input", &key).unwrap();
        let b = encrypt_value(b"same input", &key).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_key_does_not_recover_plaintext() {
        let key1 = random_key();
        let key2 = random_key();
        let encrypted = encrypt_value(b"secret", &key1).unwrap();
        // CBC has no authentication tag: a wrong key either trips the padding
        // check or yields garbage, but never the original plaintext.
        let out = decrypt_value(&encrypted, &key2);
        assert!(out.is_err() || out.unwrap() != b"secret");
    }

    #[test]
    fn invalid_key_length_rejected() {
        let short_key = vec![0u8; 16];
        assert!(matches!(
            encrypt_value(b"x", &short_key),
            Err(CipherError::InvalidKeyLength)
        ));
    }

    #[test]
    fn string_repr_round_trip() {
        let key = random_key();
        let value = encrypt_value(b"hello", &key).unwrap();
        let s = value.to_string_repr();
        assert!(s.contains(DELIMITER));
        let parsed = EncryptedValue::parse(&s).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn repr_is_hex_delimiter_hex() {
        let key = random_key();
        let s = encrypt_value(b"hi", &key).unwrap().to_string_repr();
        let (iv_hex, ct_hex) = s.split_once(DELIMITER).unwrap();
        assert_eq!(iv_hex.len(), IV_LEN * 2);
        assert_eq!(ct_hex.len(), IV_LEN * 2); // one padded block
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() || c == DELIMITER));
    }

    #[test]
    fn parse_rejects_missing_delimiter() {
        assert!(EncryptedValue::parse("deadbeef").is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!(EncryptedValue::parse("zzzz:deadbeef").is_err());
        assert!(EncryptedValue::parse("00112233445566778899aabbccddeeff:nothex").is_err());
    }

    #[test]
    fn parse_rejects_short_iv() {
        assert!(EncryptedValue::parse("abcd:00112233445566778899aabbccddeeff").is_err());
    }

    #[test]
    fn parse_rejects_unaligned_ciphertext() {
        // 4-byte ciphertext is not a whole AES block.
        assert!(EncryptedValue::parse("00112233445566778899aabbccddeeff:deadbeef").is_err());
    }

    #[test]
    fn parse_rejects_empty_ciphertext() {
        assert!(EncryptedValue::parse("00112233445566778899aabbccddeeff:").is_err());
    }

    #[test]
    fn truncated_value_rejected_by_parser() {
        let key = random_key();
        let s = encrypt_value(b"truncate me please, several blocks long", &key)
            .unwrap()
            .to_string_repr();
        // Dropping one byte of ciphertext breaks block alignment.
        let cut = &s[..s.len() - 2];
        assert!(matches!(
            EncryptedValue::parse(cut),
            Err(CipherError::InvalidFormat)
        ));
    }
}
