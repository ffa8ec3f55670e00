//! Deterministic blind-index digests for equality lookup over encrypted data.
//!
//! A blind index is a keyed hash of the *normalised* field value, stored in a
//! sibling field next to the ciphertext. Looking an entity up by a sensitive
//! value means hashing the query input and matching on the index field — no
//! stored record is ever decrypted during a lookup.
//!
//! Normalisation (trim + lowercase) happens before hashing so that
//! `" Foo@Bar.com "` and `"foo@bar.com"` land on the same digest.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex length of a blind-index digest (full HMAC-SHA-256 output, 32 bytes).
pub const DIGEST_HEX_LEN: usize = 64;

/// Canonicalise a value before indexing: trim surrounding whitespace and
/// lowercase, so equivalent user inputs produce the same digest.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Compute the hex-encoded HMAC-SHA-256 digest of `normalized` under `key`.
///
/// Deterministic by construction: the same normalised value and key always
/// produce the same digest, across calls and process restarts.
pub fn digest(normalized: &str, key: &[u8]) -> String {
    // HMAC-SHA-256 accepts keys of any length; this cannot fail.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(normalized.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
