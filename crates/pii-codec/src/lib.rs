//! Reversible field encryption and deterministic blind indexing for PII.
//!
//! Two transforms, one key:
//!
//! - **Encryption** (AES-256-CBC, random IV per call) protects a field's value
//!   at rest while keeping it recoverable. Because the IV is random, two
//!   encryptions of the same value never produce the same stored string, so
//!   ciphertext equality reveals nothing.
//! - **Blind indexing** (HMAC-SHA-256 over the normalised value) produces a
//!   deterministic digest stored in a sibling field, which is the ONLY way to
//!   run an equality lookup over an encrypted field.
//!
//! [`PiiCodec`] is the entry point; it owns the symmetric key and applies the
//! empty-input, legacy-passthrough, and failure-recovery policies described
//! on its methods. The raw primitives live in [`cipher`] and [`index`].

pub mod cipher;
pub mod codec;
pub mod config;
pub mod index;
pub mod keys;

pub use cipher::{CipherError, DELIMITER, IV_LEN, KEY_LEN};
pub use codec::PiiCodec;
pub use config::Config;
pub use keys::{KeyBytes, KeyError};
