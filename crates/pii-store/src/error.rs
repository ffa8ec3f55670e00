//! Error type shared by the repositories.

use thiserror::Error;

use crate::store::StoreError;
use pii_codec::CipherError;

/// Top-level repository error.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying collection rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Field encryption failed; the write was not committed.
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// An entity could not be converted to or from its document form.
    #[error("entity serialisation failed: {0}")]
    Serialisation(#[from] serde_json::Error),
}
