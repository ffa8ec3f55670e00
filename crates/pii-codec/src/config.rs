//! Configuration loading and validation.
//!
//! All values are read from environment variables at startup. There is
//! deliberately no fallback key: a process with a missing or malformed
//! `PII_KEY` must fail configuration loading rather than silently encrypt
//! with a well-known default.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::keys::{KeyBytes, KeyError};

/// Validated codec configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Hex-encoded 256-bit symmetric key. **Required.**
    pub pii_key: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `PII_KEY` is absent, empty, non-hex, or not
    /// exactly 64 hex characters.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.pii_key.trim().is_empty() {
            anyhow::bail!("PII_KEY is required and must not be empty");
        }
        self.key()
            .context("PII_KEY must be 64 hex characters (a 256-bit key)")?;
        Ok(())
    }

    /// Parse the configured key material.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the configured value is not valid hex of the
    /// right length.
    pub fn key(&self) -> Result<KeyBytes, KeyError> {
        KeyBytes::from_hex(&self.pii_key)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material never appears in logs or debug output.
        f.debug_struct("Config")
            .field("pii_key", &"[REDACTED]")
            .field("log_level", &self.log_level)
            .finish()
    }
}
