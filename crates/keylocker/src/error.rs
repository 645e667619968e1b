use std::string::FromUtf8Error;

use keylocker_core::{codec::FormatError, ConfigError, CryptoError, StoreError};
use thiserror::Error;

/// Errors surfaced by [`KeyLocker`](crate::KeyLocker). Degraded capability and malformed
/// envelopes are not errors under the fail-open policy.
#[derive(Debug, Error)]
pub enum LockerError {
    /// Only raised under [`DegradePolicy::FailClosed`](keylocker_core::DegradePolicy::FailClosed).
    #[error("{capability} capability unavailable: {reason}")]
    CapabilityAbsent {
        capability: &'static str,
        reason: String,
    },
    #[error("envelope was sealed under key {sealed_under:?}, not {requested:?}")]
    KeyNameMismatch {
        sealed_under: String,
        requested: String,
    },
    #[error("ciphertext is not valid hex: {0}")]
    Format(#[from] FormatError),
    #[error("key store error: {0}")]
    Store(#[from] StoreError),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("decrypted bytes are not UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("envelope serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
