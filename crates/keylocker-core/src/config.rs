use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{CipherParams, HashAlgorithm, KeyAlgorithm, KeyParams};

const MIN_RSA_MODULUS_BITS: usize = 1024;
/// Largest public key the `rsa` crate will load back.
const MAX_RSA_MODULUS_BITS: usize = 4096;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("store.{field} must not be empty")]
    EmptyStoreName { field: &'static str },
    #[error("RSA modulus length {bits} is invalid (need at least 1024 bits and a multiple of 8)")]
    InvalidModulus { bits: usize },
    #[error("RSA modulus length {bits} exceeds the supported maximum of 4096 bits")]
    ModulusTooLarge { bits: usize },
    #[error("RSA public exponent must be non-zero")]
    EmptyExponent,
    #[error("cipher {cipher} does not match key algorithm {key}")]
    CipherMismatch { key: KeyAlgorithm, cipher: KeyAlgorithm },
}

/// Where key records live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Top-level store name (a directory, a keychain service).
    pub collection_name: String,
    /// Named partition within the collection holding key records.
    pub partition_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection_name: "keylocker".to_string(),
            partition_name: "keys".to_string(),
        }
    }
}

/// What `encrypt`/`decrypt` do when the store or crypto capability is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradePolicy {
    /// Hand the input back unchanged.
    #[default]
    FailOpen,
    /// Return `CapabilityAbsent` instead.
    FailClosed,
}

/// Process-wide locker configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockerConfig {
    #[serde(default)]
    pub on_unavailable: DegradePolicy,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default = "default_key_params")]
    pub key: KeyParams,
    /// Falls back to parameters derived from `key` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher: Option<CipherParams>,
}

impl Default for LockerConfig {
    fn default() -> Self {
        Self {
            on_unavailable: DegradePolicy::default(),
            store: StoreConfig::default(),
            key: default_key_params(),
            cipher: None,
        }
    }
}

fn default_key_params() -> KeyParams {
    KeyParams::rsa_oaep(2048, HashAlgorithm::Sha256)
}

impl LockerConfig {
    pub fn new(store: StoreConfig, key: KeyParams) -> Self {
        Self {
            store,
            key,
            ..Self::default()
        }
    }

    /// Configured cipher, or the default for `key`.
    pub fn cipher_params(&self) -> CipherParams {
        self.cipher
            .clone()
            .unwrap_or_else(|| self.key.default_cipher())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.collection_name.trim().is_empty() {
            return Err(ConfigError::EmptyStoreName {
                field: "collection_name",
            });
        }
        if self.store.partition_name.trim().is_empty() {
            return Err(ConfigError::EmptyStoreName {
                field: "partition_name",
            });
        }

        if let KeyParams::RsaOaep {
            modulus_length,
            public_exponent,
            ..
        } = &self.key
        {
            if *modulus_length < MIN_RSA_MODULUS_BITS || modulus_length % 8 != 0 {
                return Err(ConfigError::InvalidModulus {
                    bits: *modulus_length,
                });
            }
            if *modulus_length > MAX_RSA_MODULUS_BITS {
                return Err(ConfigError::ModulusTooLarge {
                    bits: *modulus_length,
                });
            }
            if public_exponent.iter().all(|b| *b == 0) {
                return Err(ConfigError::EmptyExponent);
            }
        }

        let cipher = self.cipher_params().algorithm();
        let key = self.key.algorithm();
        if cipher != key {
            return Err(ConfigError::CipherMismatch { key, cipher });
        }
        Ok(())
    }
}
