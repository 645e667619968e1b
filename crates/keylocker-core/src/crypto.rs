use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::codec::serde_hex;

/// Errors produced by crypto providers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Cipher parameters name a different algorithm than the key was generated for.
    #[error("cipher {cipher} cannot be used with a {key} key")]
    AlgorithmMismatch { key: KeyAlgorithm, cipher: KeyAlgorithm },
    /// Stored key bytes could not be loaded.
    #[error("invalid key material: {reason}")]
    InvalidKey { reason: String },
    #[error("key generation failed: {reason}")]
    Generation { reason: String },
    #[error("encryption failed: {reason}")]
    Encryption { reason: String },
    #[error("decryption failed: {reason}")]
    Decryption { reason: String },
}

/// Asymmetric algorithm families a key pair can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    #[serde(rename = "RSA-OAEP")]
    RsaOaep,
    #[serde(rename = "X25519")]
    X25519,
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::RsaOaep => f.write_str("RSA-OAEP"),
            KeyAlgorithm::X25519 => f.write_str("X25519"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-384")]
    Sha384,
    #[serde(rename = "SHA-512")]
    Sha512,
}

/// Key-generation parameters, handed verbatim to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum KeyParams {
    #[serde(rename = "RSA-OAEP")]
    RsaOaep {
        /// Modulus size in bits.
        modulus_length: usize,
        /// Big-endian public exponent (e.g. `010001` for 65537).
        #[serde(with = "serde_hex")]
        public_exponent: Vec<u8>,
        hash: HashAlgorithm,
    },
    /// Curve25519 sealed boxes (ephemeral X25519 + XSalsa20-Poly1305).
    #[serde(rename = "X25519")]
    X25519,
}

impl KeyParams {
    /// RSA-OAEP with exponent 65537.
    pub fn rsa_oaep(modulus_length: usize, hash: HashAlgorithm) -> Self {
        KeyParams::RsaOaep {
            modulus_length,
            public_exponent: vec![0x01, 0x00, 0x01],
            hash,
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyParams::RsaOaep { .. } => KeyAlgorithm::RsaOaep,
            KeyParams::X25519 => KeyAlgorithm::X25519,
        }
    }

    /// Cipher parameters used when none are configured.
    pub fn default_cipher(&self) -> CipherParams {
        match self {
            KeyParams::RsaOaep { .. } => CipherParams::RsaOaep { label: None },
            KeyParams::X25519 => CipherParams::X25519,
        }
    }
}

/// Per-operation cipher parameters, handed verbatim to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum CipherParams {
    #[serde(rename = "RSA-OAEP")]
    RsaOaep {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    #[serde(rename = "X25519")]
    X25519,
}

impl CipherParams {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            CipherParams::RsaOaep { .. } => KeyAlgorithm::RsaOaep,
            CipherParams::X25519 => KeyAlgorithm::X25519,
        }
    }
}

/// Public half of a key pair: generation params plus encoded key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyMaterial {
    pub params: KeyParams,
    #[serde(with = "serde_hex")]
    pub bytes: Vec<u8>,
}

/// Private half of a key pair. Wiped on drop; never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKeyMaterial {
    #[zeroize(skip)]
    pub params: KeyParams,
    #[serde(with = "serde_hex")]
    pub bytes: Vec<u8>,
}

impl fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyMaterial")
            .field("params", &self.params)
            .field("bytes", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key: PublicKeyMaterial,
    pub private_key: PrivateKeyMaterial,
}

impl KeyPair {
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.public_key.params.algorithm()
    }
}

/// Asymmetric primitives the locker depends on (native Rust crates in production).
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    /// Mint a fresh key pair.
    async fn generate_key_pair(&self, params: &KeyParams) -> Result<KeyPair, CryptoError>;

    /// Encrypt `plaintext` to the public half.
    async fn encrypt(
        &self,
        params: &CipherParams,
        public_key: &PublicKeyMaterial,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Recover plaintext with the private half.
    async fn decrypt(
        &self,
        params: &CipherParams,
        private_key: &PrivateKeyMaterial,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;
}
