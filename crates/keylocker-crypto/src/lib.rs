//! Native asymmetric crypto provider for Keylocker.
//! RSA-OAEP comes from the `rsa` crate, X25519 sealed boxes from `crypto_box`.

mod rsa_oaep;
mod sealed_box;

use async_trait::async_trait;
use keylocker_core::{
    Capability, CipherParams, CryptoError, CryptoProvider, KeyPair, KeyParams, PrivateKeyMaterial,
    PublicKeyMaterial,
};
use rand::{rngs::OsRng, RngCore};
use tracing::{debug, instrument};

/// Pure-Rust provider; needs nothing from the host beyond an OS RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCryptoProvider;

impl NativeCryptoProvider {
    pub fn new() -> Self {
        Self
    }

    /// Available when the OS random source answers.
    pub fn probe() -> Capability<Self> {
        let mut sample = [0u8; 16];
        match OsRng.try_fill_bytes(&mut sample) {
            Ok(()) => Capability::Available(Self),
            Err(err) => Capability::unavailable(format!("os rng unavailable: {err}")),
        }
    }
}

#[async_trait]
impl CryptoProvider for NativeCryptoProvider {
    #[instrument(skip_all, fields(algorithm = %params.algorithm()))]
    async fn generate_key_pair(&self, params: &KeyParams) -> Result<KeyPair, CryptoError> {
        let params = params.clone();
        // RSA prime search is CPU bound; keep it off the async workers.
        let pair = tokio::task::spawn_blocking(move || match &params {
            KeyParams::RsaOaep {
                modulus_length,
                public_exponent,
                ..
            } => rsa_oaep::generate(&params, *modulus_length, public_exponent),
            KeyParams::X25519 => Ok(sealed_box::generate()),
        })
        .await
        .map_err(|err| CryptoError::Generation {
            reason: format!("key generation task failed: {err}"),
        })??;
        debug!("generated key pair");
        Ok(pair)
    }

    async fn encrypt(
        &self,
        params: &CipherParams,
        public_key: &PublicKeyMaterial,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        ensure_compatible(params, &public_key.params)?;
        match params {
            CipherParams::RsaOaep { label } => {
                rsa_oaep::encrypt(public_key, label.as_deref(), plaintext)
            }
            CipherParams::X25519 => sealed_box::seal(public_key, plaintext),
        }
    }

    async fn decrypt(
        &self,
        params: &CipherParams,
        private_key: &PrivateKeyMaterial,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        ensure_compatible(params, &private_key.params)?;
        match params {
            CipherParams::RsaOaep { label } => {
                rsa_oaep::decrypt(private_key, label.as_deref(), ciphertext)
            }
            CipherParams::X25519 => sealed_box::open(private_key, ciphertext),
        }
    }
}

fn ensure_compatible(params: &CipherParams, key: &KeyParams) -> Result<(), CryptoError> {
    let (cipher, key) = (params.algorithm(), key.algorithm());
    if cipher != key {
        return Err(CryptoError::AlgorithmMismatch { key, cipher });
    }
    Ok(())
}
