use std::sync::Arc;

use keylocker_core::{
    Capability, CipherParams, CryptoProvider, DegradePolicy, Envelope, KeyPair, KeyRecord,
    KeyStore, LockerConfig, StoreError,
};
use tracing::{debug, instrument, warn};

use crate::LockerError;

/// Encrypts and decrypts strings under lazily provisioned, persisted key pairs.
///
/// Holds no key cache: every call resolves its key from the store.
pub struct KeyLocker<S: KeyStore + ?Sized, C: CryptoProvider + ?Sized> {
    config: LockerConfig,
    store: Capability<Arc<S>>,
    crypto: Capability<Arc<C>>,
}

impl<S: KeyStore + ?Sized, C: CryptoProvider + ?Sized> KeyLocker<S, C> {
    pub fn new(
        config: LockerConfig,
        store: Capability<Arc<S>>,
        crypto: Capability<Arc<C>>,
    ) -> Result<Self, LockerError> {
        config.validate()?;
        if let Some(reason) = store.unavailable_reason() {
            warn!(reason, "key store unavailable; values will not be encrypted");
        }
        if let Some(reason) = crypto.unavailable_reason() {
            warn!(reason, "crypto provider unavailable; values will not be encrypted");
        }
        Ok(Self {
            config,
            store,
            crypto,
        })
    }

    pub fn config(&self) -> &LockerConfig {
        &self.config
    }

    /// True when both the store and the crypto provider are present.
    pub fn is_operational(&self) -> bool {
        self.store.is_available() && self.crypto.is_available()
    }

    /// Encrypt `plaintext` under the key named `key_name`, returning an envelope.
    ///
    /// With a capability missing under fail-open, `plaintext` is returned as is.
    #[instrument(skip_all, fields(key_name = %key_name))]
    pub async fn encrypt(&self, plaintext: &str, key_name: &str) -> Result<String, LockerError> {
        let Some((store, crypto)) = self.capabilities()? else {
            return Ok(plaintext.to_string());
        };

        let key = provision(&self.config, store, crypto, key_name).await?;
        let ciphertext = crypto
            .encrypt(&self.cipher_for(&key), &key.public_key, plaintext.as_bytes())
            .await?;

        Ok(Envelope::encrypted(key_name, &ciphertext).to_json()?)
    }

    /// Recover the plaintext behind an envelope produced by [`encrypt`](Self::encrypt).
    ///
    /// Inputs that are not envelopes are logged and returned unchanged.
    #[instrument(skip_all, fields(key_name = %key_name))]
    pub async fn decrypt(&self, input: &str, key_name: &str) -> Result<String, LockerError> {
        let envelope = match Envelope::parse(input) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "input is not a recognised envelope; returning it unchanged");
                return Ok(input.to_string());
            }
        };

        let sealed_under = match &envelope {
            Envelope::Plain { value } => return Ok(value.clone()),
            Envelope::Encrypted { key_name, .. } => key_name,
        };

        let Some((store, crypto)) = self.capabilities()? else {
            return Ok(input.to_string());
        };

        if sealed_under != key_name {
            return Err(LockerError::KeyNameMismatch {
                sealed_under: sealed_under.clone(),
                requested: key_name.to_string(),
            });
        }

        // Malformed hex aborts before any key is minted.
        let ciphertext = envelope.ciphertext()?.unwrap_or_default();
        let key = provision(&self.config, store, crypto, key_name).await?;
        let plaintext = crypto
            .decrypt(&self.cipher_for(&key), &key.private_key, &ciphertext)
            .await?;

        Ok(String::from_utf8(plaintext)?)
    }

    /// Fetch the key pair stored under `key_name`, generating and persisting one if absent.
    #[instrument(skip_all, fields(key_name = %key_name))]
    pub async fn get_or_create_key(&self, key_name: &str) -> Result<KeyPair, LockerError> {
        let (store, crypto) = self.resolve()?;
        provision(&self.config, store, crypto, key_name).await
    }

    /// Configured cipher, or the stored key's default when none is set.
    fn cipher_for(&self, key: &KeyPair) -> CipherParams {
        match &self.config.cipher {
            Some(cipher) => cipher.clone(),
            None => key.public_key.params.default_cipher(),
        }
    }

    /// `None` means degrade to passthrough.
    fn capabilities(&self) -> Result<Option<(&S, &C)>, LockerError> {
        match self.config.on_unavailable {
            DegradePolicy::FailOpen => Ok(self.resolve().ok()),
            DegradePolicy::FailClosed => self.resolve().map(Some),
        }
    }

    fn resolve(&self) -> Result<(&S, &C), LockerError> {
        let store = match &self.store {
            Capability::Available(store) => store.as_ref(),
            Capability::Unavailable { reason } => {
                return Err(LockerError::CapabilityAbsent {
                    capability: "key store",
                    reason: reason.clone(),
                })
            }
        };
        let crypto = match &self.crypto {
            Capability::Available(crypto) => crypto.as_ref(),
            Capability::Unavailable { reason } => {
                return Err(LockerError::CapabilityAbsent {
                    capability: "crypto",
                    reason: reason.clone(),
                })
            }
        };
        Ok((store, crypto))
    }
}

/// Get-or-create. First writer wins: a `Duplicate` on insert means another
/// caller persisted a pair first, and that stored pair is used instead.
async fn provision<S, C>(
    config: &LockerConfig,
    store: &S,
    crypto: &C,
    key_name: &str,
) -> Result<KeyPair, LockerError>
where
    S: KeyStore + ?Sized,
    C: CryptoProvider + ?Sized,
{
    if let Some(record) = store.get(key_name).await? {
        debug!("using stored key pair");
        return Ok(record.key);
    }

    debug!(algorithm = %config.key.algorithm(), "no stored key pair; generating");
    let key = crypto.generate_key_pair(&config.key).await?;

    match store.put(KeyRecord::new(key_name, key.clone())).await {
        Ok(()) => Ok(key),
        Err(StoreError::Duplicate { .. }) => {
            debug!("lost key creation race; adopting stored key pair");
            store
                .get(key_name)
                .await?
                .map(|record| record.key)
                .ok_or_else(|| {
                    LockerError::Store(StoreError::Storage {
                        reason: format!("record {key_name:?} vanished after duplicate insert"),
                    })
                })
        }
        Err(err) => Err(err.into()),
    }
}
