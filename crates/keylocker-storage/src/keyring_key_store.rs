use async_trait::async_trait;
use keylocker_core::{Capability, KeyRecord, KeyStore, StoreConfig, StoreError};
use thiserror::Error;
use tracing::instrument;

const PROBE_ACCOUNT: &str = "keylocker-probe";

#[derive(Debug, Error)]
enum RecordCodecError {
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("record for {expected:?} carries id {found:?}")]
    IdMismatch { expected: String, found: String },
}

/// Platforms where `keyring` is built with a backend that outlives a reboot.
/// Elsewhere the crate falls back to a per-process mock store.
const DURABLE_BACKEND: bool = cfg!(any(target_os = "macos", target_os = "windows"));

/// OS keychain-backed key store using the `keyring` crate.
///
/// Each record is one credential: service = collection name,
/// account = `<partition>/<key name>`, secret = the record as JSON.
/// The absence check and the write are two keychain calls, so two processes
/// racing on the same name can both succeed; in-process callers are covered
/// by the locker's re-read on `Duplicate`.
#[derive(Debug, Clone)]
pub struct KeyringKeyStore {
    service: String,
    partition: String,
}

impl KeyringKeyStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            service: config.collection_name.clone(),
            partition: config.partition_name.clone(),
        }
    }

    /// Available only with a durable backend whose keychain answers a lookup.
    pub fn probe(config: &StoreConfig) -> Capability<Self> {
        if !DURABLE_BACKEND {
            return Capability::unavailable(
                "no persistent OS keychain backend on this platform",
            );
        }
        let lookup = keyring::Entry::new(&config.collection_name, PROBE_ACCOUNT)
            .and_then(|entry| entry.get_password());
        match keychain_answered(lookup) {
            Ok(()) => Capability::Available(Self::new(config)),
            Err(err) => Capability::unavailable(format!("keychain unavailable: {err}")),
        }
    }

    fn account(&self, key_name: &str) -> String {
        format!("{}/{}", self.partition, key_name)
    }

    /// Run keychain calls for `key_name` on the blocking pool.
    async fn with_entry<T, F>(&self, key_name: &str, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(keyring::Entry) -> Result<T, StoreError> + Send + 'static,
    {
        let service = self.service.clone();
        let account = self.account(key_name);
        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &account).map_err(keyring_err)?;
            work(entry)
        })
        .await
        .map_err(|e| StoreError::Storage {
            reason: format!("keychain task failed: {e}"),
        })?
    }
}

#[async_trait]
impl KeyStore for KeyringKeyStore {
    #[instrument(skip_all, fields(key_name = %key_name))]
    async fn get(&self, key_name: &str) -> Result<Option<KeyRecord>, StoreError> {
        let expected = key_name.to_string();
        self.with_entry(key_name, move |entry| match entry.get_password() {
            Ok(secret) => decode_record(&secret, &expected)
                .map(Some)
                .map_err(|e| StoreError::Storage {
                    reason: e.to_string(),
                }),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(keyring_err(err)),
        })
        .await
    }

    #[instrument(skip_all, fields(key_name = %record.id))]
    async fn put(&self, record: KeyRecord) -> Result<(), StoreError> {
        let key_name = record.id.clone();
        self.with_entry(&key_name, move |entry| {
            match entry.get_password() {
                Ok(_) => {
                    return Err(StoreError::Duplicate {
                        key_name: record.id.clone(),
                    })
                }
                Err(keyring::Error::NoEntry) => {}
                Err(err) => return Err(keyring_err(err)),
            }

            let secret = encode_record(&record).map_err(|e| StoreError::Storage {
                reason: e.to_string(),
            })?;
            entry.set_password(&secret).map_err(keyring_err)
        })
        .await
    }
}

/// A lookup that finds the entry or reports it missing means the keychain works.
fn keychain_answered(lookup: Result<String, keyring::Error>) -> Result<(), keyring::Error> {
    match lookup {
        Ok(_) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(err) => Err(err),
    }
}

fn encode_record(record: &KeyRecord) -> Result<String, RecordCodecError> {
    serde_json::to_string(record).map_err(|e| RecordCodecError::Encode(e.to_string()))
}

fn decode_record(secret: &str, key_name: &str) -> Result<KeyRecord, RecordCodecError> {
    let record: KeyRecord =
        serde_json::from_str(secret).map_err(|e| RecordCodecError::Decode(e.to_string()))?;
    if record.id != key_name {
        return Err(RecordCodecError::IdMismatch {
            expected: key_name.to_string(),
            found: record.id.clone(),
        });
    }
    Ok(record)
}

fn keyring_err(err: keyring::Error) -> StoreError {
    StoreError::Storage {
        reason: format!("keyring: {err}"),
    }
}
