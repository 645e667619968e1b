use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::KeyPair;

/// Errors produced by key store implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A record with this id already exists; stores never overwrite.
    #[error("key record already exists: {key_name}")]
    Duplicate { key_name: String },
    /// Underlying storage failure.
    #[error("storage failure: {reason}")]
    Storage { reason: String },
}

/// Persisted association of a logical key name with its key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Logical key name; unique within a store.
    pub id: String,
    pub key: KeyPair,
}

impl KeyRecord {
    pub fn new(id: impl Into<String>, key: KeyPair) -> Self {
        Self { id: id.into(), key }
    }
}

/// Durable mapping from key name to key pair.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Look up a record by exact name. A miss is `Ok(None)`.
    async fn get(&self, key_name: &str) -> Result<Option<KeyRecord>, StoreError>;

    /// Insert a new record. Fails with [`StoreError::Duplicate`] if the id is taken.
    async fn put(&self, record: KeyRecord) -> Result<(), StoreError>;
}

/// In-memory key store for tests and ephemeral sessions.
/// Clones share the same records.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyStore {
    inner: Arc<Mutex<HashMap<String, KeyRecord>>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyStore for InMemoryKeyStore {
    async fn get(&self, key_name: &str) -> Result<Option<KeyRecord>, StoreError> {
        let map = self.inner.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        Ok(map.get(key_name).cloned())
    }

    async fn put(&self, record: KeyRecord) -> Result<(), StoreError> {
        let mut map = self.inner.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;

        if map.contains_key(&record.id) {
            return Err(StoreError::Duplicate {
                key_name: record.id,
            });
        }
        map.insert(record.id.clone(), record);
        Ok(())
    }
}
