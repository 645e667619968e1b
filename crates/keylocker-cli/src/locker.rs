use std::{path::PathBuf, sync::Arc};

use crate::config::{Config, StoreBackend};
use color_eyre::Result;
use dirs::data_dir;
use keylocker::{Capability, KeyLocker, KeyStore};
use keylocker_crypto::NativeCryptoProvider;
use keylocker_storage::{FileKeyStore, KeyringKeyStore};
use tracing::debug;

/// Locker as wired by the CLI: backend picked at runtime.
pub type CliLocker = KeyLocker<dyn KeyStore, NativeCryptoProvider>;

/// Resolve the default data directory for Keylocker.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("keylocker"))
}

/// Probe the configured store backend.
pub fn store_capability(config: &Config) -> Result<Capability<Arc<dyn KeyStore>>> {
    let store_config = &config.locker.store;
    let capability = match config.backend {
        StoreBackend::File => {
            let root = match &config.data_dir {
                Some(root) => root.clone(),
                None => default_data_dir()?,
            };
            debug!(?root, "probing file key store");
            FileKeyStore::probe(root, store_config).map(|s| Arc::new(s) as Arc<dyn KeyStore>)
        }
        StoreBackend::Keyring => {
            debug!(service = %store_config.collection_name, "probing keyring key store");
            KeyringKeyStore::probe(store_config).map(|s| Arc::new(s) as Arc<dyn KeyStore>)
        }
    };
    Ok(capability)
}

/// Build a locker from config, probing the store and the crypto provider.
pub fn locker_from_config(config: &Config) -> Result<CliLocker> {
    let store = store_capability(config)?;
    let crypto = NativeCryptoProvider::probe().map(Arc::new);
    KeyLocker::new(config.locker.clone(), store, crypto)
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))
}
