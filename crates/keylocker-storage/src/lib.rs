//! Durable key stores for Keylocker.
//! `FileKeyStore` keeps records on disk; `KeyringKeyStore` keeps them in the OS keychain.

pub mod file_key_store;
pub mod keyring_key_store;

pub use file_key_store::FileKeyStore;
pub use keyring_key_store::KeyringKeyStore;
