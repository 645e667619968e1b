//! Core abstractions for Keylocker: key store and crypto provider contracts,
//! capability values, the envelope format, and the hex codec.
//! Concrete stores and providers live in sibling crates.

pub mod capability;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod store;

pub use capability::Capability;
pub use config::{ConfigError, DegradePolicy, LockerConfig, StoreConfig};
pub use crypto::{
    CipherParams, CryptoError, CryptoProvider, HashAlgorithm, KeyAlgorithm, KeyPair, KeyParams,
    PrivateKeyMaterial, PublicKeyMaterial,
};
pub use envelope::{Envelope, EnvelopeError};
pub use store::{InMemoryKeyStore, KeyRecord, KeyStore, StoreError};
