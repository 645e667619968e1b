//! Transparent at-rest encryption of string values under named asymmetric keys.
//!
//! [`KeyLocker::encrypt`] provisions (or reuses) the key pair stored under a
//! logical name and returns a JSON envelope; [`KeyLocker::decrypt`] reverses it.
//! When the key store or crypto provider is unavailable the locker degrades
//! according to [`DegradePolicy`]: fail-open hands values back unchanged.

mod error;
mod locker;

pub use error::LockerError;
pub use keylocker_core::{
    codec, Capability, CipherParams, ConfigError, CryptoError, CryptoProvider, DegradePolicy,
    Envelope, EnvelopeError, KeyPair, KeyParams, KeyRecord, KeyStore, LockerConfig, StoreConfig,
    StoreError,
};
pub use locker::KeyLocker;
