//! Anonymous sealed boxes: each message is encrypted with a fresh ephemeral
//! X25519 key and XSalsa20-Poly1305.
//!
//! Ciphertext layout: `ephemeral_public (32) || nonce (24) || box`.

use crypto_box::{aead::Aead, Nonce, PublicKey, SalsaBox, SecretKey};
use keylocker_core::{CryptoError, KeyPair, KeyParams, PrivateKeyMaterial, PublicKeyMaterial};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

pub(crate) fn generate() -> KeyPair {
    let secret = SecretKey::generate(&mut OsRng);
    let public = secret.public_key();
    KeyPair {
        public_key: PublicKeyMaterial {
            params: KeyParams::X25519,
            bytes: public.as_bytes().to_vec(),
        },
        private_key: PrivateKeyMaterial {
            params: KeyParams::X25519,
            bytes: secret.to_bytes().to_vec(),
        },
    }
}

pub(crate) fn seal(key: &PublicKeyMaterial, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let recipient = PublicKey::from(key_array(&key.bytes)?);
    let ephemeral = SecretKey::generate(&mut OsRng);
    let salsa_box = SalsaBox::new(&recipient, &ephemeral);

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let sealed = salsa_box
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption {
            reason: format!("seal failed: {e}"),
        })?;

    let mut out = Vec::with_capacity(KEY_LEN + NONCE_LEN + sealed.len());
    out.extend_from_slice(ephemeral.public_key().as_bytes());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

pub(crate) fn open(key: &PrivateKeyMaterial, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < KEY_LEN + NONCE_LEN {
        return Err(CryptoError::Decryption {
            reason: format!("sealed box too short ({} bytes)", ciphertext.len()),
        });
    }
    let (ephemeral, rest) = ciphertext.split_at(KEY_LEN);
    let (nonce, sealed) = rest.split_at(NONCE_LEN);

    let mut raw = key_array(&key.bytes)?;
    let secret = SecretKey::from(raw);
    raw.zeroize();
    let ephemeral = PublicKey::from(key_array(ephemeral)?);

    SalsaBox::new(&ephemeral, &secret)
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::Decryption {
            reason: "sealed box open failed (wrong key or tampered data)".to_string(),
        })
}

fn key_array(bytes: &[u8]) -> Result<[u8; KEY_LEN], CryptoError> {
    bytes.try_into().map_err(|_| CryptoError::InvalidKey {
        reason: format!("expected {KEY_LEN} bytes, got {}", bytes.len()),
    })
}
