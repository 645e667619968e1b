use keylocker_core::{
    CryptoError, HashAlgorithm, KeyPair, KeyParams, PrivateKeyMaterial, PublicKeyMaterial,
};
use rand::rngs::OsRng;
use rsa::{
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey},
    BigUint, Oaep, RsaPrivateKey, RsaPublicKey,
};
use sha2::{
    digest::{Digest, DynDigest},
    Sha256, Sha384, Sha512,
};

/// Public half is SPKI DER, private half PKCS#8 DER.
pub(crate) fn generate(
    params: &KeyParams,
    modulus_length: usize,
    public_exponent: &[u8],
) -> Result<KeyPair, CryptoError> {
    let exponent = BigUint::from_bytes_be(public_exponent);
    let private = RsaPrivateKey::new_with_exp(&mut OsRng, modulus_length, &exponent)
        .map_err(|e| CryptoError::Generation {
            reason: e.to_string(),
        })?;
    let public = RsaPublicKey::from(&private);

    let private_der = private.to_pkcs8_der().map_err(|e| CryptoError::Generation {
        reason: format!("pkcs8 encode failed: {e}"),
    })?;
    let public_der = public
        .to_public_key_der()
        .map_err(|e| CryptoError::Generation {
            reason: format!("spki encode failed: {e}"),
        })?;

    Ok(KeyPair {
        public_key: PublicKeyMaterial {
            params: params.clone(),
            bytes: public_der.as_bytes().to_vec(),
        },
        private_key: PrivateKeyMaterial {
            params: params.clone(),
            bytes: private_der.as_bytes().to_vec(),
        },
    })
}

pub(crate) fn encrypt(
    key: &PublicKeyMaterial,
    label: Option<&str>,
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let hash = hash_of(&key.params)?;
    let public = RsaPublicKey::from_public_key_der(&key.bytes).map_err(|e| {
        CryptoError::InvalidKey {
            reason: format!("spki decode failed: {e}"),
        }
    })?;
    public
        .encrypt(&mut OsRng, padding(hash, label), plaintext)
        .map_err(|e| CryptoError::Encryption {
            reason: e.to_string(),
        })
}

pub(crate) fn decrypt(
    key: &PrivateKeyMaterial,
    label: Option<&str>,
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let hash = hash_of(&key.params)?;
    let private = RsaPrivateKey::from_pkcs8_der(&key.bytes).map_err(|e| {
        CryptoError::InvalidKey {
            reason: format!("pkcs8 decode failed: {e}"),
        }
    })?;
    private
        .decrypt(padding(hash, label), ciphertext)
        .map_err(|e| CryptoError::Decryption {
            reason: e.to_string(),
        })
}

fn hash_of(params: &KeyParams) -> Result<HashAlgorithm, CryptoError> {
    match params {
        KeyParams::RsaOaep { hash, .. } => Ok(*hash),
        other => Err(CryptoError::InvalidKey {
            reason: format!("expected an RSA-OAEP key, found {}", other.algorithm()),
        }),
    }
}

fn padding(hash: HashAlgorithm, label: Option<&str>) -> Oaep {
    match hash {
        HashAlgorithm::Sha256 => oaep::<Sha256>(label),
        HashAlgorithm::Sha384 => oaep::<Sha384>(label),
        HashAlgorithm::Sha512 => oaep::<Sha512>(label),
    }
}

fn oaep<D>(label: Option<&str>) -> Oaep
where
    D: 'static + Digest + DynDigest + Send + Sync,
{
    match label {
        Some(label) => Oaep::new_with_label::<D, _>(label),
        None => Oaep::new::<D>(),
    }
}
