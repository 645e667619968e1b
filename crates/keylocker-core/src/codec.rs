//! Byte <-> lowercase hex conversion used by envelopes and persisted keys.

use thiserror::Error;

/// Malformed hex input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// Hex strings carry two digits per byte.
    #[error("hex string has odd length {len}")]
    OddLength { len: usize },
    /// A character outside `[0-9a-fA-F]`.
    #[error("invalid hex character {character:?} at index {index}")]
    InvalidCharacter { character: char, index: usize },
}

/// Encode bytes as lowercase hex, two digits per byte.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string. Odd-length input is rejected, never truncated.
pub fn hex_to_bytes(input: &str) -> Result<Vec<u8>, FormatError> {
    hex::decode(input).map_err(|err| match err {
        hex::FromHexError::OddLength => FormatError::OddLength { len: input.len() },
        hex::FromHexError::InvalidHexCharacter { c, index } => FormatError::InvalidCharacter {
            character: c,
            index,
        },
        // Only produced by fixed-size decoding, which is not used here.
        hex::FromHexError::InvalidStringLength => FormatError::OddLength { len: input.len() },
    })
}

/// Serde adapter storing `Vec<u8>` fields as hex strings.
pub mod serde_hex {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::bytes_to_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        super::hex_to_bytes(&encoded).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_lowercase_two_digits_per_byte() {
        assert_eq!(bytes_to_hex(&[0x00, 0x0f, 0xab, 0xff]), "000fabff");
        assert_eq!(bytes_to_hex(&[]), "");
    }

    #[test]
    fn round_trips_every_byte_value() {
        let bytes: Vec<u8> = (0..=255).collect();
        let encoded = bytes_to_hex(&bytes);
        assert_eq!(encoded.len(), 512);
        assert_eq!(hex_to_bytes(&encoded).expect("decode"), bytes);
    }

    #[test]
    fn accepts_uppercase_digits() {
        assert_eq!(hex_to_bytes("ABcd").expect("decode"), vec![0xab, 0xcd]);
    }

    #[test]
    fn rejects_odd_length() {
        let err = hex_to_bytes("abc").expect_err("odd length must fail");
        assert_eq!(err, FormatError::OddLength { len: 3 });
    }

    #[test]
    fn rejects_non_hex_characters() {
        let err = hex_to_bytes("zz").expect_err("non-hex must fail");
        assert!(matches!(err, FormatError::InvalidCharacter { character: 'z', index: 0 }));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn hex_round_trips_any_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
                let encoded = bytes_to_hex(&bytes);
                prop_assert_eq!(encoded.len(), bytes.len() * 2);
                prop_assert!(encoded.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
                prop_assert_eq!(hex_to_bytes(&encoded).expect("decode"), bytes);
            }

            #[test]
            fn odd_length_hex_is_always_rejected(
                bytes in proptest::collection::vec(any::<u8>(), 0..256),
                extra in "[0-9a-f]",
            ) {
                let odd = format!("{}{extra}", bytes_to_hex(&bytes));
                prop_assert_eq!(
                    hex_to_bytes(&odd),
                    Err(FormatError::OddLength { len: odd.len() })
                );
            }
        }
    }
}
