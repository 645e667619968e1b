//! The self-describing string format produced by `encrypt` and consumed by `decrypt`.
//!
//! ```text
//! { "type": "plain", "value": "<original string>" }
//! { "type": "encrypt", "keyName": "<name>", "value": "<lowercase hex>" }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::codec::{self, FormatError};

const TYPE_PLAIN: &str = "plain";
const TYPE_ENCRYPTED: &str = "encrypt";

/// Reasons an input string is not a usable envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Not JSON, not an object, or missing fields its `type` requires.
    #[error("malformed envelope: {reason}")]
    Parse { reason: String },
    /// Well-formed but with a `type` this version does not know.
    #[error("unknown envelope type {kind:?}")]
    UnknownVariant { kind: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    /// A value stored without encryption.
    #[serde(rename = "plain")]
    Plain { value: String },
    /// Ciphertext (hex) sealed under `key_name`.
    #[serde(rename = "encrypt")]
    Encrypted {
        #[serde(rename = "keyName")]
        key_name: String,
        value: String,
    },
}

impl Envelope {
    /// Wrap ciphertext bytes for `key_name`.
    pub fn encrypted(key_name: impl Into<String>, ciphertext: &[u8]) -> Self {
        Envelope::Encrypted {
            key_name: key_name.into(),
            value: codec::bytes_to_hex(ciphertext),
        }
    }

    /// Classify and parse an input string.
    pub fn parse(input: &str) -> Result<Self, EnvelopeError> {
        let raw: Value = serde_json::from_str(input).map_err(|err| EnvelopeError::Parse {
            reason: err.to_string(),
        })?;

        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| EnvelopeError::Parse {
                reason: "missing string field `type`".to_string(),
            })?;

        match kind.as_str() {
            TYPE_PLAIN | TYPE_ENCRYPTED => {
                serde_json::from_value(raw).map_err(|err| EnvelopeError::Parse {
                    reason: err.to_string(),
                })
            }
            other => Err(EnvelopeError::UnknownVariant {
                kind: other.to_string(),
            }),
        }
    }

    /// Serialize to the wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode the ciphertext of an `encrypt` envelope.
    /// Returns `Ok(None)` for `plain` envelopes.
    pub fn ciphertext(&self) -> Result<Option<Vec<u8>>, FormatError> {
        match self {
            Envelope::Plain { .. } => Ok(None),
            Envelope::Encrypted { value, .. } => codec::hex_to_bytes(value).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_encrypted_with_wire_field_names() {
        let envelope = Envelope::encrypted("tok", &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(
            envelope.to_json().expect("serialize"),
            r#"{"type":"encrypt","keyName":"tok","value":"deadbeef"}"#
        );
    }

    #[test]
    fn serializes_plain() {
        let envelope = Envelope::Plain {
            value: "hello".into(),
        };
        assert_eq!(
            envelope.to_json().expect("serialize"),
            r#"{"type":"plain","value":"hello"}"#
        );
    }

    #[test]
    fn parses_both_variants() {
        assert_eq!(
            Envelope::parse(r#"{"type":"plain","value":"hello"}"#).expect("plain"),
            Envelope::Plain {
                value: "hello".into()
            }
        );
        assert_eq!(
            Envelope::parse(r#"{"value":"00ff","keyName":"k","type":"encrypt"}"#)
                .expect("encrypted"),
            Envelope::Encrypted {
                key_name: "k".into(),
                value: "00ff".into()
            }
        );
    }

    #[test]
    fn classifies_unknown_type() {
        let err = Envelope::parse(r#"{"type":"mystery"}"#).expect_err("unknown type");
        assert_eq!(
            err,
            EnvelopeError::UnknownVariant {
                kind: "mystery".into()
            }
        );
    }

    #[test]
    fn classifies_garbage_and_missing_fields_as_parse_errors() {
        for input in [
            "not json",
            "42",
            r#""just a string""#,
            r#"{"value":"x"}"#,
            r#"{"type":7}"#,
            r#"{"type":"plain"}"#,
            r#"{"type":"encrypt","value":"00"}"#,
        ] {
            let err = Envelope::parse(input).expect_err(input);
            assert!(matches!(err, EnvelopeError::Parse { .. }), "{input}: {err:?}");
        }
    }

    #[test]
    fn ciphertext_rejects_odd_hex() {
        let envelope = Envelope::Encrypted {
            key_name: "k".into(),
            value: "abc".into(),
        };
        assert_eq!(
            envelope.ciphertext().expect_err("odd hex"),
            FormatError::OddLength { len: 3 }
        );
        assert_eq!(
            Envelope::Plain { value: "v".into() }.ciphertext(),
            Ok(None)
        );
    }
}
