//! Opaque record identifiers.
//!
//! An [`Identifier`] names one stored record. Callers only ever obtain one from
//! the backend (`put`, query execution, `new_key`) or by decoding a string that
//! the backend issued earlier. The internal layout is private; the only stable
//! surface is equality, hashing and the canonical text form.

use std::fmt;
use std::str::FromStr;

use bincode::{Decode, Encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KeyDecodeError;

/// Upper bound on what a decoded key may allocate.
const MAX_KEY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Encode, Decode)]
struct KeyParts {
    namespace: String,
    kind: String,
    id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    parts: KeyParts,
}

impl Identifier {
    pub(crate) fn incomplete(namespace: &str, kind: &str) -> Self {
        Self {
            parts: KeyParts {
                namespace: namespace.to_owned(),
                kind: kind.to_owned(),
                id: None,
            },
        }
    }

    pub(crate) fn complete(namespace: &str, kind: &str, id: u64) -> Self {
        Self {
            parts: KeyParts {
                namespace: namespace.to_owned(),
                kind: kind.to_owned(),
                id: Some(id),
            },
        }
    }

    /// Backend-assigned numeric id, absent for placeholders.
    pub(crate) fn id(&self) -> Option<u64> {
        self.parts.id
    }

    /// Name of the collection this identifier belongs to.
    pub fn kind(&self) -> &str {
        &self.parts.kind
    }

    pub fn namespace(&self) -> &str {
        &self.parts.namespace
    }

    /// Whether the identifier is bound to a persisted record. Placeholders
    /// returned by `Storage::new_key` are incomplete.
    pub fn is_complete(&self) -> bool {
        self.parts.id.is_some()
    }

    /// Canonical text form: lowercase hex of the bincode-encoded key.
    pub fn encode(&self) -> String {
        let bytes = bincode::encode_to_vec(&self.parts, bincode::config::standard())
            .expect("encoding strings and integers into a Vec is infallible");
        hex::encode(bytes)
    }

    /// Parse the canonical text form. Only the exact string [`encode`]
    /// produces is accepted, so padded or uppercase input is rejected.
    ///
    /// [`encode`]: Identifier::encode
    pub fn decode(encoded: &str) -> Result<Self, KeyDecodeError> {
        let bytes = hex::decode(encoded)?;
        let config = bincode::config::standard().with_limit::<MAX_KEY_BYTES>();
        let (parts, read): (KeyParts, usize) = bincode::decode_from_slice(&bytes, config)?;
        if read != bytes.len() {
            return Err(KeyDecodeError::TrailingBytes(bytes.len() - read));
        }
        let key = Self { parts };
        if key.encode() != encoded {
            return Err(KeyDecodeError::NotCanonical);
        }
        Ok(key)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Identifier {
    type Err = KeyDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::decode(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Identifier::decode(&encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_key_round_trips() {
        let key = Identifier::complete("", "users", 42);
        let decoded = Identifier::decode(&key.encode()).unwrap();
        assert_eq!(key, decoded);
        assert!(decoded.is_complete());
        assert_eq!(decoded.kind(), "users");
    }

    #[test]
    fn incomplete_key_round_trips() {
        let key = Identifier::incomplete("tenant-a", "posts");
        let decoded: Identifier = key.to_string().parse().unwrap();
        assert_eq!(key, decoded);
        assert!(!decoded.is_complete());
        assert_eq!(decoded.namespace(), "tenant-a");
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(matches!(
            Identifier::decode("not-hex"),
            Err(KeyDecodeError::Hex(_))
        ));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut encoded = Identifier::complete("", "users", 9).encode();
        encoded.truncate(encoded.len() - 2);
        assert!(matches!(
            Identifier::decode(&encoded),
            Err(KeyDecodeError::Payload(_))
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let encoded = format!("{}00", Identifier::complete("", "users", 9).encode());
        assert!(matches!(
            Identifier::decode(&encoded),
            Err(KeyDecodeError::TrailingBytes(1))
        ));
    }

    #[test]
    fn only_the_canonical_form_decodes() {
        // "notes" encodes to hex containing letters, so uppercasing changes it.
        let encoded = Identifier::complete("", "notes", 9).encode();
        assert_ne!(encoded, encoded.to_uppercase());
        assert!(matches!(
            Identifier::decode(&encoded.to_uppercase()),
            Err(KeyDecodeError::NotCanonical)
        ));
        assert!(matches!(
            Identifier::decode(&format!(" {encoded}\n")),
            Err(KeyDecodeError::Hex(_))
        ));
        assert!(Identifier::decode(&encoded).is_ok());
    }

    #[test]
    fn serde_uses_text_form() {
        let key = Identifier::complete("", "users", 3);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", key.encode()));
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
