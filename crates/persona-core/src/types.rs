use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Implements `Display`, `FromStr` and hex-string serde for a fixed byte array newtype.
///
/// Values serialize as `0x`-prefixed lowercase hex so they can key JSON maps.
macro_rules! hex_newtype {
    ($name:ident, $len:expr) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ProtocolError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(digits).map_err(|e| {
                    ProtocolError::InvalidInput(format!("invalid hex '{}': {}", s, e))
                })?;
                let array: [u8; $len] = bytes.try_into().map_err(|b: Vec<u8>| {
                    ProtocolError::InvalidInput(format!(
                        "expected {} bytes, got {}",
                        $len,
                        b.len()
                    ))
                })?;
                Ok(Self(array))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// A 20-byte account or instance address on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address, used as the "nobody" sentinel.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Derive an address from a domain tag and a sequence of byte parts.
    ///
    /// The address is the first 20 bytes of `BLAKE3(domain || parts...)`.
    pub fn derive(domain: &str, parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain.as_bytes());
        for part in parts {
            hasher.update(part);
        }
        let digest = hasher.finalize();
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest.as_bytes()[..20]);
        Self(out)
    }

    /// Deterministic externally-owned account address for a human-readable label.
    pub fn from_label(label: &str) -> Self {
        Self::derive("persona:account:", &[label.as_bytes()])
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

hex_newtype!(Address, 20);

/// A 32-byte opaque word: document types, names, hashes and role ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Bytes32(pub [u8; 32]);

impl Bytes32 {
    /// The all-zero word, the "empty" sentinel.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Encode a short UTF-8 string into a right-zero-padded word.
    ///
    /// At most 31 bytes are accepted so the encoding stays zero-terminated.
    pub fn from_text(text: &str) -> Result<Self, ProtocolError> {
        let bytes = text.as_bytes();
        if bytes.len() > 31 {
            return Err(ProtocolError::InvalidInput(format!(
                "text must be at most 31 bytes, got {}: {:?}",
                bytes.len(),
                text
            )));
        }
        let mut out = [0u8; 32];
        out[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// Decode a word produced by [`Bytes32::from_text`], dropping trailing zeros.
    pub fn to_text(&self) -> String {
        let end = self.0.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }

    /// BLAKE3 digest of arbitrary data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Whether this is the empty sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Raw word bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

hex_newtype!(Bytes32, 32);

/// Kind of document a persona declares and a validator accepts (e.g. "Passport").
pub type DocumentType = Bytes32;

/// A role id in the registry's capability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Role(pub Bytes32);

impl Role {
    /// Administrator role. Its id is the all-zero word.
    pub const ADMIN: Self = Self(Bytes32::ZERO);

    /// Role id derived from a role name: `BLAKE3(name)`.
    pub fn named(name: &str) -> Self {
        Self(Bytes32::hash(name.as_bytes()))
    }

    /// Capability held by every persona instance created by the registry.
    pub fn persona() -> Self {
        Self::named("PERSONA_ROLE")
    }

    /// Capability held by every validator instance created by the registry.
    pub fn validator() -> Self {
        Self::named("VALIDATOR_ROLE")
    }

    /// Owner eligibility for persona self-registration when roles are required.
    pub fn persona_eligible() -> Self {
        Self::named("PERSONA_ELIGIBLE_ROLE")
    }

    /// Owner eligibility for validator self-registration when roles are required.
    pub fn validator_eligible() -> Self {
        Self::named("VALIDATOR_ELIGIBLE_ROLE")
    }

    /// The underlying role id.
    pub fn id(&self) -> &Bytes32 {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ADMIN {
            write!(f, "ADMIN")
        } else if *self == Self::persona() {
            write!(f, "PERSONA_ROLE")
        } else if *self == Self::validator() {
            write!(f, "VALIDATOR_ROLE")
        } else if *self == Self::persona_eligible() {
            write!(f, "PERSONA_ELIGIBLE_ROLE")
        } else if *self == Self::validator_eligible() {
            write!(f, "VALIDATOR_ELIGIBLE_ROLE")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
