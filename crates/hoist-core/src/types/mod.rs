//! Shared ledger identifiers: addresses, object ids and object references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Length in bytes of addresses, object ids and digests.
pub const ADDRESS_LENGTH: usize = 32;

/// A 32-byte ledger address.
///
/// Signer identities, object ids and package ids share this representation.
/// Parsing accepts the short forms the ledger tooling prints (`0x2`) by
/// left-padding with zeros.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

/// Address of the account that signs and sends transactions.
pub type Identity = Address;
/// Address of any on-ledger object.
pub type ObjectId = Address;
/// Address of a published package.
pub type PackageId = Address;

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Address with the given value in its last byte (`0x1`, `0x2`, ...).
    pub const fn from_short(value: u8) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes[ADDRESS_LENGTH - 1] = value;
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Full-width `0x`-prefixed lowercase hex.
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Hex with the leading zero padding removed.
    pub fn to_short_literal(&self) -> String {
        normalize_package_id(&self.to_hex_literal())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidIdentity {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let digits = s
            .trim()
            .strip_prefix("0x")
            .or_else(|| s.trim().strip_prefix("0X"))
            .unwrap_or(s.trim());
        if digits.is_empty() {
            return Err(invalid("no hex digits"));
        }
        if digits.len() > ADDRESS_LENGTH * 2 {
            return Err(invalid("longer than 32 bytes"));
        }

        let padded = format!("{:0>width$}", digits, width = ADDRESS_LENGTH * 2);
        let mut bytes = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(&padded, &mut bytes).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_literal())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_short_literal())
    }
}

/// Hex literal in JSON; 32 raw bytes in the binary transaction format.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex_literal())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            <[u8; ADDRESS_LENGTH]>::deserialize(deserializer).map(Self)
        }
    }
}

/// Strip the canonical leading-zero padding from a package id literal.
///
/// `0x00000abc`, `0x0abc` and `0xabc` all normalize to `0xabc`; an all-zero
/// id normalizes to `0x0`. Normalizing twice gives the same result.
pub fn normalize_package_id(id: &str) -> String {
    let trimmed = id.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", significant.to_ascii_lowercase())
    }
}

/// 32-byte object content digest, rendered as base58 by the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectDigest([u8; ADDRESS_LENGTH]);

impl ObjectDigest {
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl FromStr for ObjectDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s).into_vec().map_err(|e| Error::InvalidIdentity {
            input: s.to_string(),
            reason: format!("invalid base58 digest: {e}"),
        })?;
        let bytes: [u8; ADDRESS_LENGTH] =
            bytes
                .try_into()
                .map_err(|v: Vec<u8>| Error::InvalidIdentity {
                    input: s.to_string(),
                    reason: format!("digest must be 32 bytes, got {}", v.len()),
                })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectDigest({self})")
    }
}

impl<'de> Deserialize<'de> for ObjectDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            let len = bytes.len();
            bytes.try_into().map(Self).map_err(|_| {
                serde::de::Error::invalid_length(len, &"a 32-byte digest")
            })
        }
    }
}

/// Base58 in JSON; a length-prefixed byte string in the binary format.
impl Serialize for ObjectDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

/// Reference to a specific version of an owned object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectRef {
    pub object_id: ObjectId,
    pub version: u64,
    pub digest: ObjectDigest,
}

/// Ledger versions arrive as decimal strings; accept plain numbers too.
pub(crate) fn deserialize_u64_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        Raw::Number(n) => Ok(n),
    }
}
