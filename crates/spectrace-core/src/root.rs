//! Content roots: fixed-size digests identifying values by content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::errors::{ErrorInfo, TraceError};

/// Length in bytes of a content root.
pub const ROOT_LEN: usize = 32;

/// Canonical 32-byte digest of a value's structured content.
///
/// Rendered as lowercase hex without a `0x` prefix.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Root([u8; ROOT_LEN]);

impl Root {
    /// Wraps raw digest bytes.
    pub const fn from_bytes(bytes: [u8; ROOT_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; ROOT_LEN] {
        &self.0
    }

    /// SHA-256 of the provided bytes.
    pub fn digest(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a 64 character hex string, with or without a `0x` prefix.
    pub fn from_hex(text: &str) -> Result<Self, TraceError> {
        let trimmed = text.strip_prefix("0x").unwrap_or(text);
        let mut bytes = [0u8; ROOT_LEN];
        hex::decode_to_slice(trimmed, &mut bytes).map_err(|err| {
            TraceError::Serde(
                ErrorInfo::new("root-parse", err.to_string()).with_context("root", text),
            )
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Root({})", self.to_hex())
    }
}

impl FromStr for Root {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; ROOT_LEN]> for Root {
    fn from(bytes: [u8; ROOT_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Root {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Root {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Root::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
