//! Run metadata and schema descriptors attached to every persisted trace.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Semantic version describing the schema of serialized payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes and documentation updates.
    pub patch: u32,
}

impl SchemaVersion {
    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Metadata describing the run that produced a trace.
///
/// `fork` and `preset` select the subject configuration the trace must be
/// replayed against; everything else is free-form and added through
/// [`RunMetadata::insert`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunMetadata {
    /// Fork (subject variant) identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork: Option<String>,
    /// Preset (subject configuration) identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Additional key/value metadata recorded during the run.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RunMetadata {
    /// Creates metadata for the given fork and preset.
    pub fn new(fork: impl Into<String>, preset: impl Into<String>) -> Self {
        Self {
            fork: Some(fork.into()),
            preset: Some(preset.into()),
            extra: BTreeMap::new(),
        }
    }

    /// Records a metadata entry. `fork` and `preset` keys update the typed fields.
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let key = key.into();
        match (key.as_str(), value) {
            ("fork", serde_json::Value::String(fork)) => self.fork = Some(fork),
            ("preset", serde_json::Value::String(preset)) => self.preset = Some(preset),
            (_, value) => {
                self.extra.insert(key, value);
            }
        }
    }

    /// Returns true when no metadata has been recorded.
    pub fn is_empty(&self) -> bool {
        self.fork.is_none() && self.preset.is_none() && self.extra.is_empty()
    }
}
