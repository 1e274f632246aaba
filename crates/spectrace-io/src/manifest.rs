use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use spectrace_core::errors::TraceError;
use spectrace_core::metadata::SchemaVersion;
use spectrace_core::root::Root;
use spectrace_core::serde::{from_json_slice, to_canonical_json_bytes};

/// Digest record for one artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name relative to the trace directory.
    pub path: String,
    /// Content root the file is stored under.
    pub root: Root,
    /// Lowercase hex SHA-256 of the file bytes.
    pub sha256: String,
}

/// Manifest of every artifact written with a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// Schema version of the persisted layout.
    pub schema_version: SchemaVersion,
    /// RFC 3339 timestamp of the save.
    pub created_at: String,
    /// Artifact records ordered by root.
    pub artifacts: Vec<ManifestEntry>,
}

impl ArtifactManifest {
    /// Creates a manifest stamped with the current time.
    pub fn new(artifacts: Vec<ManifestEntry>) -> Self {
        Self {
            schema_version: SchemaVersion::default(),
            created_at: Utc::now().to_rfc3339(),
            artifacts,
        }
    }

    /// Entry for an artifact file.
    pub fn entry(&self, path: &str) -> Option<&ManifestEntry> {
        self.artifacts.iter().find(|entry| entry.path == path)
    }

    /// Writes the manifest as canonical JSON.
    pub fn write(&self, path: &Path) -> Result<(), TraceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| TraceError::io("manifest-mkdir", parent, err))?;
        }
        let bytes = to_canonical_json_bytes(self)?;
        fs::write(path, bytes).map_err(|err| TraceError::io("manifest-write", path, err))
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let bytes = fs::read(path).map_err(|err| TraceError::io("manifest-read", path, err))?;
        from_json_slice(&bytes)
    }
}
