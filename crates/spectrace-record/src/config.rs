use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spectrace_core::errors::{ErrorInfo, TraceError};

/// Environment variable overriding [`TracerConfig::output_root`].
pub const OUTPUT_ROOT_ENV: &str = "SPECTRACE_DIR";

/// Instance-scoped recorder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Artifact kind to context collection, e.g. `BeaconState -> states`.
    /// Complex values of unmapped kinds are recorded as placeholders.
    pub collections: BTreeMap<String, String>,
    /// Names of non-artifact fixtures listed in the document context.
    pub fixtures: BTreeSet<String>,
    /// Name of the parameter carrying the distinguished state.
    pub state_param: String,
    /// Extension used for artifact files.
    pub artifact_extension: String,
    /// Root directory under which traces are written.
    pub output_root: PathBuf,
}

impl Default for TracerConfig {
    fn default() -> Self {
        let collections = [
            ("BeaconState", "states"),
            ("BeaconBlock", "blocks"),
            ("Attestation", "attestations"),
        ]
        .into_iter()
        .map(|(kind, collection)| (kind.to_string(), collection.to_string()))
        .collect();
        Self {
            collections,
            fixtures: BTreeSet::from(["store".to_string()]),
            state_param: "state".to_string(),
            artifact_extension: "ssz".to_string(),
            output_root: PathBuf::from("traces"),
        }
    }
}

impl TracerConfig {
    /// Loads a configuration from a YAML file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let contents = fs::read(path).map_err(|err| TraceError::io("config-read", path, err))?;
        serde_yaml::from_slice(&contents).map_err(|err| {
            TraceError::Serde(
                ErrorInfo::new("config-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Maps an additional artifact kind to a collection.
    pub fn with_collection(mut self, kind: impl Into<String>, collection: impl Into<String>) -> Self {
        self.collections.insert(kind.into(), collection.into());
        self
    }

    /// Adds a non-artifact fixture name.
    pub fn with_fixture(mut self, name: impl Into<String>) -> Self {
        self.fixtures.insert(name.into());
        self
    }

    /// Collection for an artifact kind, if it is tracked.
    pub fn collection_for(&self, kind: &str) -> Option<&str> {
        self.collections.get(kind).map(String::as_str)
    }

    /// Output root after applying the environment override.
    pub fn resolved_output_root(&self) -> PathBuf {
        match env::var_os(OUTPUT_ROOT_ENV) {
            Some(root) if !root.is_empty() => PathBuf::from(root),
            _ => self.output_root.clone(),
        }
    }
}
