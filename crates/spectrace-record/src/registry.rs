use std::collections::BTreeMap;

use spectrace_core::errors::{ErrorInfo, TraceError};
use spectrace_core::root::Root;
use spectrace_core::value::Traceable;
use tracing::debug;

/// Serialized bytes of a complex value together with what it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Kind reported by the value, e.g. `BeaconState`.
    pub kind: String,
    /// Context collection the artifact belongs to.
    pub collection: String,
    /// Raw serialized bytes.
    pub bytes: Vec<u8>,
}

/// Content-addressed, append-only artifact store.
///
/// Holds exactly one blob per distinct content root for the lifetime of a
/// trace. Iteration is ordered by root so persisted output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<Root, StoredArtifact>,
}

impl ArtifactRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under its content root unless already present and returns the root.
    ///
    /// A root already held by a value of a different kind (or, in debug builds,
    /// different bytes) is a content-hash contract violation.
    pub fn register(&mut self, value: &dyn Traceable, collection: &str) -> Result<Root, TraceError> {
        let root = value.content_root();
        if let Some(existing) = self.artifacts.get(&root) {
            if existing.kind != value.kind() {
                return Err(TraceError::Registry(collision(
                    root,
                    &existing.kind,
                    value.kind(),
                )));
            }
            if cfg!(debug_assertions) && existing.bytes != value.encode()? {
                return Err(TraceError::Registry(
                    collision(root, &existing.kind, value.kind())
                        .with_hint("same root and kind but different serialized bytes"),
                ));
            }
            return Ok(root);
        }
        let bytes = value.encode()?;
        debug!(%root, kind = value.kind(), size = bytes.len(), "registered artifact");
        self.artifacts.insert(
            root,
            StoredArtifact {
                kind: value.kind().to_string(),
                collection: collection.to_string(),
                bytes,
            },
        );
        Ok(root)
    }

    /// Artifact stored under `root`.
    pub fn get(&self, root: &Root) -> Option<&StoredArtifact> {
        self.artifacts.get(root)
    }

    /// Whether an artifact is stored under `root`.
    pub fn contains(&self, root: &Root) -> bool {
        self.artifacts.contains_key(root)
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Iterates over artifacts in root order.
    pub fn iter(&self) -> impl Iterator<Item = (&Root, &StoredArtifact)> {
        self.artifacts.iter()
    }
}

fn collision(root: Root, stored: &str, offered: &str) -> ErrorInfo {
    ErrorInfo::new("registry-collision", "content root already bound to other content")
        .with_context("root", root.to_hex())
        .with_context("stored_kind", stored)
        .with_context("offered_kind", offered)
}

#[cfg(test)]
mod tests {
    use spectrace_core::value::Canonical;

    use super::*;

    struct Fixed {
        kind: &'static str,
        bytes: Vec<u8>,
    }

    impl Canonical for Fixed {
        fn kind(&self) -> &str {
            self.kind
        }

        fn content_root(&self) -> Root {
            Root::digest(b"shared")
        }

        fn encode(&self) -> Result<Vec<u8>, TraceError> {
            Ok(self.bytes.clone())
        }
    }

    #[test]
    fn equal_content_is_stored_once() {
        let mut registry = ArtifactRegistry::new();
        let first = Fixed { kind: "BeaconState", bytes: vec![1, 2, 3] };
        let second = Fixed { kind: "BeaconState", bytes: vec![1, 2, 3] };
        let root = registry.register(&first, "states").unwrap();
        assert_eq!(registry.register(&second, "states").unwrap(), root);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&root).unwrap().bytes, [1, 2, 3]);
    }

    #[test]
    fn root_reused_by_other_kind_is_rejected() {
        let mut registry = ArtifactRegistry::new();
        registry
            .register(&Fixed { kind: "BeaconState", bytes: vec![1] }, "states")
            .unwrap();
        let err = registry
            .register(&Fixed { kind: "BeaconBlock", bytes: vec![1] }, "blocks")
            .unwrap_err();
        assert!(matches!(err, TraceError::Registry(_)));
        assert_eq!(err.info().code, "registry-collision");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    fn root_reused_with_other_bytes_is_rejected_in_debug() {
        let mut registry = ArtifactRegistry::new();
        registry
            .register(&Fixed { kind: "BeaconState", bytes: vec![1] }, "states")
            .unwrap();
        let err = registry
            .register(&Fixed { kind: "BeaconState", bytes: vec![2] }, "states")
            .unwrap_err();
        assert!(err.info().hint.is_some());
    }
}
