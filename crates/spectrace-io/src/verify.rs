use std::fs;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use spectrace_core::errors::{ErrorInfo, TraceError};
use spectrace_core::serde::from_yaml_slice;
use spectrace_record::TraceStep;
use tracing::{debug, info};

use crate::document::{TraceDocument, MANIFEST_FILE, TRACE_FILE};
use crate::manifest::ArtifactManifest;

/// Counts gathered while verifying a trace directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Steps in the document.
    pub steps: usize,
    /// Artifact files checked against the manifest.
    pub artifacts: usize,
    /// References and state roots resolved.
    pub references: usize,
}

/// Reads the trace document stored in `dir`.
pub fn load_trace(dir: &Path) -> Result<TraceDocument, TraceError> {
    let path = dir.join(TRACE_FILE);
    let bytes = fs::read(&path).map_err(|err| TraceError::io("document-read", &path, err))?;
    from_yaml_slice(&bytes).map_err(|err| match err {
        TraceError::Serde(info) => {
            TraceError::Serde(info.with_context("path", path.display().to_string()))
        }
        other => other,
    })
}

fn step_error(info: ErrorInfo, step: usize) -> TraceError {
    TraceError::Verify(info.with_context("step", step.to_string()))
}

/// Checks that a persisted trace is self-consistent and its artifacts are intact.
///
/// Every reference and state root must resolve to an indexed artifact, every
/// artifact file must exist with the digest recorded in the manifest, and an
/// assert-state step may only appear once, as the final step.
pub fn verify_trace(dir: &Path) -> Result<VerifyReport, TraceError> {
    let document = load_trace(dir)?;
    let manifest = ArtifactManifest::load(&dir.join(MANIFEST_FILE))?;
    let mut references = 0usize;
    let last = document.trace.len().saturating_sub(1);

    for (index, step) in document.trace.iter().enumerate() {
        match step {
            TraceStep::LoadState { state_root } | TraceStep::AssertState { state_root } => {
                if document.find_root(state_root).is_none() {
                    return Err(step_error(
                        ErrorInfo::new("unresolved-root", "state root has no artifact")
                            .with_context("root", state_root.to_hex()),
                        index,
                    ));
                }
                references += 1;
            }
            TraceStep::SpecCall(call) => {
                let values = call.input.values().chain(call.assert_output.iter());
                for reference in values.flat_map(|value| value.references()) {
                    if document.resolve(reference).is_none() {
                        return Err(step_error(
                            ErrorInfo::new("unresolved-reference", "reference has no artifact")
                                .with_context("method", call.method.clone())
                                .with_context("reference", reference.to_string()),
                            index,
                        ));
                    }
                    references += 1;
                }
            }
        }
        if matches!(step, TraceStep::AssertState { .. }) && index != last {
            return Err(step_error(
                ErrorInfo::new("assert-state-position", "assert_state must be the final step"),
                index,
            ));
        }
    }

    let mut artifacts = 0usize;
    for (collection, root, file) in document.artifacts() {
        let entry = manifest.entry(file).ok_or_else(|| {
            TraceError::Verify(
                ErrorInfo::new("manifest-missing", "artifact not listed in manifest")
                    .with_context("file", file),
            )
        })?;
        if entry.root != *root {
            return Err(TraceError::Verify(
                ErrorInfo::new("manifest-root", "manifest root differs from document")
                    .with_context("file", file)
                    .with_context("collection", collection),
            ));
        }
        let path = dir.join(file);
        let bytes = fs::read(&path).map_err(|err| TraceError::io("artifact-read", &path, err))?;
        let digest = hex::encode(Sha256::digest(&bytes));
        if digest != entry.sha256 {
            return Err(TraceError::Verify(
                ErrorInfo::new("digest-mismatch", "artifact bytes changed since save")
                    .with_context("file", file)
                    .with_context("expected", entry.sha256.clone())
                    .with_context("actual", digest),
            ));
        }
        debug!(file, "artifact verified");
        artifacts += 1;
    }
    if manifest.artifacts.len() != artifacts {
        return Err(TraceError::Verify(
            ErrorInfo::new("manifest-extra", "manifest lists artifacts the document does not")
                .with_context("manifest", manifest.artifacts.len().to_string())
                .with_context("document", artifacts.to_string()),
        ));
    }

    let report = VerifyReport {
        steps: document.trace.len(),
        artifacts,
        references,
    };
    info!(path = %dir.display(), ?report, "trace verified");
    Ok(report)
}
