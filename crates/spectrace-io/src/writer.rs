use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use spectrace_core::errors::{ErrorInfo, TraceError};
use spectrace_core::serde::to_yaml_string;
use spectrace_record::{ExecutionTrace, TracerConfig};
use tracing::{debug, info};

use crate::document::{TraceDocument, CONFIG_FILE, MANIFEST_FILE, META_FILE, TRACE_FILE};
use crate::manifest::{ArtifactManifest, ManifestEntry};

fn write_file(path: &Path, contents: impl AsRef<[u8]>, code: &str) -> Result<(), TraceError> {
    fs::write(path, contents).map_err(|err| TraceError::io(code, path, err))
}

/// Persists a finalized trace into `dir`.
///
/// Writes one file per artifact, the trace document, `meta.yaml` and
/// `config.yaml` when they have content, and the artifact manifest. Returns
/// the document that was written. Open traces and traces left incomplete by a
/// tracer fault are refused with a usage error before anything is written.
pub fn save_trace(
    trace: &ExecutionTrace,
    config: &TracerConfig,
    dir: &Path,
) -> Result<TraceDocument, TraceError> {
    if !trace.is_closed() {
        return Err(TraceError::Usage(
            ErrorInfo::new("trace-open", "only finalized traces can be saved")
                .with_context("path", dir.display().to_string())
                .with_hint("call finalize() before saving"),
        ));
    }
    trace.ensure_intact().map_err(|err| match err {
        TraceError::Usage(info) => {
            TraceError::Usage(info.with_context("path", dir.display().to_string()))
        }
        other => other,
    })?;
    fs::create_dir_all(dir).map_err(|err| TraceError::io("trace-mkdir", dir, err))?;

    let document = TraceDocument::from_trace(trace, config);
    let mut entries = Vec::with_capacity(trace.registry().len());
    for (collection, root, file) in document.artifacts() {
        let artifact = trace.registry().get(root).ok_or_else(|| {
            TraceError::Registry(
                ErrorInfo::new("artifact-missing", "indexed artifact not in registry")
                    .with_context("collection", collection)
                    .with_context("root", root.to_hex()),
            )
        })?;
        write_file(&dir.join(file), &artifact.bytes, "artifact-write")?;
        debug!(file, size = artifact.bytes.len(), "wrote artifact");
        entries.push(ManifestEntry {
            path: file.to_string(),
            root: *root,
            sha256: hex::encode(Sha256::digest(&artifact.bytes)),
        });
    }
    entries.sort_by(|left, right| left.root.cmp(&right.root));

    write_file(&dir.join(TRACE_FILE), to_yaml_string(&document)?, "document-write")?;
    if !document.metadata.is_empty() {
        write_file(&dir.join(META_FILE), to_yaml_string(&document.metadata)?, "meta-write")?;
    }
    if !trace.config().is_empty() {
        write_file(&dir.join(CONFIG_FILE), to_yaml_string(trace.config())?, "config-write")?;
    }
    ArtifactManifest::new(entries).write(&dir.join(MANIFEST_FILE))?;

    info!(
        path = %dir.display(),
        steps = document.trace.len(),
        artifacts = trace.registry().len(),
        "saved trace"
    );
    Ok(document)
}
