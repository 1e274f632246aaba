#![deny(missing_docs)]
#![doc = "Persistence for recorded traces: the trace document, artifact files, manifests, verification and the per-test harness."]

/// Persisted trace document schema.
pub mod document;
/// Per-test recording harness.
pub mod harness;
/// Artifact manifest with content digests.
pub mod manifest;
/// Loading and verifying persisted traces.
pub mod verify;
/// Writing traces to disk.
pub mod writer;

pub use document::{artifact_file_name, ContextSection, TraceDocument, TraceSummary};
pub use harness::{record_test, trace_output_dir, TestId};
pub use manifest::{ArtifactManifest, ManifestEntry};
pub use verify::{load_trace, verify_trace, VerifyReport};
pub use writer::save_trace;
