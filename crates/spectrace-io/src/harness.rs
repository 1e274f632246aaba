use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use spectrace_core::metadata::RunMetadata;
use spectrace_record::{RecordingProxy, Subject, TracerConfig};
use tracing::{error, info};

use crate::writer::save_trace;

/// Identifies a recorded test: its module and function name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestId {
    /// Module the test lives in.
    pub module: String,
    /// Test function name.
    pub name: String,
}

impl TestId {
    /// Creates a test identifier.
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.name)
    }
}

/// Directory a test's trace is written to: `<root>/<fork>/<preset>/<module>/<name>`.
pub fn trace_output_dir(root: &Path, metadata: &RunMetadata, test: &TestId) -> PathBuf {
    root.join(metadata.fork.as_deref().unwrap_or("unknown"))
        .join(metadata.preset.as_deref().unwrap_or("unknown"))
        .join(&test.module)
        .join(&test.name)
}

/// Runs `body` against a recording proxy around `subject` and persists the trace.
///
/// The trace is finalized and saved whether the body returns or panics. A save
/// failure is logged and never fails the test; a panic in the body is resumed
/// after the trace is written.
pub fn record_test<S, T, F>(
    subject: S,
    test: &TestId,
    metadata: RunMetadata,
    parameters: BTreeMap<String, serde_json::Value>,
    config: TracerConfig,
    body: F,
) -> T
where
    S: Subject,
    F: FnOnce(&mut RecordingProxy<S>) -> T,
{
    let dir = trace_output_dir(&config.resolved_output_root(), &metadata, test);
    let mut proxy = RecordingProxy::new(subject, config, metadata).with_parameters(parameters);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&mut proxy)));

    proxy.finalize();
    match save_trace(proxy.trace(), proxy.config(), &dir) {
        Ok(document) => info!(%test, steps = document.trace.len(), path = %dir.display(), "recorded test"),
        Err(err) => error!(%test, error = %err, "failed to save trace"),
    }

    match outcome {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    }
}
