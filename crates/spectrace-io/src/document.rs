use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use spectrace_core::metadata::RunMetadata;
use spectrace_core::root::Root;
use spectrace_core::value::ContextRef;
use spectrace_record::{ErrorDescriptor, ExecutionTrace, TraceStep, TracerConfig};

/// File holding the trace document.
pub const TRACE_FILE: &str = "trace.yaml";
/// File holding run metadata, written when metadata is present.
pub const META_FILE: &str = "meta.yaml";
/// File holding configuration constants, written when any were recorded.
pub const CONFIG_FILE: &str = "config.yaml";
/// File listing artifact digests.
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name of an artifact: `<collection>_<root>.<extension>`.
pub fn artifact_file_name(collection: &str, root: &Root, extension: &str) -> String {
    format!("{collection}_{root}.{extension}")
}

/// Everything a replay needs besides the steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContextSection {
    /// Non-artifact fixtures used by the run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixtures: Vec<String>,
    /// Free-form run parameters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, serde_json::Value>,
    /// Stored artifacts: collection to root to file name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub objects: BTreeMap<String, BTreeMap<Root, String>>,
}

/// The persisted `trace.yaml` document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceDocument {
    /// Run metadata.
    #[serde(default, skip_serializing_if = "RunMetadata::is_empty")]
    pub metadata: RunMetadata,
    /// Fixtures, parameters and artifact index.
    #[serde(default)]
    pub context: ContextSection,
    /// Steps in execution order.
    #[serde(default)]
    pub trace: Vec<TraceStep>,
}

impl TraceDocument {
    /// Builds the document for a recorded trace.
    pub fn from_trace(trace: &ExecutionTrace, config: &TracerConfig) -> Self {
        let mut objects: BTreeMap<String, BTreeMap<Root, String>> = BTreeMap::new();
        for (root, artifact) in trace.registry().iter() {
            let file = artifact_file_name(&artifact.collection, root, &config.artifact_extension);
            objects
                .entry(artifact.collection.clone())
                .or_default()
                .insert(*root, file);
        }
        Self {
            metadata: trace.metadata().clone(),
            context: ContextSection {
                fixtures: trace.fixtures().to_vec(),
                parameters: trace.parameters().clone(),
                objects,
            },
            trace: trace.steps().to_vec(),
        }
    }

    /// File backing a reference, if the artifact is indexed.
    pub fn resolve(&self, reference: &ContextRef) -> Option<&str> {
        self.context
            .objects
            .get(&reference.collection)?
            .get(&reference.root)
            .map(String::as_str)
    }

    /// Collection and file of the artifact stored under `root`, in any collection.
    pub fn find_root(&self, root: &Root) -> Option<(&str, &str)> {
        self.context.objects.iter().find_map(|(collection, files)| {
            files
                .get(root)
                .map(|file| (collection.as_str(), file.as_str()))
        })
    }

    /// Iterates over `(collection, root, file)` for every indexed artifact.
    pub fn artifacts(&self) -> impl Iterator<Item = (&str, &Root, &str)> {
        self.context.objects.iter().flat_map(|(collection, files)| {
            files
                .iter()
                .map(move |(root, file)| (collection.as_str(), root, file.as_str()))
        })
    }

    /// Condensed view used by the CLI.
    pub fn summary(&self) -> TraceSummary {
        let mut steps = BTreeMap::new();
        let mut errors = Vec::new();
        for step in &self.trace {
            *steps.entry(step.op().to_string()).or_insert(0) += 1;
            if let Some(error) = step.as_call().and_then(|call| {
                call.error
                    .as_ref()
                    .map(|error| (call.method.clone(), error.clone()))
            }) {
                errors.push(error);
            }
        }
        let final_state_root = match self.trace.last() {
            Some(TraceStep::AssertState { state_root }) => Some(*state_root),
            _ => None,
        };
        TraceSummary {
            fork: self.metadata.fork.clone(),
            preset: self.metadata.preset.clone(),
            steps,
            errors,
            final_state_root,
            artifacts: self.artifacts().count(),
        }
    }
}

/// Step counts and outcomes of a persisted trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    /// Fork recorded in the metadata.
    pub fork: Option<String>,
    /// Preset recorded in the metadata.
    pub preset: Option<String>,
    /// Number of steps per `op`.
    pub steps: BTreeMap<String, usize>,
    /// Failed calls with their error descriptors.
    pub errors: Vec<(String, ErrorDescriptor)>,
    /// Root asserted by the terminal step.
    pub final_state_root: Option<Root>,
    /// Number of indexed artifacts.
    pub artifacts: usize,
}
