use std::collections::BTreeMap;

use spectrace_core::errors::{ErrorInfo, TraceError};
use spectrace_core::metadata::RunMetadata;
use spectrace_core::root::Root;

use crate::registry::ArtifactRegistry;
use crate::step::TraceStep;

/// Ordered output of one recorded run: steps, artifacts and run metadata.
///
/// Appended to while the run is live, finalized once, then read-only.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTrace {
    metadata: RunMetadata,
    parameters: BTreeMap<String, serde_json::Value>,
    config: BTreeMap<String, serde_json::Value>,
    fixtures: Vec<String>,
    steps: Vec<TraceStep>,
    registry: ArtifactRegistry,
    closed: bool,
    fault: Option<ErrorInfo>,
}

impl ExecutionTrace {
    /// Starts a trace for a run described by `metadata`.
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// Fails with a usage error once the trace is finalized or faulted.
    pub fn ensure_open(&self) -> Result<(), TraceError> {
        if self.closed {
            return Err(TraceError::Usage(
                ErrorInfo::new("trace-closed", "trace already finalized")
                    .with_context("steps", self.steps.len().to_string())
                    .with_hint("record calls before finalize()"),
            ));
        }
        self.ensure_intact()
    }

    /// Fails with a usage error when a tracer fault left the trace incomplete.
    pub fn ensure_intact(&self) -> Result<(), TraceError> {
        match &self.fault {
            Some(fault) => Err(TraceError::Usage(
                ErrorInfo::new("trace-faulted", "trace is incomplete after a tracer fault")
                    .with_context("fault", fault.code.clone())
                    .with_context("reason", fault.message.clone())
                    .with_context("steps", self.steps.len().to_string())
                    .with_hint("discard this trace and record the run again"),
            )),
            None => Ok(()),
        }
    }

    /// Marks the trace as faulted. Only the first fault is kept.
    pub(crate) fn poison(&mut self, fault: ErrorInfo) {
        self.fault.get_or_insert(fault);
    }

    /// The tracer fault that left this trace incomplete, if any.
    pub fn fault(&self) -> Option<&ErrorInfo> {
        self.fault.as_ref()
    }

    /// Appends a step.
    pub fn push(&mut self, step: TraceStep) -> Result<(), TraceError> {
        self.ensure_open()?;
        self.steps.push(step);
        Ok(())
    }

    /// Closes the trace, appending an assert-state step when a state was tracked.
    ///
    /// Returns `false` when the trace was already finalized; nothing is appended twice.
    /// A faulted trace is closed without an assertion since its cursor cannot be trusted.
    pub fn finalize(&mut self, final_root: Option<Root>) -> bool {
        if self.closed {
            return false;
        }
        if let (Some(state_root), None) = (final_root, &self.fault) {
            self.steps.push(TraceStep::AssertState { state_root });
        }
        self.closed = true;
        true
    }

    /// Whether [`ExecutionTrace::finalize`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Recorded steps in execution order.
    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Artifacts referenced by the trace.
    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ArtifactRegistry {
        &mut self.registry
    }

    /// Run metadata.
    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut RunMetadata {
        &mut self.metadata
    }

    /// Free-form run parameters.
    pub fn parameters(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.parameters
    }

    pub(crate) fn set_parameters(&mut self, parameters: BTreeMap<String, serde_json::Value>) {
        self.parameters = parameters;
    }

    /// Configuration constants recorded during the run.
    pub fn config(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut BTreeMap<String, serde_json::Value> {
        &mut self.config
    }

    /// Names of non-artifact fixtures used by the run.
    pub fn fixtures(&self) -> &[String] {
        &self.fixtures
    }

    pub(crate) fn add_fixture(&mut self, name: &str) {
        if !self.fixtures.iter().any(|fixture| fixture == name) {
            self.fixtures.push(name.to_string());
        }
    }

    /// Root asserted by the terminal step, once finalized.
    pub fn final_root(&self) -> Option<Root> {
        match self.steps.last() {
            Some(TraceStep::AssertState { state_root }) => Some(*state_root),
            _ => None,
        }
    }
}
