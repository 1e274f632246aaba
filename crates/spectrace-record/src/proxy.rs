use std::collections::BTreeMap;
use std::ops::Deref;

use indexmap::IndexMap;
use spectrace_core::errors::{ErrorInfo, TraceError};
use spectrace_core::metadata::RunMetadata;
use spectrace_core::root::Root;
use spectrace_core::value::{Value, ValueRef};
use tracing::{debug, error, info, warn};

use crate::bind::bind;
use crate::config::TracerConfig;
use crate::cursor::StateCursor;
use crate::error::CallError;
use crate::serializer::Serializer;
use crate::step::{CallStep, ErrorDescriptor, TraceStep};
use crate::subject::{is_traced_operation, BoundArgs, CallArgs, OperationSpec, Subject};
use crate::trace::ExecutionTrace;

/// Call interceptor wrapping a [`Subject`].
///
/// Every call goes through [`RecordingProxy::call`]. Arguments are bound to
/// parameter names before the subject sees them unchanged, and a state whose
/// root differs from the cursor gets a load-state step ahead of the call.
/// Subject results and errors are returned exactly as produced.
/// Non-operation members of the subject are reachable through `Deref`.
pub struct RecordingProxy<S: Subject> {
    subject: S,
    operations: BTreeMap<String, OperationSpec>,
    config: TracerConfig,
    trace: ExecutionTrace,
    cursor: StateCursor,
}

impl<S: Subject> RecordingProxy<S> {
    /// Wraps `subject`, indexing its operation descriptors once.
    pub fn new(subject: S, config: TracerConfig, metadata: RunMetadata) -> Self {
        let operations = subject
            .operations()
            .into_iter()
            .map(|operation| (operation.name.clone(), operation))
            .collect();
        Self {
            subject,
            operations,
            config,
            trace: ExecutionTrace::new(metadata),
            cursor: StateCursor::new(),
        }
    }

    /// Sets the free-form run parameters.
    pub fn with_parameters(mut self, parameters: BTreeMap<String, serde_json::Value>) -> Self {
        self.trace.set_parameters(parameters);
        self
    }

    /// Seeds the trace with a fixture supplied by the harness.
    ///
    /// Complex values of tracked kinds are stored as artifacts; other values are
    /// listed by name when the name is a configured fixture and ignored otherwise.
    pub fn register_fixture(&mut self, name: &str, value: &Value<'_>) -> Result<(), TraceError> {
        self.trace.ensure_open()?;
        let tracked = value
            .as_object()
            .is_some_and(|object| self.config.collection_for(object.kind()).is_some());
        if tracked {
            let reference =
                Serializer::new(&self.config).serialize(value, self.trace.registry_mut())?;
            debug!(fixture = name, ?reference, "seeded artifact fixture");
        } else if self.config.fixtures.contains(name) {
            self.trace.add_fixture(name);
        } else {
            debug!(fixture = name, "ignoring untracked fixture");
        }
        Ok(())
    }

    /// Records a metadata entry.
    pub fn meta(&mut self, key: impl Into<String>, value: serde_json::Value) -> Result<(), TraceError> {
        self.trace.ensure_open()?;
        self.trace.metadata_mut().insert(key, value);
        Ok(())
    }

    /// Records configuration constants.
    pub fn configure(
        &mut self,
        entries: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> Result<(), TraceError> {
        self.trace.ensure_open()?;
        self.trace.config_mut().extend(entries);
        Ok(())
    }

    /// Invokes `operation` on the subject, recording it when its name is traced.
    pub fn call(
        &mut self,
        operation: &str,
        args: CallArgs<'_>,
    ) -> Result<Value<'static>, CallError<S::Error>> {
        let spec = self.operations.get(operation).ok_or_else(|| {
            TraceError::Usage(
                ErrorInfo::new("unknown-operation", "subject does not expose this operation")
                    .with_context("operation", operation),
            )
        })?;
        let mut bound = bind(spec, args)?;
        if !is_traced_operation(operation) {
            return self
                .subject
                .invoke(operation, &mut bound)
                .map_err(CallError::Subject);
        }
        self.trace.ensure_open()?;

        let input = self.serialize_inputs(&bound)?;
        let pre_root = input
            .get(&self.config.state_param)
            .and_then(ValueRef::as_reference)
            .map(|reference| reference.root);
        if let Some(root) = pre_root {
            let previous = self.cursor.current();
            if self.cursor.observe(root) {
                match previous {
                    Some(previous) => {
                        warn!(%previous, %root, operation, "state changed out of band")
                    }
                    None => debug!(%root, operation, "first state observed"),
                }
                self.trace.push(TraceStep::LoadState { state_root: root })?;
            }
        }

        let outcome = self.subject.invoke(operation, &mut bound);

        let mut step = CallStep::new(operation, input);
        let mut fault = None;
        match &outcome {
            Ok(value) => match self.serialize_output(value) {
                Ok(output) => step.assert_output = output,
                Err(err) => fault = Some(err),
            },
            Err(err) => {
                step.error = Some(ErrorDescriptor {
                    kind: S::error_kind(err),
                    message: err.to_string(),
                });
            }
        }
        debug!(
            operation,
            inputs = step.input.len(),
            failed = step.error.is_some(),
            "recorded spec call"
        );
        self.trace.push(TraceStep::SpecCall(step))?;

        if let Some(pre_root) = pre_root {
            if let Err(err) = self.track_post_state(&bound, pre_root) {
                fault.get_or_insert(err);
            }
        }
        if let Some(fault) = fault {
            error!(operation, error = %fault, "tracer fault after subject ran; trace is incomplete");
            self.trace.poison(fault.info().clone());
            if outcome.is_ok() {
                return Err(fault.into());
            }
        }
        outcome.map_err(CallError::Subject)
    }

    /// Closes the trace, asserting the final state root if one was tracked.
    ///
    /// Calling it again is a no-op. A faulted trace is closed without an
    /// assertion and still refuses to be saved.
    pub fn finalize(&mut self) {
        let final_root = self.cursor.current();
        if self.trace.finalize(final_root) {
            if let Some(fault) = self.trace.fault() {
                warn!(fault = %fault.code, steps = self.trace.steps().len(), "faulted trace closed");
                return;
            }
            info!(
                steps = self.trace.steps().len(),
                artifacts = self.trace.registry().len(),
                final_root = ?final_root,
                "trace finalized"
            );
        }
    }

    /// The trace recorded so far.
    pub fn trace(&self) -> &ExecutionTrace {
        &self.trace
    }

    /// The state cursor.
    pub fn cursor(&self) -> &StateCursor {
        &self.cursor
    }

    /// The recorder configuration.
    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// The wrapped subject.
    pub fn subject(&self) -> &S {
        &self.subject
    }

    /// Consumes the proxy, returning the subject and the trace.
    pub fn into_parts(self) -> (S, ExecutionTrace) {
        (self.subject, self.trace)
    }

    fn serialize_inputs(
        &mut self,
        bound: &BoundArgs<'_>,
    ) -> Result<IndexMap<String, ValueRef>, TraceError> {
        let serializer = Serializer::new(&self.config);
        let registry = self.trace.registry_mut();
        bound
            .iter()
            .map(|(name, value)| {
                let reference = serializer.serialize(value, registry)?;
                Ok::<_, TraceError>((name.to_string(), reference))
            })
            .collect()
    }

    fn serialize_output(&mut self, value: &Value<'_>) -> Result<Option<ValueRef>, TraceError> {
        if value.is_null() {
            return Ok(None);
        }
        Serializer::new(&self.config)
            .serialize(value, self.trace.registry_mut())
            .map(Some)
    }

    /// Advances the cursor when the call itself mutated the state.
    ///
    /// The mutated state is stored so the new root always has an artifact.
    fn track_post_state(&mut self, bound: &BoundArgs<'_>, pre_root: Root) -> Result<(), TraceError> {
        let Some(state) = bound
            .get(&self.config.state_param)
            .and_then(|value| value.as_object())
        else {
            return Ok(());
        };
        let post_root = state.content_root();
        if post_root == pre_root {
            return Ok(());
        }
        let collection = self.config.collection_for(state.kind()).ok_or_else(|| {
            TraceError::Registry(
                ErrorInfo::new("state-kind-changed", "state no longer maps to a collection")
                    .with_context("kind", state.kind()),
            )
        })?;
        self.trace.registry_mut().register(state, collection)?;
        self.cursor.advance(post_root);
        debug!(%pre_root, %post_root, "state transitioned during call");
        Ok(())
    }
}

impl<S: Subject> Deref for RecordingProxy<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.subject
    }
}
