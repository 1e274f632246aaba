use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use spectrace_core::root::Root;
use spectrace_core::value::ValueRef;

/// Kind and message of a failure raised by the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    /// Error kind, e.g. `AssertionError`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Rendered error message.
    pub message: String,
}

/// One recorded subject call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStep {
    /// Operation name.
    pub method: String,
    /// Inputs keyed by parameter name, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub input: IndexMap<String, ValueRef>,
    /// Recorded return value; absent when the call returned nothing or failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assert_output: Option<ValueRef>,
    /// Present when the subject raised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescriptor>,
}

impl CallStep {
    /// A call step with inputs and no outcome yet.
    pub fn new(method: impl Into<String>, input: IndexMap<String, ValueRef>) -> Self {
        Self {
            method: method.into(),
            input,
            assert_output: None,
            error: None,
        }
    }
}

/// Entry of the ordered execution trace, tagged by `op` when persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TraceStep {
    /// The current state changed out of band; replay continues from `state_root`.
    LoadState {
        /// Root of the state to load.
        state_root: Root,
    },
    /// A recorded subject call.
    SpecCall(CallStep),
    /// Terminal assertion of the final state root.
    AssertState {
        /// Root the final state must have.
        state_root: Root,
    },
}

impl TraceStep {
    /// The `op` tag used in persisted documents.
    pub fn op(&self) -> &'static str {
        match self {
            TraceStep::LoadState { .. } => "load_state",
            TraceStep::SpecCall(_) => "spec_call",
            TraceStep::AssertState { .. } => "assert_state",
        }
    }

    /// The call, for call steps.
    pub fn as_call(&self) -> Option<&CallStep> {
        match self {
            TraceStep::SpecCall(call) => Some(call),
            _ => None,
        }
    }

    /// The state root carried by load and assert steps.
    pub fn state_root(&self) -> Option<Root> {
        match self {
            TraceStep::LoadState { state_root } | TraceStep::AssertState { state_root } => {
                Some(*state_root)
            }
            TraceStep::SpecCall(_) => None,
        }
    }
}
