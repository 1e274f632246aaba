#![deny(missing_docs)]
#![doc = "Recording proxy for stateful subjects: intercepts calls, tracks state roots and collects content-addressed artifacts."]

/// Argument binding against declared parameter lists.
pub mod bind;
/// Tracer configuration.
pub mod config;
/// State root tracking.
pub mod cursor;
/// Errors surfaced by intercepted calls.
pub mod error;
/// The call interceptor.
pub mod proxy;
/// Content-addressed artifact store.
pub mod registry;
/// Value to reference conversion.
pub mod serializer;
/// Trace step shapes.
pub mod step;
/// Subject adapter contract.
pub mod subject;
/// Ordered trace assembly and finalization.
pub mod trace;

pub use bind::bind;
pub use config::TracerConfig;
pub use cursor::StateCursor;
pub use error::CallError;
pub use proxy::RecordingProxy;
pub use registry::{ArtifactRegistry, StoredArtifact};
pub use serializer::Serializer;
pub use step::{CallStep, ErrorDescriptor, TraceStep};
pub use subject::{is_traced_operation, BoundArgs, CallArgs, OperationSpec, ParamSpec, Subject};
pub use trace::ExecutionTrace;
