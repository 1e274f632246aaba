#![deny(missing_docs)]
#![doc = "Core types shared by the spectrace recorder: errors, run metadata, content roots and call-boundary values."]

pub mod errors;
pub mod metadata;
pub mod root;
pub mod serde;
pub mod value;

pub use errors::{ErrorInfo, TraceError};
pub use metadata::{RunMetadata, SchemaVersion};
pub use root::Root;
pub use value::{
    short_type_name, Canonical, ContextRef, ObjectRef, OpaqueRef, Traceable, Value, ValueRef,
};
