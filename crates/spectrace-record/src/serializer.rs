use spectrace_core::errors::TraceError;
use spectrace_core::value::{ContextRef, Value, ValueRef};
use tracing::warn;

use crate::config::TracerConfig;
use crate::registry::ArtifactRegistry;

/// Converts call-boundary values into [`ValueRef`]s.
///
/// Literals normalize to their base form, byte sequences become lowercase hex,
/// and complex values of tracked kinds are registered and replaced by a
/// content-address reference. Anything else degrades to a placeholder naming
/// its type. Equal content always yields the same reference.
#[derive(Debug, Clone, Copy)]
pub struct Serializer<'c> {
    config: &'c TracerConfig,
}

impl<'c> Serializer<'c> {
    /// Creates a serializer bound to the recorder configuration.
    pub fn new(config: &'c TracerConfig) -> Self {
        Self { config }
    }

    /// Serializes `value`, registering complex values in `registry`.
    pub fn serialize(
        &self,
        value: &Value<'_>,
        registry: &mut ArtifactRegistry,
    ) -> Result<ValueRef, TraceError> {
        Ok(match value {
            Value::Null => ValueRef::Null,
            Value::Bool(flag) => ValueRef::Bool(*flag),
            Value::Int(number) => ValueRef::integer(*number),
            Value::Uint(number) => ValueRef::Uint(*number),
            Value::Str(text) => ValueRef::Text(text.to_string()),
            Value::Bytes(bytes) => ValueRef::Text(hex::encode(bytes)),
            Value::List(values) => ValueRef::List(
                values
                    .iter()
                    .map(|item| self.serialize(item, registry))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(object) => {
                let object = object.get();
                match self.config.collection_for(object.kind()) {
                    Some(collection) => {
                        let root = registry.register(object, collection)?;
                        ValueRef::Reference(ContextRef::new(collection, root))
                    }
                    None => {
                        warn!(kind = object.kind(), "untracked artifact kind, recording placeholder");
                        ValueRef::placeholder(object.kind())
                    }
                }
            }
            Value::Opaque(opaque) => ValueRef::placeholder(opaque.type_name()),
        })
    }
}
