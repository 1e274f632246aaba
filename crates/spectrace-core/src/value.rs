//! Values crossing the call boundary and the references recorded for them.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{ErrorInfo, TraceError};
use crate::root::Root;

/// Prefix shared by every content-address reference string.
pub const CONTEXT_PREFIX: &str = "$context.";

/// A complex value that can be stored as an artifact.
///
/// Implementations must be canonical: equal content always yields the same
/// root and the same bytes, regardless of which instance is asked.
pub trait Canonical: 'static {
    /// Type name used to pick the context collection, e.g. `BeaconState`.
    fn kind(&self) -> &str;

    /// Digest of the value's structured content.
    fn content_root(&self) -> Root;

    /// Raw serialized bytes of the value.
    fn encode(&self) -> Result<Vec<u8>, TraceError>;
}

/// Object-safe view over a [`Canonical`] value that also supports downcasting.
///
/// Implemented for every [`Canonical`] type; adapters never implement it by hand.
pub trait Traceable: Canonical {
    /// Upcast for shared downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Upcast for exclusive downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Upcast for recovering an owned value.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Canonical> Traceable for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Strips module paths and generic arguments from a type name.
pub fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    head.rsplit("::").next().unwrap_or(head)
}

/// A complex value handed across the call boundary.
pub enum ObjectRef<'a> {
    /// Read-only borrow.
    Shared(&'a (dyn Traceable + 'static)),
    /// Mutable borrow; the distinguished state is passed this way.
    Exclusive(&'a mut (dyn Traceable + 'static)),
    /// Value produced by the subject.
    Owned(Box<dyn Traceable>),
}

impl<'a> ObjectRef<'a> {
    /// Shared access regardless of how the object is held.
    pub fn get(&self) -> &(dyn Traceable + 'static) {
        match self {
            ObjectRef::Shared(object) => *object,
            ObjectRef::Exclusive(object) => &**object,
            ObjectRef::Owned(object) => object.as_ref(),
        }
    }

    /// Exclusive access, unavailable for shared borrows.
    pub fn get_mut(&mut self) -> Option<&mut (dyn Traceable + 'static)> {
        match self {
            ObjectRef::Shared(_) => None,
            ObjectRef::Exclusive(object) => Some(&mut **object),
            ObjectRef::Owned(object) => Some(object.as_mut()),
        }
    }
}

impl fmt::Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let object = self.get();
        f.debug_struct("ObjectRef")
            .field("kind", &object.kind())
            .field("root", &object.content_root())
            .finish()
    }
}

/// A value the recorder cannot store, kept only so the subject can use it.
pub enum OpaqueRef<'a> {
    /// Borrowed from the caller.
    Borrowed {
        /// Short type name used for the placeholder.
        type_name: &'static str,
        /// The value itself.
        value: &'a dyn Any,
    },
    /// Produced by the subject.
    Owned {
        /// Short type name used for the placeholder.
        type_name: &'static str,
        /// The value itself.
        value: Box<dyn Any>,
    },
}

impl OpaqueRef<'_> {
    /// Short type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        match self {
            OpaqueRef::Borrowed { type_name, .. } | OpaqueRef::Owned { type_name, .. } => {
                type_name
            }
        }
    }

    /// Downcasts the wrapped value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            OpaqueRef::Borrowed { value, .. } => value.downcast_ref(),
            OpaqueRef::Owned { value, .. } => value.downcast_ref(),
        }
    }
}

impl fmt::Debug for OpaqueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueRef({})", self.type_name())
    }
}

/// Dynamically typed argument or return value of a subject operation.
#[derive(Debug)]
pub enum Value<'a> {
    /// Absent value.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Signed integer literal.
    Int(i64),
    /// Unsigned integer literal.
    Uint(u64),
    /// Text literal.
    Str(Cow<'a, str>),
    /// Byte sequence, recorded as lowercase hex.
    Bytes(Cow<'a, [u8]>),
    /// Sequence of values.
    List(Vec<Value<'a>>),
    /// Complex value tracked by content root.
    Object(ObjectRef<'a>),
    /// Value of a type the recorder does not understand.
    Opaque(OpaqueRef<'a>),
}

impl<'a> Value<'a> {
    /// Passes a complex value by shared reference.
    pub fn object<T: Traceable>(value: &'a T) -> Self {
        Value::Object(ObjectRef::Shared(value))
    }

    /// Passes a complex value by mutable reference (typically the state).
    pub fn object_mut<T: Traceable>(value: &'a mut T) -> Self {
        Value::Object(ObjectRef::Exclusive(value))
    }

    /// Passes an arbitrary value the recorder should not try to store.
    pub fn opaque<T: Any>(value: &'a T) -> Self {
        Value::Opaque(OpaqueRef::Borrowed {
            type_name: short_type_name(std::any::type_name::<T>()),
            value,
        })
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean view.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Unsigned view; non-negative signed integers qualify.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(value) => Some(*value),
            Value::Int(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Signed view; unsigned integers within range qualify.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Uint(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Text view.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value.as_ref()),
            _ => None,
        }
    }

    /// Byte view.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(value) => Some(value.as_ref()),
            _ => None,
        }
    }

    /// List view.
    pub fn as_list(&self) -> Option<&[Value<'a>]> {
        match self {
            Value::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Complex value view.
    pub fn as_object(&self) -> Option<&(dyn Traceable + 'static)> {
        match self {
            Value::Object(object) => Some(object.get()),
            _ => None,
        }
    }

    /// Downcasts a complex value.
    pub fn downcast_ref<T: Traceable>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref()
    }

    /// Downcasts a mutably held complex value.
    pub fn downcast_mut<T: Traceable>(&mut self) -> Option<&mut T> {
        match self {
            Value::Object(object) => object.get_mut()?.as_any_mut().downcast_mut(),
            _ => None,
        }
    }

    /// Downcasts an opaque value.
    pub fn opaque_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(opaque) => opaque.downcast_ref(),
            _ => None,
        }
    }

    /// Copies literal values into an owned value. Objects and opaques cannot be copied.
    pub fn try_clone(&self) -> Option<Value<'static>> {
        Some(match self {
            Value::Null => Value::Null,
            Value::Bool(value) => Value::Bool(*value),
            Value::Int(value) => Value::Int(*value),
            Value::Uint(value) => Value::Uint(*value),
            Value::Str(value) => Value::Str(Cow::Owned(value.to_string())),
            Value::Bytes(value) => Value::Bytes(Cow::Owned(value.to_vec())),
            Value::List(values) => Value::List(
                values
                    .iter()
                    .map(Value::try_clone)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Value::Object(_) | Value::Opaque(_) => return None,
        })
    }
}

impl Value<'static> {
    /// Wraps a complex value produced by the subject.
    pub fn owned<T: Traceable>(value: T) -> Self {
        Value::Object(ObjectRef::Owned(Box::new(value)))
    }

    /// Wraps an arbitrary value produced by the subject.
    pub fn owned_opaque<T: Any>(value: T) -> Self {
        Value::Opaque(OpaqueRef::Owned {
            type_name: short_type_name(std::any::type_name::<T>()),
            value: Box::new(value),
        })
    }

    /// Recovers a complex value produced by the subject.
    pub fn into_object<T: Traceable>(self) -> Option<Box<T>> {
        match self {
            Value::Object(ObjectRef::Owned(object)) => object.into_any().downcast().ok(),
            _ => None,
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<u64> for Value<'_> {
    fn from(value: u64) -> Self {
        Value::Uint(value)
    }
}

impl From<u32> for Value<'_> {
    fn from(value: u32) -> Self {
        Value::Uint(u64::from(value))
    }
}

impl From<usize> for Value<'_> {
    fn from(value: usize) -> Self {
        Value::Uint(value as u64)
    }
}

impl From<i64> for Value<'_> {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value<'_> {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Str(Cow::Borrowed(value))
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Value::Str(Cow::Owned(value))
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(value: &'a [u8]) -> Self {
        Value::Bytes(Cow::Borrowed(value))
    }
}

impl From<Vec<u8>> for Value<'_> {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(Cow::Owned(value))
    }
}

impl From<Root> for Value<'_> {
    fn from(value: Root) -> Self {
        Value::Bytes(Cow::Owned(value.as_bytes().to_vec()))
    }
}

impl<'a> From<Vec<Value<'a>>> for Value<'a> {
    fn from(values: Vec<Value<'a>>) -> Self {
        Value::List(values)
    }
}

/// Content-address reference into the artifact registry,
/// rendered as `$context.<collection>.<root>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextRef {
    /// Context collection, e.g. `states`.
    pub collection: String,
    /// Content root of the referenced artifact.
    pub root: Root,
}

impl ContextRef {
    /// Creates a reference.
    pub fn new(collection: impl Into<String>, root: Root) -> Self {
        Self {
            collection: collection.into(),
            root,
        }
    }
}

impl fmt::Display for ContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CONTEXT_PREFIX}{}.{}", self.collection, self.root)
    }
}

impl FromStr for ContextRef {
    type Err = TraceError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            TraceError::Serde(
                ErrorInfo::new("context-ref-parse", "malformed context reference")
                    .with_context("reference", text),
            )
        };
        let rest = text.strip_prefix(CONTEXT_PREFIX).ok_or_else(invalid)?;
        let (collection, root) = rest.split_once('.').ok_or_else(invalid)?;
        let well_formed = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !well_formed {
            return Err(invalid());
        }
        Ok(Self {
            collection: collection.to_string(),
            root: Root::from_hex(root)?,
        })
    }
}

impl Serialize for ContextRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContextRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Recorded form of a [`Value`]: a primitive literal or a content-address reference.
///
/// Two references are equal iff the underlying content is equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueRef {
    /// Null literal.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Non-negative integer literal.
    Uint(u64),
    /// Negative integer literal.
    Int(i64),
    /// Reference to a stored artifact.
    Reference(ContextRef),
    /// Text literal, hex-encoded bytes, or an unserializable placeholder.
    Text(String),
    /// Sequence of references.
    List(Vec<ValueRef>),
}

impl ValueRef {
    /// Normalizes a signed integer so equal numbers compare equal after a round trip.
    pub fn integer(value: i64) -> Self {
        match u64::try_from(value) {
            Ok(unsigned) => ValueRef::Uint(unsigned),
            Err(_) => ValueRef::Int(value),
        }
    }

    /// Placeholder recorded for values the recorder cannot store.
    pub fn placeholder(type_name: &str) -> Self {
        ValueRef::Text(format!("<unserializable {type_name}>"))
    }

    /// The referenced artifact, if any.
    pub fn as_reference(&self) -> Option<&ContextRef> {
        match self {
            ValueRef::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Visits every artifact reference, including those nested in lists.
    pub fn references(&self) -> Vec<&ContextRef> {
        match self {
            ValueRef::Reference(reference) => vec![reference],
            ValueRef::List(values) => values.iter().flat_map(ValueRef::references).collect(),
            _ => Vec::new(),
        }
    }
}
