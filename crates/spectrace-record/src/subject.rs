use std::any::type_name;

use spectrace_core::value::{short_type_name, Value};

/// Declared parameter of a subject operation.
#[derive(Debug)]
pub struct ParamSpec {
    /// Parameter name used as the key in recorded inputs.
    pub name: String,
    /// Literal used when the caller omits the argument.
    pub default: Option<Value<'static>>,
}

impl ParamSpec {
    /// A parameter the caller must supply.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// A parameter with a literal default.
    pub fn optional(name: impl Into<String>, default: impl Into<Value<'static>>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

/// Call descriptor for one subject operation, computed once when the subject is wrapped.
#[derive(Debug)]
pub struct OperationSpec {
    /// Operation name.
    pub name: String,
    /// Parameters in declaration order.
    pub params: Vec<ParamSpec>,
}

impl OperationSpec {
    /// Creates a descriptor from explicit parameter specs.
    pub fn new(name: impl Into<String>, params: impl IntoIterator<Item = ParamSpec>) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().collect(),
        }
    }

    /// Creates a descriptor whose parameters are all required.
    pub fn with_params(name: impl Into<String>, params: &[&str]) -> Self {
        Self::new(name, params.iter().map(|param| ParamSpec::required(*param)))
    }
}

/// Adapter contract for objects that can be wrapped by the recorder.
///
/// The subject exposes an enumerable set of named operations with ordered
/// parameter names and dispatches calls by name.
pub trait Subject {
    /// Error raised by subject operations.
    type Error: std::error::Error + 'static;

    /// Operations exposed by the subject.
    fn operations(&self) -> Vec<OperationSpec>;

    /// Executes `operation` with arguments already bound to parameter names.
    fn invoke(
        &self,
        operation: &str,
        args: &mut BoundArgs<'_>,
    ) -> Result<Value<'static>, Self::Error>;

    /// Kind recorded in the error descriptor of a failed call.
    fn error_kind(_error: &Self::Error) -> String {
        short_type_name(type_name::<Self::Error>()).to_string()
    }
}

/// Whether calls to `name` are recorded: lowercase, public-style names only.
pub fn is_traced_operation(name: &str) -> bool {
    !name.starts_with('_')
        && name.chars().any(char::is_alphabetic)
        && !name.chars().any(char::is_uppercase)
}

/// Arguments as supplied by the caller, before binding.
#[derive(Debug, Default)]
pub struct CallArgs<'a> {
    pub(crate) positional: Vec<Value<'a>>,
    pub(crate) named: Vec<(String, Value<'a>)>,
}

impl<'a> CallArgs<'a> {
    /// Empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value<'a>>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Appends a keyword argument.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value<'a>>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }
}

/// Arguments bound to declared parameter names, in declaration order.
#[derive(Debug, Default)]
pub struct BoundArgs<'a> {
    pub(crate) entries: Vec<(String, Value<'a>)>,
}

impl<'a> BoundArgs<'a> {
    /// Argument bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value<'a>> {
        self.entries
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    /// Mutable access to the argument bound to `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value<'a>> {
        self.entries
            .iter_mut()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    /// Iterates over `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value<'a>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the operation takes no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
