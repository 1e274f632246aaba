use spectrace_core::errors::{ErrorInfo, TraceError};
use spectrace_core::value::Value;

use crate::subject::{BoundArgs, CallArgs, OperationSpec};

fn binding_error(code: &str, message: &str, spec: &OperationSpec) -> ErrorInfo {
    ErrorInfo::new(code, message).with_context("operation", spec.name.clone())
}

/// Binds caller arguments to the operation's declared parameters.
///
/// Positional arguments fill parameters in order, keyword arguments are matched
/// by name and omitted parameters take their defaults. The result is keyed by
/// parameter name in declaration order whatever the call style.
pub fn bind<'a>(spec: &OperationSpec, args: CallArgs<'a>) -> Result<BoundArgs<'a>, TraceError> {
    let CallArgs { positional, named } = args;
    if positional.len() > spec.params.len() {
        return Err(TraceError::Usage(
            binding_error("too-many-arguments", "more positional arguments than parameters", spec)
                .with_context("expected", spec.params.len().to_string())
                .with_context("received", positional.len().to_string()),
        ));
    }

    let mut slots: Vec<Option<Value<'a>>> = Vec::with_capacity(spec.params.len());
    slots.extend(positional.into_iter().map(Some));
    slots.resize_with(spec.params.len(), || None);

    for (name, value) in named {
        let Some(index) = spec.params.iter().position(|param| param.name == name) else {
            return Err(TraceError::Usage(
                binding_error("unexpected-argument", "no parameter with this name", spec)
                    .with_context("argument", name),
            ));
        };
        if slots[index].is_some() {
            return Err(TraceError::Usage(
                binding_error("duplicate-argument", "parameter bound twice", spec)
                    .with_context("argument", name),
            ));
        }
        slots[index] = Some(value);
    }

    let mut entries = Vec::with_capacity(spec.params.len());
    for (param, slot) in spec.params.iter().zip(slots) {
        let value = match slot {
            Some(value) => value,
            None => param
                .default
                .as_ref()
                .and_then(Value::try_clone)
                .ok_or_else(|| {
                    TraceError::Usage(
                        binding_error("missing-argument", "required parameter not supplied", spec)
                            .with_context("argument", param.name.clone()),
                    )
                })?,
        };
        entries.push((param.name.clone(), value));
    }
    Ok(BoundArgs { entries })
}
