//! Structured error types shared across spectrace crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`TraceError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (operation names, roots, paths, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Tracer-internal failures.
///
/// Errors raised by the traced subject are never represented here; they travel
/// back to the caller untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum TraceError {
    /// Misuse of the recorder (closed trace, unknown operation, bad arguments).
    #[error("usage error: {0}")]
    Usage(ErrorInfo),
    /// Content-hash contract violations detected by the artifact registry.
    #[error("registry error: {0}")]
    Registry(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// Filesystem failures while persisting or loading traces.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// A persisted trace failed verification.
    #[error("verify error: {0}")]
    Verify(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl TraceError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            TraceError::Usage(info)
            | TraceError::Registry(info)
            | TraceError::Serde(info)
            | TraceError::Io(info)
            | TraceError::Verify(info) => info,
        }
    }

    /// Shorthand for a [`TraceError::Usage`] without context.
    pub fn usage(code: &str, message: impl Into<String>) -> Self {
        TraceError::Usage(ErrorInfo::new(code, message))
    }

    /// Wraps a filesystem error, recording the offending path.
    pub fn io(code: &str, path: &std::path::Path, err: impl ToString) -> Self {
        TraceError::Io(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
