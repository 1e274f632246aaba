use spectrace_core::errors::TraceError;
use thiserror::Error;

/// Failure of an intercepted call.
///
/// Subject failures and tracer faults are kept apart so callers always see the
/// subject's own error untouched.
#[derive(Debug, Error)]
pub enum CallError<E> {
    /// The wrapped subject failed; the error is passed through unchanged.
    #[error(transparent)]
    Subject(E),
    /// The recorder itself failed.
    #[error(transparent)]
    Tracer(#[from] TraceError),
}

impl<E> CallError<E> {
    /// Returns the subject error, if this is one.
    pub fn into_subject(self) -> Option<E> {
        match self {
            CallError::Subject(err) => Some(err),
            CallError::Tracer(_) => None,
        }
    }

    /// Returns the tracer error, if this is one.
    pub fn as_tracer(&self) -> Option<&TraceError> {
        match self {
            CallError::Tracer(err) => Some(err),
            CallError::Subject(_) => None,
        }
    }
}
