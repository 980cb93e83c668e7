use std::fmt;

use thiserror::Error;

use crate::id::{Id, Marker, RawId};

/// An id did not name a live object of the expected kind.
///
/// Either it was never handed out by this [`Global`](crate::global::Global),
/// or the object it named has since been destroyed or dropped.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("{kind} {id:?} is invalid or has been destroyed")]
pub struct InvalidResourceError {
    pub kind: &'static str,
    pub id: RawId,
}

impl InvalidResourceError {
    pub fn new<T: Marker>(id: Id<T>) -> Self {
        Self {
            kind: T::KIND,
            id: id.into_raw(),
        }
    }
}

/// The kind of errors an error scope captures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorFilter {
    Validation,
    OutOfMemory,
    Internal,
}

/// An error that an error scope could report.
///
/// The emulation performs no validation, so nothing ever produces one; the
/// type exists so callers can match on `pop_error_scope` results the same way
/// they would against a real device.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GpuError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GpuError {
    pub fn filter(&self) -> ErrorFilter {
        match *self {
            Self::Validation(_) => ErrorFilter::Validation,
            Self::OutOfMemory => ErrorFilter::OutOfMemory,
            Self::Internal(_) => ErrorFilter::Internal,
        }
    }
}

/// Writes an error and its chain of sources, one per line.
pub struct ErrorFormatter<'a> {
    error: &'a (dyn std::error::Error + 'static),
}

impl<'a> ErrorFormatter<'a> {
    pub fn new(error: &'a (dyn std::error::Error + 'static)) -> Self {
        Self { error }
    }
}

impl fmt::Display for ErrorFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        let mut source = self.error.source();
        while let Some(error) = source {
            write!(f, "\n      {error}")?;
            source = error.source();
        }
        Ok(())
    }
}
