//! Errors raised by value operations.
//!
//! Only shape and resource failures are errors. A scalar outside its bounds
//! is a value with `Status::Invalid`, and a failed membership test is a
//! plain `false`.

use lattix_diag::{Category, Diagnostic, DiagnosticError};
use thiserror::Error;

use crate::status::Status;

/// Value-layer result type
pub type Result<T> = std::result::Result<T, ValueError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    Shape {
        expected: &'static str,
        found: String,
    },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("argument of type `{found}` is not a member of parameter type `{expected}`")]
    ArgumentType { expected: String, found: String },

    #[error("status `{0}` cannot be attached to a scalar")]
    InvalidStatus(Status),

    #[error("type `{found}` is not a member of `{expected}`")]
    TypeMismatch { expected: String, found: String },

    #[error("{operation} needs at least one element")]
    EmptyInput { operation: &'static str },

    #[error("{operation} is not supported by {by}")]
    Unsupported { operation: &'static str, by: String },
}

impl ValueError {
    pub fn category(&self) -> Category {
        match self {
            ValueError::Shape { .. } => Category::ShapeMismatch,
            ValueError::IndexOutOfRange { .. } => Category::IndexOutOfRange,
            ValueError::LengthMismatch { .. } => Category::LengthMismatch,
            ValueError::ArgumentType { .. } => Category::ArgumentType,
            ValueError::InvalidStatus(_) => Category::InvalidStatus,
            ValueError::TypeMismatch { .. } => Category::TypeMismatch,
            ValueError::EmptyInput { .. } => Category::EmptyInput,
            ValueError::Unsupported { .. } => Category::Unsupported,
        }
    }

    pub(crate) fn shape(expected: &'static str, found: impl ToString) -> Self {
        ValueError::Shape {
            expected,
            found: found.to_string(),
        }
    }
}

/// Fail with `IndexOutOfRange` unless `index < len`.
pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(ValueError::IndexOutOfRange { index, len })
    }
}

impl From<ValueError> for Diagnostic {
    fn from(err: ValueError) -> Self {
        let diag = Diagnostic::error(err.category(), err.to_string());
        match err {
            ValueError::Shape { expected, found } => diag
                .with_context("expected", expected)
                .with_context("found", found),
            ValueError::IndexOutOfRange { index, len } => diag
                .with_context("index", index)
                .with_context("len", len)
                .with_help(format!("valid indices are 0..{len}")),
            ValueError::LengthMismatch { expected, found } => diag
                .with_context("expected", expected)
                .with_context("found", found),
            ValueError::ArgumentType { expected, found }
            | ValueError::TypeMismatch { expected, found } => diag
                .with_context("expected", expected)
                .with_context("found", found),
            ValueError::InvalidStatus(status) => diag.with_context("status", status),
            ValueError::EmptyInput { operation } => diag.with_context("operation", operation),
            ValueError::Unsupported { operation, by } => diag
                .with_context("operation", operation)
                .with_context("by", by),
        }
    }
}

impl From<ValueError> for DiagnosticError {
    fn from(err: ValueError) -> Self {
        DiagnosticError::single(err.into())
    }
}
