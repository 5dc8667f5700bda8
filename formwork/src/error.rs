//! Structural error types
//!
//! Validation failures are data ([`ValidationErrors`](crate::validation::ValidationErrors))
//! and never show up here. `FormError` covers programmer mistakes: bad paths,
//! missing controls, shape mismatches. They are returned at the call site.

use thiserror::Error;

/// Error type for structural misuse of a form tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// The path string could not be parsed.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// No control exists at the given path.
    #[error("No control at '{path}'")]
    UnknownControl { path: String },

    /// The control exists but is of a different kind than requested.
    #[error("Control at '{path}' is a {actual}, expected a {expected}")]
    KindMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// An array index was past the end of the array.
    #[error("Index {index} out of range for array '{path}' of length {len}")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// A `pattern` validator was given a regex that does not compile.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A full `set_value` did not match the shape of the control tree.
    #[error("Value for '{path}' does not match the control shape: {reason}")]
    ShapeMismatch { path: String, reason: String },

    /// A group already has a control with this name.
    #[error("Control '{name}' already exists in group '{path}'")]
    DuplicateControl { path: String, name: String },
}

impl FormError {
    /// Creates an unknown control error.
    pub fn unknown(path: impl ToString) -> Self {
        Self::UnknownControl {
            path: path.to_string(),
        }
    }

    /// Creates a kind mismatch error.
    pub fn kind_mismatch(path: impl ToString, expected: &'static str, actual: &'static str) -> Self {
        Self::KindMismatch {
            path: path.to_string(),
            expected,
            actual,
        }
    }

    /// Creates a shape mismatch error.
    pub fn shape(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FormError>;
