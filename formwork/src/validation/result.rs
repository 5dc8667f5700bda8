use super::errors::ValidationErrors;
use crate::path::FieldPath;

/// Information about a single invalid control.
#[derive(Debug, Clone)]
pub struct FieldError {
    /// Path of the control inside the validated group.
    pub path: FieldPath,
    /// The control's own errors.
    pub errors: ValidationErrors,
    /// Message derived from the table passed to `validate`.
    pub message: String,
}

/// Result of validating a whole control tree.
#[derive(Debug, Clone, Default)]
pub enum ValidationResult {
    /// Every control passed validation.
    #[default]
    Valid,
    /// One or more controls failed validation, in tree order.
    Invalid(Vec<FieldError>),
}

impl ValidationResult {
    pub(crate) fn from_errors(errors: Vec<FieldError>) -> Self {
        if errors.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(errors)
        }
    }

    /// Check if all controls passed validation.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Check if any control failed validation.
    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    /// Get all validation errors.
    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::Valid => &[],
            Self::Invalid(errors) => errors,
        }
    }

    /// Get the first validation error (if any).
    pub fn first_error(&self) -> Option<&FieldError> {
        self.errors().first()
    }

    /// Get the path of the first invalid control (for focusing).
    pub fn first_invalid_path(&self) -> Option<&FieldPath> {
        self.first_error().map(|e| &e.path)
    }
}
