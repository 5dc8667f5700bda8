//! Error types for the sign-up form.

use thiserror::Error;

/// Errors raised while building or running the sign-up form.
#[derive(Debug, Error)]
pub enum SignupError {
    /// The form tree rejected an operation.
    #[error("Form error: {0}")]
    Form(#[from] formwork::FormError),

    /// The saved value could not be read back as a customer.
    #[error("Invalid customer data: {0}")]
    Json(#[from] serde_json::Error),

    /// A logger was already installed.
    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    /// The log level in the environment is not a known level.
    #[error("Invalid log level '{0}'")]
    LogLevel(String),

    /// The log file could not be created.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for sign-up operations.
pub type Result<T> = std::result::Result<T, SignupError>;
