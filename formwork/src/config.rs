//! Form configuration

use std::time::Duration;

use crate::validation::MessageVisibility;

/// Settings shared by the watchers of a form.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use formwork::{FormConfig, validation::MessageVisibility};
///
/// let config = FormConfig::default()
///     .with_debounce(Duration::from_millis(250))
///     .with_message_visibility(MessageVisibility::Always);
/// assert_eq!(config.debounce, Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfig {
    /// Quiet period for debounced message watchers.
    ///
    /// Default: 1 second
    pub debounce: Duration,

    /// When a field's message is shown.
    ///
    /// Default: once the field is touched or dirty
    pub message_visibility: MessageVisibility,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            message_visibility: MessageVisibility::default(),
        }
    }
}

impl FormConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the debounce quiet period.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the message visibility.
    pub fn with_message_visibility(mut self, visibility: MessageVisibility) -> Self {
        self.message_visibility = visibility;
        self
    }

    /// Creates a config whose watchers fire on the next scheduler pass.
    pub fn immediate() -> Self {
        Self {
            debounce: Duration::ZERO,
            ..Default::default()
        }
    }
}
