//! Human-readable messages for error kinds.

use super::errors::{ErrorKind, ValidationErrors};
use super::visibility::MessageVisibility;
use crate::control::FieldSnapshot;

/// Mapping of [`ErrorKind`] to display text.
///
/// Only used to derive what a user sees; validation never consults it.
///
/// # Example
///
/// ```
/// use formwork::validation::{ErrorKind, ValidationErrors, ValidationMessageTable};
///
/// let table = ValidationMessageTable::new()
///     .with(ErrorKind::Required, "Please enter your email address")
///     .with(ErrorKind::Pattern, "Please enter a valid email address");
///
/// let errors = ValidationErrors::single(ErrorKind::Pattern);
/// assert_eq!(table.message_for(&errors), "Please enter a valid email address");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationMessageTable {
    messages: Vec<(ErrorKind, String)>,
}

impl ValidationMessageTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generic English messages for the built-in kinds.
    pub fn defaults() -> Self {
        Self::new()
            .with(ErrorKind::Required, "This field is required")
            .with(ErrorKind::MinLength, "This value is too short")
            .with(ErrorKind::MaxLength, "This value is too long")
            .with(ErrorKind::Pattern, "This value has an invalid format")
            .with(ErrorKind::Email, "Please enter a valid email address")
            .with(ErrorKind::Range, "This value is out of range")
            .with(ErrorKind::Match, "The values do not match")
    }

    /// Sets the message for a kind, replacing any previous one.
    pub fn with(mut self, kind: ErrorKind, message: impl Into<String>) -> Self {
        self.insert(kind, message);
        self
    }

    /// Sets the message for a kind, replacing any previous one.
    pub fn insert(&mut self, kind: ErrorKind, message: impl Into<String>) {
        let message = message.into();
        match self.messages.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = message,
            None => self.messages.push((kind, message)),
        }
    }

    /// Message for one kind.
    pub fn get(&self, kind: &ErrorKind) -> Option<&str> {
        self.messages
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, m)| m.as_str())
    }

    /// Joins the messages of every known kind with a space, in error order.
    /// Kinds without a message are skipped.
    pub fn message_for(&self, errors: &ValidationErrors) -> String {
        errors
            .iter()
            .filter_map(|kind| self.get(kind))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Message for a field, or an empty string when `visibility` hides it or
    /// the field has no errors.
    pub fn message_for_field(&self, field: &FieldSnapshot, visibility: MessageVisibility) -> String {
        if field.errors.is_empty() || !visibility.allows(field.touched, field.dirty) {
            return String::new();
        }
        self.message_for(&field.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Status;
    use crate::value::Value;

    fn table() -> ValidationMessageTable {
        ValidationMessageTable::new()
            .with(ErrorKind::Required, "Please enter your email address")
            .with(ErrorKind::Pattern, "Please enter a valid email address")
    }

    fn snapshot(errors: ValidationErrors, touched: bool, dirty: bool) -> FieldSnapshot {
        FieldSnapshot {
            value: Value::from(""),
            status: Status::from_valid(errors.is_empty()),
            errors,
            touched,
            dirty,
        }
    }

    #[test]
    fn test_joins_in_error_order() {
        let errors: ValidationErrors = [ErrorKind::Pattern, ErrorKind::Required].into_iter().collect();
        assert_eq!(
            table().message_for(&errors),
            "Please enter a valid email address Please enter your email address"
        );
    }

    #[test]
    fn test_skips_unknown_kinds() {
        let errors: ValidationErrors = [ErrorKind::Range, ErrorKind::Required].into_iter().collect();
        assert_eq!(table().message_for(&errors), "Please enter your email address");
    }

    #[test]
    fn test_insert_replaces() {
        let mut t = table();
        t.insert(ErrorKind::Required, "Needed");
        assert_eq!(t.get(&ErrorKind::Required), Some("Needed"));
    }

    #[test]
    fn test_field_message_visibility() {
        let t = table();
        let errors = ValidationErrors::single(ErrorKind::Required);

        let untouched = snapshot(errors.clone(), false, false);
        assert_eq!(t.message_for_field(&untouched, MessageVisibility::WhenInteracted), "");
        assert_eq!(
            t.message_for_field(&untouched, MessageVisibility::Always),
            "Please enter your email address"
        );

        let dirty = snapshot(errors, false, true);
        assert_eq!(
            t.message_for_field(&dirty, MessageVisibility::WhenInteracted),
            "Please enter your email address"
        );
        assert_eq!(t.message_for_field(&dirty, MessageVisibility::Never), "");

        let valid = snapshot(ValidationErrors::new(), true, true);
        assert_eq!(t.message_for_field(&valid, MessageVisibility::Always), "");
    }
}
