//! Validation error kinds and error sets.

use std::fmt;

use serde::Serialize;
use serde::ser::SerializeMap;

/// The reason a validator rejected a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Value is missing or blank.
    Required,
    /// String is shorter than the configured minimum.
    MinLength,
    /// String is longer than the configured maximum.
    MaxLength,
    /// String does not match the configured regex.
    Pattern,
    /// String is not a valid email address.
    Email,
    /// Value is non-numeric or outside the configured range.
    Range,
    /// Two controls of a group hold different values.
    Match,
    /// Failure reported by a custom rule.
    Custom(String),
}

impl ErrorKind {
    /// Stable string key for this kind.
    pub fn key(&self) -> &str {
        match self {
            ErrorKind::Required => "required",
            ErrorKind::MinLength => "minlength",
            ErrorKind::MaxLength => "maxlength",
            ErrorKind::Pattern => "pattern",
            ErrorKind::Email => "email",
            ErrorKind::Range => "range",
            ErrorKind::Match => "match",
            ErrorKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Ordered set of [`ErrorKind`]s reported for one control.
///
/// Insertion order is kept so the first message shown follows validator
/// order. Duplicate kinds are merged. Serializes as `{ "<key>": true, ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    kinds: Vec<ErrorKind>,
}

impl ValidationErrors {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding one kind.
    pub fn single(kind: ErrorKind) -> Self {
        Self { kinds: vec![kind] }
    }

    /// Adds a kind unless it is already present.
    pub fn insert(&mut self, kind: ErrorKind) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }

    /// Adds every kind of `other`.
    pub fn merge(&mut self, other: ValidationErrors) {
        for kind in other.kinds {
            self.insert(kind);
        }
    }

    /// Returns `true` if `kind` is in the set.
    pub fn contains(&self, kind: &ErrorKind) -> bool {
        self.kinds.contains(kind)
    }

    /// Returns `true` if no error was reported.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// First reported kind.
    pub fn first(&self) -> Option<&ErrorKind> {
        self.kinds.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorKind> {
        self.kinds.iter()
    }

    /// Keys of all kinds, in order.
    pub fn keys(&self) -> Vec<&str> {
        self.kinds.iter().map(ErrorKind::key).collect()
    }

    /// `None` when empty, `Some(self)` otherwise.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

impl FromIterator<ErrorKind> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ErrorKind>>(iter: I) -> Self {
        let mut errors = Self::new();
        for kind in iter {
            errors.insert(kind);
        }
        errors
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ErrorKind;
    type IntoIter = std::slice::Iter<'a, ErrorKind>;

    fn into_iter(self) -> Self::IntoIter {
        self.kinds.iter()
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.kinds.len()))?;
        for kind in &self.kinds {
            map.serialize_entry(kind.key(), &true)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_dedups_and_keeps_order() {
        let mut errors = ValidationErrors::new();
        errors.insert(ErrorKind::Pattern);
        errors.insert(ErrorKind::Required);
        errors.insert(ErrorKind::Pattern);
        assert_eq!(errors.keys(), vec!["pattern", "required"]);
    }

    #[test]
    fn test_serializes_as_flag_map() {
        let errors: ValidationErrors =
            [ErrorKind::Required, ErrorKind::Custom("taken".into())].into_iter().collect();
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({ "required": true, "taken": true })
        );
    }

    #[test]
    fn test_into_option() {
        assert!(ValidationErrors::new().into_option().is_none());
        assert!(ValidationErrors::single(ErrorKind::Range).into_option().is_some());
    }
}
