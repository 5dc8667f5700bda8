//! Validator registry.
//!
//! A [`Validator`] is a pure function from a field value to an optional set
//! of errors. The built-ins cover the usual input checks; anything else goes
//! through [`Validator::new`] or [`Validator::rule`]. A [`GroupValidator`]
//! does the same for a whole group, which is how cross-field rules are
//! expressed.

use std::fmt;
use std::rc::Rc;

use regex::Regex;

use super::errors::{ErrorKind, ValidationErrors};
use super::validatable::Validatable;
use crate::control::GroupControl;
use crate::error::{FormError, Result};
use crate::value::Value;

/// Type alias for field rule closures.
type FieldRule = Rc<dyn Fn(&Value) -> Option<ValidationErrors>>;

/// Type alias for group rule closures.
type GroupRule = Rc<dyn Fn(&GroupControl) -> Option<ValidationErrors>>;

fn fail(kind: ErrorKind) -> Option<ValidationErrors> {
    Some(ValidationErrors::single(kind))
}

/// A pure, cloneable validation rule for a single field.
///
/// # Example
///
/// ```
/// use formwork::{Value, validation::{ErrorKind, Validator}};
///
/// let rating = Validator::range_between(2.0, 5.0);
/// assert!(rating.validate(&Value::Null).is_none());
/// assert!(rating.validate(&Value::from(3)).is_none());
/// assert!(rating.validate(&Value::from(6)).unwrap().contains(&ErrorKind::Range));
/// ```
#[derive(Clone)]
pub struct Validator {
    name: Rc<str>,
    rule: FieldRule,
}

impl Validator {
    /// Creates a validator from a closure returning the errors it finds.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Option<ValidationErrors> + 'static,
    {
        Self {
            name: Rc::from(name.into()),
            rule: Rc::new(f),
        }
    }

    /// Creates a validator from a predicate.
    ///
    /// The predicate returns `true` for acceptable values; a rejected value
    /// reports `ErrorKind::Custom(name)`.
    pub fn rule<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        let name = name.into();
        let kind = ErrorKind::Custom(name.clone());
        Self::new(name, move |v| if f(v) { None } else { fail(kind.clone()) })
    }

    /// Name used in debug output.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the rule against a value.
    pub fn validate(&self, value: &Value) -> Option<ValidationErrors> {
        (self.rule)(value)
    }

    /// Fails on `Null` and on the empty string. Whitespace-only input passes.
    pub fn required() -> Self {
        Self::new("required", |v| {
            if v.is_empty() {
                fail(ErrorKind::Required)
            } else {
                None
            }
        })
    }

    /// Requires at least `min` characters. Empty input is accepted; combine
    /// with [`required`](Self::required) to reject it.
    pub fn min_length(min: usize) -> Self {
        Self::new("minlength", move |v| match v.as_str() {
            Some(s) if !s.is_empty() && s.chars().count() < min => fail(ErrorKind::MinLength),
            _ => None,
        })
    }

    /// Allows at most `max` characters.
    pub fn max_length(max: usize) -> Self {
        Self::new("maxlength", move |v| match v.as_str() {
            Some(s) if s.chars().count() > max => fail(ErrorKind::MaxLength),
            _ => None,
        })
    }

    /// Requires the whole value to match `pattern`.
    ///
    /// The pattern is anchored at both ends. Empty input is accepted. Numbers
    /// and booleans are matched against their display form.
    pub fn pattern(pattern: &str) -> Result<Self> {
        let re = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| FormError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new("pattern", move |v| {
            if v.is_null() {
                return None;
            }
            let text = v.to_string();
            if text.is_empty() || re.is_match(&text) {
                None
            } else {
                fail(ErrorKind::Pattern)
            }
        }))
    }

    /// Requires a valid email address. Empty input is accepted.
    pub fn email() -> Self {
        Self::new("email", |v| match v.as_str() {
            Some(s) if !s.is_empty() && !email_address::EmailAddress::is_valid(s) => {
                fail(ErrorKind::Email)
            }
            Some(_) => None,
            None if v.is_null() => None,
            None => fail(ErrorKind::Email),
        })
    }

    /// Requires a numeric value within `[min, max]`.
    ///
    /// `Null` is not applicable and passes. Anything else that has no numeric
    /// view (see [`Value::as_f64`]) fails.
    pub fn range_between(min: f64, max: f64) -> Self {
        Self::new("range", move |v| {
            if v.is_null() {
                return None;
            }
            match v.as_f64() {
                Some(n) if n >= min && n <= max => None,
                _ => fail(ErrorKind::Range),
            }
        })
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator").field(&self.name).finish()
    }
}

/// Runs every validator and returns the union of their errors.
pub fn run_validators(validators: &[Validator], value: &Value) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for validator in validators {
        if let Some(found) = validator.validate(value) {
            errors.merge(found);
        }
    }
    errors
}

/// A validation rule evaluated against a whole group.
///
/// Group errors belong to the group itself; children keep their own.
#[derive(Clone)]
pub struct GroupValidator {
    name: Rc<str>,
    rule: GroupRule,
}

impl GroupValidator {
    /// Creates a group validator from a closure.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&GroupControl) -> Option<ValidationErrors> + 'static,
    {
        Self {
            name: Rc::from(name.into()),
            rule: Rc::new(f),
        }
    }

    /// Requires two sibling fields to hold equal values.
    ///
    /// Nothing is reported while either field is still pristine, or when
    /// either name does not resolve to a field.
    pub fn fields_match(first: impl Into<String>, second: impl Into<String>) -> Self {
        let first = first.into();
        let second = second.into();
        Self::new("match", move |group| {
            let a = group.control(&first)?.into_field()?;
            let b = group.control(&second)?.into_field()?;
            if a.is_pristine() || b.is_pristine() || a.value() == b.value() {
                None
            } else {
                fail(ErrorKind::Match)
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the rule against a group.
    pub fn validate(&self, group: &GroupControl) -> Option<ValidationErrors> {
        (self.rule)(group)
    }
}

impl fmt::Debug for GroupValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GroupValidator").field(&self.name).finish()
    }
}
