//! Linked-field policies.
//!
//! A policy watches one field (the trigger) and swaps the validators of
//! another field (the target) depending on the trigger's value. The target
//! is revalidated right away, so its validity always reflects the rule for
//! the current trigger value.

use std::rc::Rc;

use log::debug;

use crate::control::{FieldControl, GroupControl};
use crate::error::Result;
use crate::notify::Subscription;
use crate::path::FieldPath;
use crate::validation::{Validatable, Validator};
use crate::value::Value;

/// Declarative rule: trigger value → validators installed on the target.
///
/// # Example
///
/// ```
/// use formwork::prelude::*;
///
/// let form = GroupSchema::new()
///     .value("notification", "email")
///     .value("phone", "")
///     .build()
///     .unwrap();
///
/// let policy = LinkedPolicy::new("notification", "phone")
///     .unwrap()
///     .when("text", vec![Validator::required()]);
/// let _guard = policy.attach(&form).unwrap();
///
/// let phone = form.field("phone").unwrap();
/// assert!(phone.is_valid());
///
/// form.field("notification").unwrap().set_value("text");
/// assert!(!phone.is_valid());
/// ```
#[derive(Debug, Clone)]
pub struct LinkedPolicy {
    trigger: FieldPath,
    target: FieldPath,
    rules: Vec<(Value, Vec<Validator>)>,
    otherwise: Vec<Validator>,
}

impl LinkedPolicy {
    /// Creates a policy with no rules. Until rules are added every trigger
    /// value clears the target's validators.
    pub fn new(trigger: &str, target: &str) -> Result<Self> {
        Ok(Self {
            trigger: FieldPath::parse(trigger)?,
            target: FieldPath::parse(target)?,
            rules: Vec::new(),
            otherwise: Vec::new(),
        })
    }

    /// Installs `validators` when the trigger equals `value`.
    pub fn when(mut self, value: impl Into<Value>, validators: Vec<Validator>) -> Self {
        let value = value.into();
        match self.rules.iter_mut().find(|(v, _)| *v == value) {
            Some(rule) => rule.1 = validators,
            None => self.rules.push((value, validators)),
        }
        self
    }

    /// Validators for values matched by no rule. Empty by default.
    pub fn otherwise(mut self, validators: Vec<Validator>) -> Self {
        self.otherwise = validators;
        self
    }

    pub fn trigger(&self) -> &FieldPath {
        &self.trigger
    }

    pub fn target(&self) -> &FieldPath {
        &self.target
    }

    /// Validators the policy installs for a trigger value.
    pub fn validators_for(&self, value: &Value) -> Vec<Validator> {
        self.rules
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, validators)| validators.clone())
            .unwrap_or_else(|| self.otherwise.clone())
    }

    /// Resolves both paths in `group`, applies the rule for the current
    /// trigger value and keeps applying it on every trigger change.
    ///
    /// Dropping the returned guard stops the policy; the validators last
    /// installed stay in place.
    pub fn attach(&self, group: &GroupControl) -> Result<Subscription> {
        let trigger = group.field(&self.trigger.to_string())?;
        let target = group.field(&self.target.to_string())?;

        let policy = Rc::new(self.clone());
        apply(&policy, &trigger.value(), &target);

        let weak = target.downgrade();
        let subscription = trigger.on_value_change(move |snapshot| {
            if let Some(target) = weak.upgrade() {
                apply(&policy, &snapshot.value, &target);
            }
        });
        debug!("Attached policy {} -> {}", self.trigger, self.target);
        Ok(subscription)
    }
}

fn apply(policy: &LinkedPolicy, value: &Value, target: &FieldControl) {
    let validators = policy.validators_for(value);
    debug!(
        "Policy {} = {}: installing {} validator(s) on {}",
        policy.trigger,
        value,
        validators.len(),
        policy.target
    );
    target.set_validators(validators);
    target.revalidate();
}

/// A set of policies attached together.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    policies: Vec<LinkedPolicy>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, policy: LinkedPolicy) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn policies(&self) -> &[LinkedPolicy] {
        &self.policies
    }

    /// Attaches every policy in order. On the first failure nothing stays
    /// attached.
    pub fn attach_all(&self, group: &GroupControl) -> Result<Vec<Subscription>> {
        self.policies.iter().map(|policy| policy.attach(group)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::control::{FieldSchema, GroupSchema};
    use crate::error::FormError;

    fn form() -> GroupControl {
        GroupSchema::new()
            .value("notification", "email")
            .field("phone", FieldSchema::new(""))
            .group("contact", GroupSchema::new().value("mode", "none").value("handle", ""))
            .build()
            .unwrap()
    }

    fn phone_policy() -> LinkedPolicy {
        LinkedPolicy::new("notification", "phone")
            .unwrap()
            .when("text", vec![Validator::required()])
    }

    #[test]
    fn test_trigger_installs_and_clears() {
        let form = form();
        let _guard = phone_policy().attach(&form).unwrap();
        let notification = form.field("notification").unwrap();
        let phone = form.field("phone").unwrap();

        notification.set_value("text");
        assert!(phone.has_validators());
        assert!(!phone.is_valid());

        phone.set_value("555-1234");
        assert!(phone.is_valid());
        phone.set_value("");
        assert!(!phone.is_valid());

        notification.set_value("email");
        assert!(!phone.has_validators());
        assert!(phone.is_valid());
    }

    #[test]
    fn test_applies_current_value_on_attach() {
        let form = form();
        form.field("notification").unwrap().set_value("text");
        let _guard = phone_policy().attach(&form).unwrap();
        assert!(!form.field("phone").unwrap().is_valid());
    }

    #[test]
    fn test_target_status_event_on_switch() {
        let form = form();
        let _guard = phone_policy().attach(&form).unwrap();
        let events = Rc::new(Cell::new(0));
        let e = Rc::clone(&events);
        let _sub = form
            .field("phone")
            .unwrap()
            .on_status_change(move |_| e.set(e.get() + 1));

        form.field("notification").unwrap().set_value("text");
        assert_eq!(events.get(), 1);
    }

    #[test]
    fn test_otherwise_and_nested_paths() {
        let form = form();
        let policy = LinkedPolicy::new("contact.mode", "contact.handle")
            .unwrap()
            .when("none", vec![])
            .otherwise(vec![Validator::required()]);
        let _guard = policy.attach(&form).unwrap();

        let handle = form.field("contact.handle").unwrap();
        assert!(handle.is_valid());
        form.field("contact.mode").unwrap().set_value("chat");
        assert!(!handle.is_valid());
    }

    #[test]
    fn test_dropping_guard_stops_policy() {
        let form = form();
        let guard = phone_policy().attach(&form).unwrap();
        drop(guard);
        form.field("notification").unwrap().set_value("text");
        assert!(form.field("phone").unwrap().is_valid());
    }

    #[test]
    fn test_attach_fails_on_unknown_paths() {
        let form = form();
        let policy = LinkedPolicy::new("notification", "fax").unwrap();
        assert!(matches!(policy.attach(&form), Err(FormError::UnknownControl { .. })));

        let policy = LinkedPolicy::new("contact", "phone").unwrap();
        assert!(matches!(policy.attach(&form), Err(FormError::KindMismatch { .. })));

        assert!(LinkedPolicy::new("a..b", "phone").is_err());
    }

    #[test]
    fn test_table_attach_all() {
        let form = form();
        let table = PolicyTable::new().with(phone_policy()).with(
            LinkedPolicy::new("notification", "fax").unwrap(),
        );
        assert!(table.attach_all(&form).is_err());

        let table = PolicyTable::new().with(phone_policy());
        let guards = table.attach_all(&form).unwrap();
        assert_eq!(guards.len(), 1);
    }
}
