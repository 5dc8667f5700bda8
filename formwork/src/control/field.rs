//! Leaf controls.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::{ParentLink, publish};
use crate::notify::{ChangeKind, ChangeNotifier};
use crate::validation::{Status, Validatable, ValidationErrors, Validator, run_validators};
use crate::value::Value;

/// State of a field handed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSnapshot {
    pub value: Value,
    pub status: Status,
    pub errors: ValidationErrors,
    pub touched: bool,
    pub dirty: bool,
}

struct FieldState {
    value: Value,
    initial: Value,
    validators: Vec<Validator>,
    errors: ValidationErrors,
    touched: bool,
    dirty: bool,
    /// Status as of the last emitted event.
    status: Status,
}

impl FieldState {
    fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            value: self.value.clone(),
            status: Status::from_valid(self.errors.is_empty()),
            errors: self.errors.clone(),
            touched: self.touched,
            dirty: self.dirty,
        }
    }

    fn run_validators(&mut self) -> bool {
        self.errors = run_validators(&self.validators, &self.value);
        let status = Status::from_valid(self.errors.is_empty());
        let changed = status != self.status;
        self.status = status;
        changed
    }
}

pub(crate) struct FieldNode {
    state: RefCell<FieldState>,
    notifier: ChangeNotifier<FieldSnapshot>,
    parent: RefCell<ParentLink>,
}

/// Handle to a leaf control holding a scalar [`Value`].
///
/// Handles are cheap to clone and all clones refer to the same field.
///
/// # Example
///
/// ```
/// use formwork::prelude::*;
///
/// let field = FieldControl::new("", vec![Validator::required()]);
/// assert!(!field.is_valid());
/// assert!(field.is_pristine());
///
/// field.set_value("Jack");
/// assert!(field.is_valid());
/// assert!(field.is_dirty());
/// ```
#[derive(Clone)]
pub struct FieldControl(pub(crate) Rc<FieldNode>);

/// Non-owning reference to a field.
#[derive(Clone)]
pub struct WeakFieldControl(Weak<FieldNode>);

impl WeakFieldControl {
    pub fn upgrade(&self) -> Option<FieldControl> {
        self.0.upgrade().map(FieldControl)
    }
}

impl FieldControl {
    /// Creates a detached field and runs its validators once.
    pub fn new(initial: impl Into<Value>, validators: Vec<Validator>) -> Self {
        let initial = initial.into();
        let mut state = FieldState {
            value: initial.clone(),
            initial,
            validators,
            errors: ValidationErrors::new(),
            touched: false,
            dirty: false,
            status: Status::Valid,
        };
        state.run_validators();
        Self(Rc::new(FieldNode {
            state: RefCell::new(state),
            notifier: ChangeNotifier::new(),
            parent: RefCell::new(ParentLink::Detached),
        }))
    }

    /// Current value.
    pub fn value(&self) -> Value {
        self.0.state.borrow().value.clone()
    }

    /// Value the field was built with; `reset` restores it.
    pub fn initial_value(&self) -> Value {
        self.0.state.borrow().initial.clone()
    }

    /// Sets the value, marks the field dirty, re-runs validators and
    /// notifies subscribers of this field and then of every ancestor.
    pub fn set_value(&self, value: impl Into<Value>) {
        self.apply_value(value.into());
        self.bubble(ChangeKind::Value);
    }

    /// Validators currently installed, in order.
    pub fn validators(&self) -> Vec<Validator> {
        self.0.state.borrow().validators.clone()
    }

    pub fn has_validators(&self) -> bool {
        !self.0.state.borrow().validators.is_empty()
    }

    /// Replaces the validators. Validity is unchanged until
    /// [`revalidate`](Validatable::revalidate) is called.
    pub fn set_validators(&self, validators: Vec<Validator>) {
        self.0.state.borrow_mut().validators = validators;
    }

    /// Appends a validator. Validity is unchanged until `revalidate`.
    pub fn add_validator(&self, validator: Validator) {
        self.0.state.borrow_mut().validators.push(validator);
    }

    /// Removes every validator. Validity is unchanged until `revalidate`.
    pub fn clear_validators(&self) {
        self.0.state.borrow_mut().validators.clear();
    }

    pub fn downgrade(&self) -> WeakFieldControl {
        WeakFieldControl(Rc::downgrade(&self.0))
    }

    /// Returns `true` if both handles refer to the same field.
    pub fn ptr_eq(&self, other: &FieldControl) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn apply_value(&self, value: Value) {
        let (snapshot, changed) = {
            let mut state = self.0.state.borrow_mut();
            state.value = value;
            state.dirty = true;
            let changed = state.run_validators();
            (state.snapshot(), changed)
        };
        publish(&self.0.notifier, ChangeKind::Value, changed, false, || snapshot);
    }

    pub(crate) fn apply_reset(&self) {
        let (snapshot, changed) = {
            let mut state = self.0.state.borrow_mut();
            state.value = state.initial.clone();
            state.touched = false;
            state.dirty = false;
            let changed = state.run_validators();
            (state.snapshot(), changed)
        };
        publish(&self.0.notifier, ChangeKind::Value, changed, false, || snapshot);
    }

    pub(crate) fn apply_revalidate(&self) -> bool {
        let (snapshot, changed) = {
            let mut state = self.0.state.borrow_mut();
            let changed = state.run_validators();
            (state.snapshot(), changed)
        };
        publish(&self.0.notifier, ChangeKind::Status, changed, true, || snapshot);
        changed
    }

    pub(crate) fn apply_patch(&self, value: &serde_json::Value) {
        match Value::from_json(value) {
            Some(v) => self.apply_value(v),
            None => log::trace!("Ignoring non-scalar patch for a field"),
        }
    }

    pub(crate) fn set_parent(&self, link: ParentLink) {
        *self.0.parent.borrow_mut() = link;
    }

    pub(crate) fn detach(&self) {
        self.set_parent(ParentLink::Detached);
        self.0.notifier.clear();
    }

    fn bubble(&self, kind: ChangeKind) {
        let parent = self.0.parent.borrow().clone();
        parent.notify(kind);
    }
}

impl Validatable for FieldControl {
    type Snapshot = FieldSnapshot;

    fn to_value(&self) -> serde_json::Value {
        self.0.state.borrow().value.to_json()
    }

    fn status(&self) -> Status {
        Status::from_valid(self.0.state.borrow().errors.is_empty())
    }

    fn errors(&self) -> ValidationErrors {
        self.0.state.borrow().errors.clone()
    }

    fn is_touched(&self) -> bool {
        self.0.state.borrow().touched
    }

    fn is_dirty(&self) -> bool {
        self.0.state.borrow().dirty
    }

    fn mark_touched(&self) {
        self.0.state.borrow_mut().touched = true;
    }

    fn revalidate(&self) {
        self.apply_revalidate();
        self.bubble(ChangeKind::Status);
    }

    fn reset(&self) {
        self.apply_reset();
        self.bubble(ChangeKind::Value);
    }

    fn patch_value(&self, value: &serde_json::Value) {
        if Value::from_json(value).is_some() {
            self.apply_patch(value);
            self.bubble(ChangeKind::Value);
        }
    }

    fn snapshot(&self) -> FieldSnapshot {
        self.0.state.borrow().snapshot()
    }

    fn notifier(&self) -> &ChangeNotifier<FieldSnapshot> {
        &self.0.notifier
    }

    fn snapshot_source(&self) -> Box<dyn Fn() -> Option<FieldSnapshot>> {
        let weak = Rc::downgrade(&self.0);
        Box::new(move || weak.upgrade().map(|node| node.state.borrow().snapshot()))
    }
}

impl fmt::Debug for FieldControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.borrow();
        f.debug_struct("FieldControl")
            .field("value", &state.value)
            .field("errors", &state.errors)
            .field("touched", &state.touched)
            .field("dirty", &state.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::validation::ErrorKind;

    #[test]
    fn test_set_value_marks_dirty_and_validates() {
        let field = FieldControl::new("", vec![Validator::required()]);
        assert!(field.errors().contains(&ErrorKind::Required));
        assert!(field.is_pristine());

        field.set_value("Jack");
        assert!(field.is_valid());
        assert!(field.is_dirty());
        assert!(field.is_untouched());
    }

    #[test]
    fn test_required_accepts_whitespace() {
        let field = FieldControl::new("   ", vec![Validator::required()]);
        assert!(field.errors().is_empty());
        assert!(field.is_valid());

        field.set_value("");
        assert_eq!(field.errors().keys(), vec!["required"]);
    }

    #[test]
    fn test_flags_are_independent_and_sticky() {
        let field = FieldControl::new("", vec![]);
        field.mark_touched();
        assert!(field.is_touched());
        assert!(field.is_pristine());

        field.set_value("a");
        field.set_value("");
        assert!(field.is_dirty());
        assert!(field.is_touched());

        field.reset();
        assert!(field.is_pristine());
        assert!(field.is_untouched());
    }

    #[test]
    fn test_set_validators_requires_revalidate() {
        let field = FieldControl::new("", vec![]);
        field.set_validators(vec![Validator::required()]);
        assert!(field.is_valid());

        field.revalidate();
        assert!(!field.is_valid());

        field.clear_validators();
        assert!(!field.is_valid());
        field.revalidate();
        assert!(field.is_valid());
    }

    #[test]
    fn test_revalidate_is_idempotent() {
        let field = FieldControl::new(
            "toolong",
            vec![Validator::max_length(3), Validator::rule("digits", |v| {
                v.as_str().is_some_and(|s| s.chars().all(|c| c.is_ascii_digit()))
            })],
        );
        field.revalidate();
        let first = field.errors();
        field.revalidate();
        assert_eq!(field.errors(), first);
        assert_eq!(first.keys(), vec!["maxlength", "digits"]);
    }

    #[test]
    fn test_events_on_set_value() {
        let field = FieldControl::new("", vec![Validator::required()]);
        let values = Rc::new(Cell::new(0));
        let statuses = Rc::new(Cell::new(0));

        let v = Rc::clone(&values);
        let _a = field.on_value_change(move |_| v.set(v.get() + 1));
        let s = Rc::clone(&statuses);
        let _b = field.on_status_change(move |_| s.set(s.get() + 1));

        field.set_value("a");
        field.set_value("b");
        assert_eq!(values.get(), 2);
        assert_eq!(statuses.get(), 1);
    }

    #[test]
    fn test_revalidate_always_emits_status() {
        let field = FieldControl::new("x", vec![]);
        let statuses = Rc::new(Cell::new(0));
        let s = Rc::clone(&statuses);
        let _sub = field.on_status_change(move |_| s.set(s.get() + 1));

        field.revalidate();
        field.revalidate();
        assert_eq!(statuses.get(), 2);
    }

    #[test]
    fn test_patch_ignores_non_scalars() {
        let field = FieldControl::new("keep", vec![]);
        field.patch_value(&serde_json::json!({ "nested": 1 }));
        assert_eq!(field.value(), Value::from("keep"));
        assert!(field.is_pristine());

        field.patch_value(&serde_json::json!("new"));
        assert_eq!(field.value(), Value::from("new"));
    }

    #[test]
    fn test_snapshot_source_is_weak() {
        let field = FieldControl::new("a", vec![]);
        let source = field.snapshot_source();
        assert_eq!(source().unwrap().value, Value::from("a"));
        drop(field);
        assert!(source().is_none());
    }
}
