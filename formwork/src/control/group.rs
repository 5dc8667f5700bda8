//! Named composites of controls.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use super::{ArrayControl, Control, ContainerSnapshot, FieldControl, ParentLink, publish};
use crate::error::{FormError, Result};
use crate::notify::{ChangeKind, ChangeNotifier};
use crate::path::{FieldPath, Segment, check_control_name};
use crate::validation::{
    FieldError, GroupValidator, Status, Validatable, ValidationErrors, ValidationMessageTable,
    ValidationResult,
};

struct GroupState {
    children: Vec<(String, Control)>,
    validators: Vec<GroupValidator>,
    errors: ValidationErrors,
    /// Status as of the last emitted event.
    status: Status,
}

pub(crate) struct GroupNode {
    state: RefCell<GroupState>,
    notifier: ChangeNotifier<ContainerSnapshot>,
    parent: RefCell<ParentLink>,
}

/// Handle to an ordered, named group of controls.
///
/// Lookups take dot-separated paths (see [`FieldPath`]) and return typed
/// handles or a [`FormError`]; they never hand back a placeholder for a
/// missing control.
///
/// # Example
///
/// ```
/// use formwork::prelude::*;
///
/// let form = GroupSchema::new()
///     .group(
///         "emailGroup",
///         GroupSchema::new()
///             .field("email", FieldSchema::new("").required())
///             .value("confirmEmail", ""),
///     )
///     .value("phone", "")
///     .build()
///     .unwrap();
///
/// let email = form.field("emailGroup.email").unwrap();
/// email.set_value("jack@example.com");
/// assert_eq!(form.to_value()["emailGroup"]["email"], "jack@example.com");
/// assert!(form.field("emailGroup.missing").is_err());
/// ```
#[derive(Clone)]
pub struct GroupControl(pub(crate) Rc<GroupNode>);

impl GroupControl {
    /// Creates an empty, detached group.
    pub fn new() -> Self {
        Self::from_parts(Vec::new(), Vec::new())
    }

    pub(crate) fn from_parts(children: Vec<(String, Control)>, validators: Vec<GroupValidator>) -> Self {
        let group = Self(Rc::new(GroupNode {
            state: RefCell::new(GroupState {
                children,
                validators,
                errors: ValidationErrors::new(),
                status: Status::Valid,
            }),
            notifier: ChangeNotifier::new(),
            parent: RefCell::new(ParentLink::Detached),
        }));
        for (_, child) in group.children() {
            child.set_parent(group.link());
        }
        let errors = group.run_validators();
        group.0.state.borrow_mut().errors = errors;
        let status = group.status();
        group.0.state.borrow_mut().status = status;
        group
    }

    /// Direct child by name.
    pub fn control(&self, name: &str) -> Option<Control> {
        self.0
            .state
            .borrow()
            .children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.clone())
    }

    /// Returns `true` if a direct child with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.0.state.borrow().children.iter().any(|(n, _)| n == name)
    }

    /// Names of the direct children, in order.
    pub fn names(&self) -> Vec<String> {
        self.0
            .state
            .borrow()
            .children
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.state.borrow().children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves a dot-separated path.
    pub fn get(&self, path: &str) -> Result<Control> {
        self.resolve(&FieldPath::parse(path)?)
    }

    /// Resolves a parsed path. The root path resolves to this group.
    pub fn resolve(&self, path: &FieldPath) -> Result<Control> {
        let mut current = Control::Group(self.clone());
        for (i, segment) in path.segments().iter().enumerate() {
            let here = path.prefix(i);
            let next = match (segment, &current) {
                (Segment::Name(name), Control::Group(group)) => group
                    .control(name)
                    .ok_or_else(|| FormError::unknown(path.prefix(i + 1)))?,
                (Segment::Index(index), Control::Array(array)) => {
                    let len = array.len();
                    let item = array.item(*index).ok_or(FormError::IndexOutOfRange {
                        path: here.to_string(),
                        index: *index,
                        len,
                    })?;
                    Control::Group(item)
                }
                (Segment::Name(_), other) => {
                    return Err(FormError::kind_mismatch(here, "group", other.kind_name()));
                }
                (Segment::Index(_), other) => {
                    return Err(FormError::kind_mismatch(here, "array", other.kind_name()));
                }
            };
            current = next;
        }
        Ok(current)
    }

    /// Resolves a path that must lead to a field.
    pub fn field(&self, path: &str) -> Result<FieldControl> {
        let path = FieldPath::parse(path)?;
        let control = self.resolve(&path)?;
        let actual = control.kind_name();
        control
            .into_field()
            .ok_or_else(|| FormError::kind_mismatch(&path, "field", actual))
    }

    /// Resolves a path that must lead to a group.
    pub fn group(&self, path: &str) -> Result<GroupControl> {
        let path = FieldPath::parse(path)?;
        let control = self.resolve(&path)?;
        let actual = control.kind_name();
        control
            .into_group()
            .ok_or_else(|| FormError::kind_mismatch(&path, "group", actual))
    }

    /// Resolves a path that must lead to an array.
    pub fn array(&self, path: &str) -> Result<ArrayControl> {
        let path = FieldPath::parse(path)?;
        let control = self.resolve(&path)?;
        let actual = control.kind_name();
        control
            .into_array()
            .ok_or_else(|| FormError::kind_mismatch(&path, "array", actual))
    }

    /// Appends a new child. Fails if the name is invalid or taken.
    pub fn add_control(&self, name: &str, control: impl Into<Control>) -> Result<()> {
        check_control_name(name)?;
        if self.contains(name) {
            return Err(FormError::DuplicateControl {
                path: String::new(),
                name: name.to_string(),
            });
        }
        let control = control.into();
        control.set_parent(self.link());
        self.0
            .state
            .borrow_mut()
            .children
            .push((name.to_string(), control));
        debug!("Added control '{}'", name);
        self.changed();
        Ok(())
    }

    /// Inserts or replaces a child. A replaced control is detached and its
    /// subscriptions are dropped; it is returned to the caller.
    pub fn set_control(&self, name: &str, control: impl Into<Control>) -> Result<Option<Control>> {
        check_control_name(name)?;
        let control = control.into();
        control.set_parent(self.link());
        let old = {
            let mut state = self.0.state.borrow_mut();
            match state.children.iter_mut().find(|(n, _)| n == name) {
                Some(entry) => Some(std::mem::replace(&mut entry.1, control)),
                None => {
                    state.children.push((name.to_string(), control));
                    None
                }
            }
        };
        if let Some(old) = &old {
            old.detach();
            debug!("Replaced control '{}'", name);
        }
        self.changed();
        Ok(old)
    }

    /// Removes a child. The removed control is detached and its
    /// subscriptions are dropped.
    pub fn remove_control(&self, name: &str) -> Option<Control> {
        let removed = {
            let mut state = self.0.state.borrow_mut();
            let pos = state.children.iter().position(|(n, _)| n == name)?;
            state.children.remove(pos).1
        };
        removed.detach();
        debug!("Removed control '{}'", name);
        self.changed();
        Some(removed)
    }

    /// Replaces every value. The value must have exactly the shape of the
    /// tree; on mismatch nothing is applied.
    pub fn set_value(&self, value: &serde_json::Value) -> Result<()> {
        self.check_shape(value, &FieldPath::root())?;
        self.apply_set(value);
        self.bubble(ChangeKind::Value);
        Ok(())
    }

    /// Group validators currently installed.
    pub fn validators(&self) -> Vec<GroupValidator> {
        self.0.state.borrow().validators.clone()
    }

    /// Replaces the group validators. Takes effect on `revalidate`.
    pub fn set_validators(&self, validators: Vec<GroupValidator>) {
        self.0.state.borrow_mut().validators = validators;
    }

    /// Appends a group validator. Takes effect on `revalidate`.
    pub fn add_validator(&self, validator: GroupValidator) {
        self.0.state.borrow_mut().validators.push(validator);
    }

    /// Removes every group validator. Takes effect on `revalidate`.
    pub fn clear_validators(&self) {
        self.0.state.borrow_mut().validators.clear();
    }

    /// Collects every invalid control of the tree, in tree order.
    pub fn validate(&self, table: &ValidationMessageTable) -> ValidationResult {
        let mut errors = Vec::new();
        self.collect_errors(&FieldPath::root(), table, &mut errors);
        ValidationResult::from_errors(errors)
    }

    /// Returns `true` if both handles refer to the same group.
    pub fn ptr_eq(&self, other: &GroupControl) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Path of this group from the root of its tree. A detached group is a
    /// root.
    pub fn path(&self) -> FieldPath {
        let parent = self.0.parent.borrow().clone();
        parent.child_path(|c| matches!(c, Control::Group(g) if g.ptr_eq(self)))
    }

    pub(crate) fn children(&self) -> Vec<(String, Control)> {
        self.0.state.borrow().children.clone()
    }

    fn link(&self) -> ParentLink {
        ParentLink::Group(Rc::downgrade(&self.0))
    }

    fn bubble(&self, kind: ChangeKind) {
        let parent = self.0.parent.borrow().clone();
        parent.notify(kind);
    }

    fn changed(&self) {
        self.refresh(ChangeKind::Value, false);
        self.bubble(ChangeKind::Value);
    }

    fn run_validators(&self) -> ValidationErrors {
        let validators = self.validators();
        let mut errors = ValidationErrors::new();
        for validator in &validators {
            if let Some(found) = validator.validate(self) {
                errors.merge(found);
            }
        }
        errors
    }

    /// Re-runs group validators and emits events. Returns `true` if the
    /// status differs from the last emitted one.
    fn refresh(&self, kind: ChangeKind, force_status: bool) -> bool {
        let errors = self.run_validators();
        self.0.state.borrow_mut().errors = errors;
        let status = self.status();
        let changed = {
            let mut state = self.0.state.borrow_mut();
            let changed = state.status != status;
            state.status = status;
            changed
        };
        publish(&self.0.notifier, kind, changed, force_status, || self.snapshot());
        changed
    }

    pub(crate) fn child_changed(&self, kind: ChangeKind) {
        trace!("Group notified of child {:?} change", kind);
        let changed = self.refresh(kind, false);
        if kind == ChangeKind::Value || changed {
            self.bubble(kind);
        }
    }

    pub(crate) fn apply_patch(&self, value: &serde_json::Value) {
        let Some(entries) = value.as_object() else {
            trace!("Ignoring non-object patch for a group");
            return;
        };
        for (key, v) in entries {
            match self.control(key) {
                Some(child) => child.apply_patch(v),
                None => trace!("Patch ignores unknown key '{}'", key),
            }
        }
        self.refresh(ChangeKind::Value, false);
    }

    pub(crate) fn apply_set(&self, value: &serde_json::Value) {
        for (name, child) in self.children() {
            if let Some(v) = value.get(&name) {
                child.apply_set(v);
            }
        }
        self.refresh(ChangeKind::Value, false);
    }

    pub(crate) fn apply_reset(&self) {
        for (_, child) in self.children() {
            child.apply_reset();
        }
        self.refresh(ChangeKind::Value, false);
    }

    pub(crate) fn apply_revalidate(&self) {
        for (_, child) in self.children() {
            child.apply_revalidate();
        }
        self.refresh(ChangeKind::Status, true);
    }

    pub(crate) fn check_shape(&self, value: &serde_json::Value, path: &FieldPath) -> Result<()> {
        let Some(entries) = value.as_object() else {
            return Err(FormError::shape(path, "expected an object"));
        };
        let children = self.children();
        for key in entries.keys() {
            if !children.iter().any(|(n, _)| n == key) {
                return Err(FormError::shape(path, format!("unknown key '{}'", key)));
            }
        }
        for (name, child) in &children {
            match entries.get(name) {
                Some(v) => child.check_shape(v, &path.child(name.as_str()))?,
                None => return Err(FormError::shape(path, format!("missing key '{}'", name))),
            }
        }
        Ok(())
    }

    pub(crate) fn collect_errors(
        &self,
        path: &FieldPath,
        table: &ValidationMessageTable,
        out: &mut Vec<FieldError>,
    ) {
        let errors = self.errors();
        if !errors.is_empty() {
            out.push(FieldError {
                path: path.clone(),
                message: table.message_for(&errors),
                errors,
            });
        }
        for (name, child) in self.children() {
            child.collect_errors(&path.child(name), table, out);
        }
    }

    pub(crate) fn set_parent(&self, link: ParentLink) {
        *self.0.parent.borrow_mut() = link;
    }

    pub(crate) fn detach(&self) {
        self.set_parent(ParentLink::Detached);
        self.0.notifier.clear();
        for (_, child) in self.children() {
            child.detach();
        }
    }
}

impl Default for GroupControl {
    fn default() -> Self {
        Self::new()
    }
}

impl Validatable for GroupControl {
    type Snapshot = ContainerSnapshot;

    fn to_value(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .children()
            .into_iter()
            .map(|(name, child)| (name, child.to_value()))
            .collect();
        serde_json::Value::Object(map)
    }

    fn status(&self) -> Status {
        let own_valid = self.0.state.borrow().errors.is_empty();
        Status::from_valid(own_valid && self.children().iter().all(|(_, c)| c.is_valid()))
    }

    fn errors(&self) -> ValidationErrors {
        self.0.state.borrow().errors.clone()
    }

    fn is_touched(&self) -> bool {
        self.children().iter().any(|(_, c)| c.is_touched())
    }

    fn is_dirty(&self) -> bool {
        self.children().iter().any(|(_, c)| c.is_dirty())
    }

    fn mark_touched(&self) {
        for (_, child) in self.children() {
            child.mark_touched();
        }
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
        if value.is_object() {
            self.apply_patch(value);
            self.bubble(ChangeKind::Value);
        }
    }

    fn snapshot(&self) -> ContainerSnapshot {
        ContainerSnapshot {
            value: self.to_value(),
            status: self.status(),
            errors: self.errors(),
        }
    }

    fn notifier(&self) -> &ChangeNotifier<ContainerSnapshot> {
        &self.0.notifier
    }

    fn snapshot_source(&self) -> Box<dyn Fn() -> Option<ContainerSnapshot>> {
        let weak = Rc::downgrade(&self.0);
        Box::new(move || weak.upgrade().map(|node| GroupControl(node).snapshot()))
    }
}

impl fmt::Debug for GroupControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupControl")
            .field("names", &self.names())
            .field("errors", &self.errors())
            .finish()
    }
}
