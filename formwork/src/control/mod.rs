//! Control tree: fields, groups and arrays.
//!
//! Controls are reference-counted handles. A group or array owns its
//! children; children keep a weak link back so that a change to a field is
//! reported to every ancestor, leaf first:
//!
//! ```text
//! field.set_value(v)
//!   field: Value event (+ Status event if validity flipped)
//!   parent group: group validators re-run, Value event (+ Status)
//!   ... up to the root
//! ```
//!
//! Bulk operations (`patch_value`, `reset`, group `set_value`) apply to the
//! whole subtree first and then report once per container.

mod array;
mod field;
mod group;
mod schema;

use std::rc::Weak;

pub use array::ArrayControl;
pub use field::{FieldControl, FieldSnapshot, WeakFieldControl};
pub use group::GroupControl;
pub use schema::{ArraySchema, ControlSchema, FieldSchema, GroupSchema};

pub(crate) use array::ArrayNode;
pub(crate) use group::GroupNode;

use crate::error::Result;
use crate::notify::{ChangeKind, ChangeNotifier};
use crate::path::FieldPath;
use crate::validation::{FieldError, Status, Validatable, ValidationErrors, ValidationMessageTable};

/// State of a group or array handed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSnapshot {
    /// Nested value, as returned by `to_value()`.
    pub value: serde_json::Value,
    pub status: Status,
    /// The container's own errors (group validators only).
    pub errors: ValidationErrors,
}

/// Any node of a control tree.
#[derive(Debug, Clone)]
pub enum Control {
    Field(FieldControl),
    Group(GroupControl),
    Array(ArrayControl),
}

impl Control {
    /// Human-readable kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Control::Field(_) => "field",
            Control::Group(_) => "group",
            Control::Array(_) => "array",
        }
    }

    pub fn as_field(&self) -> Option<&FieldControl> {
        match self {
            Control::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupControl> {
        match self {
            Control::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayControl> {
        match self {
            Control::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_field(self) -> Option<FieldControl> {
        match self {
            Control::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn into_group(self) -> Option<GroupControl> {
        match self {
            Control::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<ArrayControl> {
        match self {
            Control::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Control::Field(f) => f.to_value(),
            Control::Group(g) => g.to_value(),
            Control::Array(a) => a.to_value(),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Control::Field(f) => f.status(),
            Control::Group(g) => g.status(),
            Control::Array(a) => a.status(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status().is_valid()
    }

    pub fn errors(&self) -> ValidationErrors {
        match self {
            Control::Field(f) => f.errors(),
            Control::Group(g) => g.errors(),
            Control::Array(a) => a.errors(),
        }
    }

    pub fn is_touched(&self) -> bool {
        match self {
            Control::Field(f) => f.is_touched(),
            Control::Group(g) => g.is_touched(),
            Control::Array(a) => a.is_touched(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            Control::Field(f) => f.is_dirty(),
            Control::Group(g) => g.is_dirty(),
            Control::Array(a) => a.is_dirty(),
        }
    }

    pub fn mark_touched(&self) {
        match self {
            Control::Field(f) => f.mark_touched(),
            Control::Group(g) => g.mark_touched(),
            Control::Array(a) => a.mark_touched(),
        }
    }

    pub fn revalidate(&self) {
        match self {
            Control::Field(f) => f.revalidate(),
            Control::Group(g) => g.revalidate(),
            Control::Array(a) => a.revalidate(),
        }
    }

    pub fn reset(&self) {
        match self {
            Control::Field(f) => f.reset(),
            Control::Group(g) => g.reset(),
            Control::Array(a) => a.reset(),
        }
    }

    pub fn patch_value(&self, value: &serde_json::Value) {
        match self {
            Control::Field(f) => f.patch_value(value),
            Control::Group(g) => g.patch_value(value),
            Control::Array(a) => a.patch_value(value),
        }
    }

    pub(crate) fn apply_patch(&self, value: &serde_json::Value) {
        match self {
            Control::Field(f) => f.apply_patch(value),
            Control::Group(g) => g.apply_patch(value),
            Control::Array(a) => a.apply_patch(value),
        }
    }

    pub(crate) fn apply_set(&self, value: &serde_json::Value) {
        match self {
            Control::Field(f) => {
                if let Some(v) = crate::value::Value::from_json(value) {
                    f.apply_value(v);
                }
            }
            Control::Group(g) => g.apply_set(value),
            Control::Array(a) => a.apply_set(value),
        }
    }

    pub(crate) fn apply_reset(&self) {
        match self {
            Control::Field(f) => f.apply_reset(),
            Control::Group(g) => g.apply_reset(),
            Control::Array(a) => a.apply_reset(),
        }
    }

    pub(crate) fn apply_revalidate(&self) {
        match self {
            Control::Field(f) => {
                f.apply_revalidate();
            }
            Control::Group(g) => g.apply_revalidate(),
            Control::Array(a) => a.apply_revalidate(),
        }
    }

    pub(crate) fn check_shape(&self, value: &serde_json::Value, path: &FieldPath) -> Result<()> {
        match self {
            Control::Field(_) => match crate::value::Value::from_json(value) {
                Some(_) => Ok(()),
                None => Err(crate::error::FormError::shape(path, "expected a scalar")),
            },
            Control::Group(g) => g.check_shape(value, path),
            Control::Array(a) => a.check_shape(value, path),
        }
    }

    pub(crate) fn collect_errors(
        &self,
        path: &FieldPath,
        table: &ValidationMessageTable,
        out: &mut Vec<FieldError>,
    ) {
        match self {
            Control::Field(f) => {
                let errors = f.errors();
                if !errors.is_empty() {
                    out.push(FieldError {
                        path: path.clone(),
                        message: table.message_for(&errors),
                        errors,
                    });
                }
            }
            Control::Group(g) => g.collect_errors(path, table, out),
            Control::Array(a) => a.collect_errors(path, table, out),
        }
    }

    pub(crate) fn set_parent(&self, link: ParentLink) {
        match self {
            Control::Field(f) => f.set_parent(link),
            Control::Group(g) => g.set_parent(link),
            Control::Array(a) => a.set_parent(link),
        }
    }

    /// Unlinks the control from its parent and drops every subscription in
    /// its subtree, cancelling pending debounce timers.
    pub(crate) fn detach(&self) {
        match self {
            Control::Field(f) => f.detach(),
            Control::Group(g) => g.detach(),
            Control::Array(a) => a.detach(),
        }
    }
}

impl From<FieldControl> for Control {
    fn from(f: FieldControl) -> Self {
        Control::Field(f)
    }
}

impl From<GroupControl> for Control {
    fn from(g: GroupControl) -> Self {
        Control::Group(g)
    }
}

impl From<ArrayControl> for Control {
    fn from(a: ArrayControl) -> Self {
        Control::Array(a)
    }
}

/// Weak link from a control to the container holding it.
#[derive(Clone, Default)]
pub(crate) enum ParentLink {
    #[default]
    Detached,
    Group(Weak<GroupNode>),
    Array(Weak<ArrayNode>),
}

impl ParentLink {
    /// Reports a child change to the parent, which re-validates itself and
    /// passes the change on to its own parent.
    pub(crate) fn notify(&self, kind: ChangeKind) {
        match self {
            ParentLink::Detached => {}
            ParentLink::Group(weak) => {
                if let Some(node) = weak.upgrade() {
                    GroupControl(node).child_changed(kind);
                }
            }
            ParentLink::Array(weak) => {
                if let Some(node) = weak.upgrade() {
                    ArrayControl(node).child_changed(kind);
                }
            }
        }
    }
}

impl ParentLink {
    /// Path of the child matching `is_child`, built by walking up to the
    /// root. A detached child is a root.
    pub(crate) fn child_path(&self, is_child: impl Fn(&Control) -> bool) -> FieldPath {
        match self {
            ParentLink::Detached => FieldPath::root(),
            ParentLink::Group(weak) => {
                let Some(node) = weak.upgrade() else {
                    return FieldPath::root();
                };
                let group = GroupControl(node);
                let name = group
                    .children()
                    .into_iter()
                    .find_map(|(name, child)| is_child(&child).then_some(name));
                match name {
                    Some(name) => group.path().child(name),
                    None => group.path(),
                }
            }
            ParentLink::Array(weak) => {
                let Some(node) = weak.upgrade() else {
                    return FieldPath::root();
                };
                let array = ArrayControl(node);
                let index = array
                    .items()
                    .into_iter()
                    .position(|item| is_child(&Control::Group(item)));
                match index {
                    Some(index) => array.path().index(index),
                    None => array.path(),
                }
            }
        }
    }
}

/// Emits the events for one control after a change.
///
/// A `Value` change always emits a value event. A status event follows when
/// validity flipped or when `force_status` is set (explicit revalidation).
pub(crate) fn publish<E: 'static>(
    notifier: &ChangeNotifier<E>,
    kind: ChangeKind,
    status_changed: bool,
    force_status: bool,
    snapshot: impl FnOnce() -> E,
) {
    let emit_status = status_changed || force_status;
    if kind == ChangeKind::Status && !emit_status {
        return;
    }
    let snapshot = snapshot();
    if kind == ChangeKind::Value {
        notifier.emit(ChangeKind::Value, &snapshot);
    }
    if emit_status {
        notifier.emit(ChangeKind::Status, &snapshot);
    }
}
