//! Ordered lists of groups built from a template.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use super::{ContainerSnapshot, Control, GroupControl, GroupSchema, ParentLink, publish};
use crate::error::{FormError, Result};
use crate::notify::{ChangeKind, ChangeNotifier};
use crate::path::FieldPath;
use crate::validation::{FieldError, Status, Validatable, ValidationErrors, ValidationMessageTable};

struct ArrayState {
    items: Vec<GroupControl>,
    /// Status as of the last emitted event.
    status: Status,
}

pub(crate) struct ArrayNode {
    state: RefCell<ArrayState>,
    template: GroupSchema,
    notifier: ChangeNotifier<ContainerSnapshot>,
    parent: RefCell<ParentLink>,
}

/// Handle to an ordered list of groups sharing one template.
///
/// New items are built from the template with its initial values and start
/// pristine and untouched.
///
/// # Example
///
/// ```
/// use formwork::prelude::*;
///
/// let address = GroupSchema::new()
///     .value("addressType", "home")
///     .value("city", "");
/// let form = GroupSchema::new()
///     .array("addresses", ArraySchema::new(address).with_len(1))
///     .build()
///     .unwrap();
///
/// let addresses = form.array("addresses").unwrap();
/// addresses.push();
/// assert_eq!(addresses.len(), 2);
/// assert_eq!(form.to_value()["addresses"][1]["addressType"], "home");
/// ```
#[derive(Clone)]
pub struct ArrayControl(pub(crate) Rc<ArrayNode>);

impl ArrayControl {
    pub(crate) fn from_parts(template: GroupSchema, len: usize) -> Self {
        let array = Self(Rc::new(ArrayNode {
            state: RefCell::new(ArrayState {
                items: Vec::new(),
                status: Status::Valid,
            }),
            template,
            notifier: ChangeNotifier::new(),
            parent: RefCell::new(ParentLink::Detached),
        }));
        let items: Vec<GroupControl> = (0..len).map(|_| array.build_item()).collect();
        let status = Status::from_valid(items.iter().all(|item| item.is_valid()));
        {
            let mut state = array.0.state.borrow_mut();
            state.items = items;
            state.status = status;
        }
        array
    }

    fn build_item(&self) -> GroupControl {
        let item = self.0.template.build_unchecked();
        item.set_parent(ParentLink::Array(Rc::downgrade(&self.0)));
        item
    }

    pub fn len(&self) -> usize {
        self.0.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at `index`, if any.
    pub fn item(&self, index: usize) -> Option<GroupControl> {
        self.0.state.borrow().items.get(index).cloned()
    }

    /// Item at `index`, or an error naming the array and its length.
    pub fn at(&self, index: usize) -> Result<GroupControl> {
        let len = self.len();
        self.item(index).ok_or_else(|| FormError::IndexOutOfRange {
            path: self.path().to_string(),
            index,
            len,
        })
    }

    /// Path of this array from the root of its tree.
    pub fn path(&self) -> FieldPath {
        let parent = self.0.parent.borrow().clone();
        parent.child_path(|c| matches!(c, Control::Array(a) if a.ptr_eq(self)))
    }

    /// Every item, in order.
    pub fn items(&self) -> Vec<GroupControl> {
        self.0.state.borrow().items.clone()
    }

    /// Schema new items are built from.
    pub fn template(&self) -> &GroupSchema {
        &self.0.template
    }

    /// Appends a fresh item built from the template and returns it.
    pub fn push(&self) -> GroupControl {
        let item = self.build_item();
        let len = {
            let mut state = self.0.state.borrow_mut();
            state.items.push(item.clone());
            state.items.len()
        };
        debug!("Array grew to {} item(s)", len);
        self.refresh(ChangeKind::Value, false);
        self.bubble(ChangeKind::Value);
        item
    }

    /// Returns `true` if both handles refer to the same array.
    pub fn ptr_eq(&self, other: &ArrayControl) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn bubble(&self, kind: ChangeKind) {
        let parent = self.0.parent.borrow().clone();
        parent.notify(kind);
    }

    fn refresh(&self, kind: ChangeKind, force_status: bool) -> bool {
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
        trace!("Array notified of item {:?} change", kind);
        let changed = self.refresh(kind, false);
        if kind == ChangeKind::Value || changed {
            self.bubble(kind);
        }
    }

    pub(crate) fn apply_patch(&self, value: &serde_json::Value) {
        let Some(entries) = value.as_array() else {
            trace!("Ignoring non-array patch for an array");
            return;
        };
        let items = self.items();
        if entries.len() > items.len() {
            trace!(
                "Patch ignores {} item(s) past the end of the array",
                entries.len() - items.len()
            );
        }
        for (item, v) in items.iter().zip(entries) {
            item.apply_patch(v);
        }
        self.refresh(ChangeKind::Value, false);
    }

    pub(crate) fn apply_set(&self, value: &serde_json::Value) {
        if let Some(entries) = value.as_array() {
            for (item, v) in self.items().iter().zip(entries) {
                item.apply_set(v);
            }
        }
        self.refresh(ChangeKind::Value, false);
    }

    pub(crate) fn apply_reset(&self) {
        for item in self.items() {
            item.apply_reset();
        }
        self.refresh(ChangeKind::Value, false);
    }

    pub(crate) fn apply_revalidate(&self) {
        for item in self.items() {
            item.apply_revalidate();
        }
        self.refresh(ChangeKind::Status, true);
    }

    pub(crate) fn check_shape(&self, value: &serde_json::Value, path: &FieldPath) -> Result<()> {
        let Some(entries) = value.as_array() else {
            return Err(FormError::shape(path, "expected an array"));
        };
        let items = self.items();
        if entries.len() != items.len() {
            return Err(FormError::shape(
                path,
                format!("expected {} item(s), got {}", items.len(), entries.len()),
            ));
        }
        for (i, (item, v)) in items.iter().zip(entries).enumerate() {
            item.check_shape(v, &path.index(i))?;
        }
        Ok(())
    }

    pub(crate) fn collect_errors(
        &self,
        path: &FieldPath,
        table: &ValidationMessageTable,
        out: &mut Vec<FieldError>,
    ) {
        for (i, item) in self.items().iter().enumerate() {
            item.collect_errors(&path.index(i), table, out);
        }
    }

    pub(crate) fn set_parent(&self, link: ParentLink) {
        *self.0.parent.borrow_mut() = link;
    }

    pub(crate) fn detach(&self) {
        self.set_parent(ParentLink::Detached);
        self.0.notifier.clear();
        for item in self.items() {
            item.detach();
        }
    }
}

impl Validatable for ArrayControl {
    type Snapshot = ContainerSnapshot;

    fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Array(self.items().iter().map(|item| item.to_value()).collect())
    }

    fn status(&self) -> Status {
        Status::from_valid(self.items().iter().all(|item| item.is_valid()))
    }

    /// Arrays carry no validators of their own.
    fn errors(&self) -> ValidationErrors {
        ValidationErrors::new()
    }

    fn is_touched(&self) -> bool {
        self.items().iter().any(|item| item.is_touched())
    }

    fn is_dirty(&self) -> bool {
        self.items().iter().any(|item| item.is_dirty())
    }

    fn mark_touched(&self) {
        for item in self.items() {
            item.mark_touched();
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
        if value.is_array() {
            self.apply_patch(value);
            self.bubble(ChangeKind::Value);
        }
    }

    fn snapshot(&self) -> ContainerSnapshot {
        ContainerSnapshot {
            value: self.to_value(),
            status: self.status(),
            errors: ValidationErrors::new(),
        }
    }

    fn notifier(&self) -> &ChangeNotifier<ContainerSnapshot> {
        &self.0.notifier
    }

    fn snapshot_source(&self) -> Box<dyn Fn() -> Option<ContainerSnapshot>> {
        let weak = Rc::downgrade(&self.0);
        Box::new(move || weak.upgrade().map(|node| ArrayControl(node).snapshot()))
    }
}

impl fmt::Debug for ArrayControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayControl")
            .field("len", &self.len())
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::control::{ArraySchema, FieldSchema};

    fn form(len: usize) -> GroupControl {
        let address = GroupSchema::new()
            .value("addressType", "home")
            .field("city", FieldSchema::new("").required());
        GroupSchema::new()
            .array("addresses", ArraySchema::new(address).with_len(len))
            .build()
            .unwrap()
    }

    #[test]
    fn test_push_appends_pristine_item() {
        let form = form(1);
        let addresses = form.array("addresses").unwrap();
        addresses.at(0).unwrap().field("city").unwrap().set_value("Paris");

        let item = addresses.push();
        assert_eq!(addresses.len(), 2);
        assert!(item.is_pristine());
        assert!(item.is_untouched());
        assert_eq!(
            form.to_value()["addresses"],
            json!([
                { "addressType": "home", "city": "Paris" },
                { "addressType": "home", "city": "" }
            ])
        );
    }

    #[test]
    fn test_validity_follows_items() {
        let form = form(0);
        assert!(form.is_valid());

        let item = form.array("addresses").unwrap().push();
        assert!(!form.is_valid());

        item.field("city").unwrap().set_value("Oslo");
        assert!(form.is_valid());
    }

    #[test]
    fn test_index_paths() {
        let form = form(2);
        assert!(form.field("addresses.1.city").is_ok());
        assert!(matches!(
            form.field("addresses.2.city"),
            Err(FormError::IndexOutOfRange { index: 2, len: 2, .. })
        ));
        assert!(matches!(
            form.array("addresses").unwrap().at(5),
            Err(FormError::IndexOutOfRange { index: 5, len: 2, .. })
        ));
        assert!(matches!(
            form.field("addresses.city"),
            Err(FormError::KindMismatch { expected: "group", actual: "array", .. })
        ));
    }

    #[test]
    fn test_at_names_the_array() {
        let address = GroupSchema::new().value("city", "");
        let form = GroupSchema::new()
            .group(
                "customer",
                GroupSchema::new().array("addresses", ArraySchema::new(address).with_len(2)),
            )
            .build()
            .unwrap();
        let addresses = form.array("customer.addresses").unwrap();
        assert_eq!(addresses.path().to_string(), "customer.addresses");

        let err = addresses.at(5).unwrap_err();
        assert!(matches!(
            &err,
            FormError::IndexOutOfRange { path, index: 5, len: 2 } if path == "customer.addresses"
        ));
        assert_eq!(
            err.to_string(),
            "Index 5 out of range for array 'customer.addresses' of length 2"
        );
        assert_eq!(
            addresses.at(1).unwrap().path().to_string(),
            "customer.addresses.1"
        );
    }

    #[test]
    fn test_item_changes_bubble_to_root() {
        let form = form(1);
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let _sub = form.on_value_change(move |_| c.set(c.get() + 1));

        form.field("addresses.0.city").unwrap().set_value("Rome");
        assert_eq!(count.get(), 1);

        form.array("addresses").unwrap().push();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_patch_skips_missing_items() {
        let form = form(1);
        form.patch_value(&json!({
            "addresses": [{ "city": "Lima" }, { "city": "Quito" }]
        }));
        let addresses = form.array("addresses").unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!(form.field("addresses.0.city").unwrap().value(), "Lima".into());
    }

    #[test]
    fn test_set_value_checks_length() {
        let form = form(1);
        let err = form
            .set_value(&json!({ "addresses": [] }))
            .unwrap_err();
        assert!(matches!(err, FormError::ShapeMismatch { path, .. } if path == "addresses"));
    }

    #[test]
    fn test_validate_reports_item_paths() {
        let form = form(2);
        form.field("addresses.0.city").unwrap().set_value("Bern");
        let result = form.validate(&ValidationMessageTable::defaults());
        assert_eq!(result.first_invalid_path().unwrap().to_string(), "addresses.1.city");
    }
}
