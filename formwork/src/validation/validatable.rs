//! Validatable trait shared by every control kind.

use std::time::Duration;

use super::errors::ValidationErrors;
use crate::notify::{ChangeKind, ChangeNotifier, Scheduler, Subscription};

/// Derived validity of a control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Valid,
    Invalid,
}

impl Status {
    pub fn is_valid(self) -> bool {
        self == Status::Valid
    }

    pub(crate) fn from_valid(valid: bool) -> Self {
        if valid { Status::Valid } else { Status::Invalid }
    }
}

/// Common interface of fields, groups and arrays.
///
/// The provided subscription methods are built on [`notifier`](Self::notifier)
/// and [`snapshot_source`](Self::snapshot_source), so every control kind gets
/// the same immediate and debounced subscription API.
pub trait Validatable {
    /// State handed to subscribers.
    type Snapshot: Clone + 'static;

    /// Plain value of the control, without validation state.
    fn to_value(&self) -> serde_json::Value;

    /// Current validity. Containers are valid when their own errors are
    /// empty and every child is valid.
    fn status(&self) -> Status;

    fn is_valid(&self) -> bool {
        self.status().is_valid()
    }

    /// Errors reported by this control's own validators.
    fn errors(&self) -> ValidationErrors;

    /// Touched flag. Containers report `true` if any descendant is touched.
    fn is_touched(&self) -> bool;

    /// Dirty flag. Containers report `true` if any descendant is dirty.
    fn is_dirty(&self) -> bool;

    fn is_pristine(&self) -> bool {
        !self.is_dirty()
    }

    fn is_untouched(&self) -> bool {
        !self.is_touched()
    }

    /// Marks the control (and all descendants) as touched.
    fn mark_touched(&self);

    /// Recomputes errors synchronously and emits a status event.
    fn revalidate(&self);

    /// Restores initial values and clears the touched and dirty flags.
    fn reset(&self);

    /// Applies a partial value. Keys and indices that match nothing are
    /// ignored.
    fn patch_value(&self, value: &serde_json::Value);

    /// Captures the current state for subscribers.
    fn snapshot(&self) -> Self::Snapshot;

    /// The control's notifier.
    fn notifier(&self) -> &ChangeNotifier<Self::Snapshot>;

    /// Returns a closure producing a fresh snapshot while the control is
    /// alive. The closure does not keep the control alive.
    fn snapshot_source(&self) -> Box<dyn Fn() -> Option<Self::Snapshot>>;

    /// Subscribes to every change.
    fn on_change<F>(&self, f: F) -> Subscription
    where
        F: Fn(ChangeKind, &Self::Snapshot) + 'static,
    {
        self.notifier().subscribe(None, f)
    }

    /// Subscribes to value changes.
    fn on_value_change<F>(&self, f: F) -> Subscription
    where
        F: Fn(&Self::Snapshot) + 'static,
    {
        self.notifier()
            .subscribe(Some(ChangeKind::Value), move |_, snapshot| f(snapshot))
    }

    /// Subscribes to status changes.
    fn on_status_change<F>(&self, f: F) -> Subscription
    where
        F: Fn(&Self::Snapshot) + 'static,
    {
        self.notifier()
            .subscribe(Some(ChangeKind::Status), move |_, snapshot| f(snapshot))
    }

    /// Subscribes to value changes, coalesced over a quiet period.
    ///
    /// The callback receives the state at timer expiry; intermediate values
    /// are skipped.
    fn debounce_value_changes<F>(&self, scheduler: &Scheduler, quiet: Duration, f: F) -> Subscription
    where
        F: Fn(&Self::Snapshot) + 'static,
    {
        self.notifier().subscribe_debounced(
            Some(ChangeKind::Value),
            scheduler,
            quiet,
            self.snapshot_source(),
            f,
        )
    }
}
