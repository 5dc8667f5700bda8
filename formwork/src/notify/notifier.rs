//! Per-control change notifier.
//!
//! Every control owns one [`ChangeNotifier`]. Subscribers are either
//! immediate (called synchronously during `emit`, in subscription order) or
//! debounced (each `emit` restarts a timer on a [`Scheduler`]; the callback
//! runs once the quiet period elapses, with the state current at that
//! moment).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use log::trace;

use super::scheduler::{Scheduler, TimerKey};

/// What changed on a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The value changed (set, patch, reset, structure change).
    Value,
    /// Validity was recomputed.
    Status,
}

type Callback<E> = Box<dyn Fn(ChangeKind, &E)>;

enum Delivery<E> {
    Immediate(Callback<E>),
    Debounced {
        scheduler: Scheduler,
        quiet: Duration,
        key: TimerKey,
        task: Rc<dyn Fn()>,
    },
}

struct Subscriber<E> {
    id: u64,
    filter: Option<ChangeKind>,
    active: Cell<bool>,
    delivery: Delivery<E>,
}

impl<E> Subscriber<E> {
    fn accepts(&self, kind: ChangeKind) -> bool {
        self.active.get() && self.filter.is_none_or(|f| f == kind)
    }

    fn cancel(&self) {
        self.active.set(false);
        if let Delivery::Debounced { scheduler, key, .. } = &self.delivery {
            scheduler.cancel(*key);
        }
    }
}

struct NotifierInner<E> {
    next_id: u64,
    subscribers: Vec<Rc<Subscriber<E>>>,
}

/// Fan-out of change events for one control.
pub struct ChangeNotifier<E> {
    inner: Rc<RefCell<NotifierInner<E>>>,
}

impl<E: 'static> ChangeNotifier<E> {
    /// Creates a notifier with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(NotifierInner {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Registers an immediate subscriber.
    ///
    /// With `filter` set, only events of that kind are delivered.
    pub fn subscribe<F>(&self, filter: Option<ChangeKind>, f: F) -> Subscription
    where
        F: Fn(ChangeKind, &E) + 'static,
    {
        self.add(filter, Delivery::Immediate(Box::new(f)))
    }

    /// Registers a debounced subscriber.
    ///
    /// Each matching event cancels the pending timer and starts a new one of
    /// length `quiet`. When it fires, `source` is asked for the current state;
    /// if it returns `None` (the control is gone) nothing is called.
    pub fn subscribe_debounced<S, F>(
        &self,
        filter: Option<ChangeKind>,
        scheduler: &Scheduler,
        quiet: Duration,
        source: S,
        f: F,
    ) -> Subscription
    where
        S: Fn() -> Option<E> + 'static,
        F: Fn(&E) + 'static,
    {
        let task: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(snapshot) = source() {
                f(&snapshot);
            }
        });
        self.add(
            filter,
            Delivery::Debounced {
                scheduler: scheduler.clone(),
                quiet,
                key: scheduler.allocate_key(),
                task,
            },
        )
    }

    fn add(&self, filter: Option<ChangeKind>, delivery: Delivery<E>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push(Rc::new(Subscriber {
                id,
                filter,
                active: Cell::new(true),
                delivery,
            }));
            id
        };

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let removed = {
                let mut inner = inner.borrow_mut();
                inner
                    .subscribers
                    .iter()
                    .position(|s| s.id == id)
                    .map(|pos| inner.subscribers.remove(pos))
            };
            if let Some(subscriber) = removed {
                trace!("Subscriber {} removed", id);
                subscriber.cancel();
            }
        })
    }

    /// Delivers an event to every matching subscriber.
    ///
    /// The subscriber list is copied first, so callbacks may subscribe,
    /// unsubscribe, or mutate other controls. A subscriber cancelled by an
    /// earlier callback of the same cycle is skipped.
    pub fn emit(&self, kind: ChangeKind, event: &E) {
        let subscribers = self.inner.borrow().subscribers.clone();
        trace!("Emitting {:?} to {} subscriber(s)", kind, subscribers.len());
        for subscriber in subscribers {
            if !subscriber.accepts(kind) {
                continue;
            }
            match &subscriber.delivery {
                Delivery::Immediate(callback) => callback(kind, event),
                Delivery::Debounced {
                    scheduler,
                    quiet,
                    key,
                    task,
                } => scheduler.schedule(*key, *quiet, Rc::clone(task)),
            }
        }
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every subscriber and cancels their pending timers.
    pub fn clear(&self) {
        let subscribers = std::mem::take(&mut self.inner.borrow_mut().subscribers);
        for subscriber in subscribers {
            subscriber.cancel();
        }
    }
}

impl<E: 'static> Default for ChangeNotifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ChangeNotifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.inner.borrow().subscribers.len())
            .finish()
    }
}

/// RAII guard for a subscription.
///
/// Dropping the guard (or calling [`unsubscribe`](Self::unsubscribe)) removes
/// the callback and cancels any pending debounce timer.
#[must_use = "dropping a Subscription unsubscribes it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Removes the subscription now.
    pub fn unsubscribe(self) {}

    /// Keeps the callback registered for as long as the control lives.
    pub fn forget(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_in_subscription_order() {
        let notifier = ChangeNotifier::<i32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = Rc::clone(&log);
        let _a = notifier.subscribe(None, move |_, v| l1.borrow_mut().push(format!("a{}", v)));
        let l2 = Rc::clone(&log);
        let _b = notifier.subscribe(None, move |_, v| l2.borrow_mut().push(format!("b{}", v)));

        notifier.emit(ChangeKind::Value, &1);
        notifier.emit(ChangeKind::Value, &2);

        assert_eq!(*log.borrow(), vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn test_filter_by_kind() {
        let notifier = ChangeNotifier::<i32>::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let _s = notifier.subscribe(Some(ChangeKind::Status), move |_, _| c.set(c.get() + 1));

        notifier.emit(ChangeKind::Value, &1);
        notifier.emit(ChangeKind::Status, &1);

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let notifier = ChangeNotifier::<i32>::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let sub = notifier.subscribe(None, move |_, _| c.set(c.get() + 1));

        notifier.emit(ChangeKind::Value, &1);
        sub.unsubscribe();
        notifier.emit(ChangeKind::Value, &2);

        assert_eq!(count.get(), 1);
        assert!(notifier.is_empty());
    }

    #[test]
    fn test_forget_keeps_subscriber() {
        let notifier = ChangeNotifier::<i32>::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        notifier
            .subscribe(None, move |_, _| c.set(c.get() + 1))
            .forget();

        notifier.emit(ChangeKind::Value, &1);
        assert_eq!(count.get(), 1);
        assert_eq!(notifier.len(), 1);
    }

    #[test]
    fn test_debounced_coalesces() {
        let (scheduler, clock) = Scheduler::manual();
        let notifier = ChangeNotifier::<i32>::new();
        let current = Rc::new(Cell::new(0));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let source = Rc::clone(&current);
        let sink = Rc::clone(&seen);
        let _sub = notifier.subscribe_debounced(
            None,
            &scheduler,
            Duration::from_millis(100),
            move || Some(source.get()),
            move |v| sink.borrow_mut().push(*v),
        );

        for v in 1..=3 {
            current.set(v);
            notifier.emit(ChangeKind::Value, &v);
            clock.advance(Duration::from_millis(60));
            scheduler.run_due();
        }
        assert!(seen.borrow().is_empty());
        assert_eq!(scheduler.pending(), 1);

        clock.advance(Duration::from_millis(40));
        assert_eq!(scheduler.run_due(), 1);
        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn test_unsubscribe_cancels_pending_timer() {
        let (scheduler, clock) = Scheduler::manual();
        let notifier = ChangeNotifier::<i32>::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let sub = notifier.subscribe_debounced(
            None,
            &scheduler,
            Duration::from_millis(10),
            || Some(0),
            move |_| c.set(c.get() + 1),
        );

        notifier.emit(ChangeKind::Value, &1);
        assert_eq!(scheduler.pending(), 1);
        drop(sub);
        assert_eq!(scheduler.pending(), 0);

        clock.advance(Duration::from_millis(20));
        scheduler.run_due();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_clear_cancels_everything() {
        let (scheduler, _clock) = Scheduler::manual();
        let notifier = ChangeNotifier::<i32>::new();
        let _a = notifier.subscribe(None, |_, _| {});
        let _b = notifier.subscribe_debounced(
            None,
            &scheduler,
            Duration::from_millis(10),
            || Some(0),
            |_| {},
        );
        notifier.emit(ChangeKind::Value, &1);

        notifier.clear();
        assert!(notifier.is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_unsubscribed_mid_cycle_is_skipped() {
        let notifier = ChangeNotifier::<i32>::new();
        let later: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(Cell::new(0));

        let slot = Rc::clone(&later);
        let _first = notifier.subscribe(None, move |_, _| {
            slot.borrow_mut().take();
        });
        let c = Rc::clone(&count);
        *later.borrow_mut() = Some(notifier.subscribe(None, move |_, _| c.set(c.get() + 1)));

        notifier.emit(ChangeKind::Value, &1);
        assert_eq!(count.get(), 0);
    }
}
