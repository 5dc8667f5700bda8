//! Single-threaded timer scheduler for debounced callbacks.
//!
//! Timers are plain data: a key, a deadline and a task. Nothing runs until
//! the owner of the event loop calls [`Scheduler::run_due`] (or awaits
//! [`Scheduler::run_until_idle`]), so every callback executes on the same
//! thread that mutates the form.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{debug, trace};

/// Source of the current time for a [`Scheduler`].
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Clock backed by tokio's time source.
///
/// Outside a runtime this is the system clock. Inside a runtime with paused
/// time it follows the paused clock, which keeps [`Scheduler::run_until_idle`]
/// deterministic in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeClock;

impl Clock for RuntimeClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    /// Total time advanced so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed.get()
    }
}

/// Identifies one timer slot. Scheduling under a key that is already pending
/// replaces the old timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerKey(u64);

struct Timer {
    key: TimerKey,
    deadline: Instant,
    seq: u64,
    task: Rc<dyn Fn()>,
}

struct SchedulerInner {
    clock: Box<dyn Clock>,
    timers: RefCell<Vec<Timer>>,
    next_key: Cell<u64>,
    next_seq: Cell<u64>,
}

/// Cheap-to-clone handle to a set of pending timers.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
/// use formwork::notify::Scheduler;
///
/// let (scheduler, clock) = Scheduler::manual();
/// let fired = Rc::new(Cell::new(0));
/// let key = scheduler.allocate_key();
///
/// let f = Rc::clone(&fired);
/// scheduler.schedule(key, Duration::from_secs(1), Rc::new(move || f.set(f.get() + 1)));
/// clock.advance(Duration::from_secs(1));
/// scheduler.run_due();
/// assert_eq!(fired.get(), 1);
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Scheduler {
    /// Creates a scheduler on the [`RuntimeClock`].
    pub fn new() -> Self {
        Self::with_clock(RuntimeClock)
    }

    /// Creates a scheduler on a custom clock.
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                clock: Box::new(clock),
                timers: RefCell::new(Vec::new()),
                next_key: Cell::new(0),
                next_seq: Cell::new(0),
            }),
        }
    }

    /// Creates a scheduler on a [`ManualClock`] and returns both.
    pub fn manual() -> (Self, ManualClock) {
        let clock = ManualClock::new();
        (Self::with_clock(clock.clone()), clock)
    }

    /// Current time according to the clock.
    pub fn now(&self) -> Instant {
        self.inner.clock.now()
    }

    /// Returns a fresh timer key.
    pub fn allocate_key(&self) -> TimerKey {
        let key = self.inner.next_key.get();
        self.inner.next_key.set(key + 1);
        TimerKey(key)
    }

    /// Schedules `task` to run `delay` from now, replacing any pending timer
    /// with the same key.
    pub fn schedule(&self, key: TimerKey, delay: Duration, task: Rc<dyn Fn()>) {
        let deadline = self.now() + delay;
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);

        let mut timers = self.inner.timers.borrow_mut();
        let before = timers.len();
        timers.retain(|t| t.key != key);
        if timers.len() != before {
            trace!("Timer {:?} rescheduled", key);
        }
        timers.push(Timer {
            key,
            deadline,
            seq,
            task,
        });
    }

    /// Cancels a pending timer. Returns `true` if one was pending.
    pub fn cancel(&self, key: TimerKey) -> bool {
        let mut timers = self.inner.timers.borrow_mut();
        let before = timers.len();
        timers.retain(|t| t.key != key);
        let cancelled = timers.len() != before;
        if cancelled {
            trace!("Timer {:?} cancelled", key);
        }
        cancelled
    }

    /// Returns `true` if a timer with this key is pending.
    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.inner.timers.borrow().iter().any(|t| t.key == key)
    }

    /// Number of pending timers.
    pub fn pending(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.timers.borrow().iter().map(|t| t.deadline).min()
    }

    /// Runs every timer whose deadline has passed, earliest first.
    ///
    /// Tasks may schedule new timers; those run in the same call if they are
    /// already due. Returns the number of tasks run.
    pub fn run_due(&self) -> usize {
        let mut fired = 0;
        loop {
            let now = self.now();
            let next = {
                let mut timers = self.inner.timers.borrow_mut();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.deadline <= now)
                    .min_by_key(|(_, t)| (t.deadline, t.seq))
                    .map(|(i, _)| i);
                due.map(|i| timers.remove(i))
            };
            let Some(timer) = next else {
                break;
            };
            trace!("Timer {:?} fired", timer.key);
            (timer.task)();
            fired += 1;
        }
        if fired > 0 {
            debug!("Ran {} debounced task(s)", fired);
        }
        fired
    }

    /// Sleeps until each pending deadline and runs due timers until none are
    /// left. Returns the number of tasks run.
    ///
    /// A clock that does not move while sleeping, such as a [`ManualClock`],
    /// stops the loop once nothing is due; the remaining timers stay pending.
    pub async fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.next_deadline() {
            let before = self.now();
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
            let ran = self.run_due();
            if ran == 0 && self.now() == before {
                debug!("Clock did not advance, {} timer(s) left pending", self.pending());
                break;
            }
            fired += ran;
        }
        fired
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, Rc<dyn Fn()>) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, Rc::new(move || c.set(c.get() + 1)))
    }

    #[test]
    fn test_not_due_before_deadline() {
        let (scheduler, clock) = Scheduler::manual();
        let (count, task) = counter();
        scheduler.schedule(scheduler.allocate_key(), Duration::from_millis(100), task);

        clock.advance(Duration::from_millis(99));
        assert_eq!(scheduler.run_due(), 0);
        clock.advance(Duration::from_millis(1));
        assert_eq!(scheduler.run_due(), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_same_key_replaces() {
        let (scheduler, clock) = Scheduler::manual();
        let (count, task) = counter();
        let key = scheduler.allocate_key();

        scheduler.schedule(key, Duration::from_millis(100), Rc::clone(&task));
        clock.advance(Duration::from_millis(50));
        scheduler.schedule(key, Duration::from_millis(100), task);
        assert_eq!(scheduler.pending(), 1);

        clock.advance(Duration::from_millis(60));
        assert_eq!(scheduler.run_due(), 0);
        clock.advance(Duration::from_millis(40));
        assert_eq!(scheduler.run_due(), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_cancel() {
        let (scheduler, clock) = Scheduler::manual();
        let (count, task) = counter();
        let key = scheduler.allocate_key();
        scheduler.schedule(key, Duration::from_millis(10), task);

        assert!(scheduler.is_pending(key));
        assert!(scheduler.cancel(key));
        assert!(!scheduler.cancel(key));

        clock.advance(Duration::from_millis(10));
        scheduler.run_due();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let (scheduler, clock) = Scheduler::manual();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (name, ms) in [("late", 30u64), ("early", 10), ("mid", 20)] {
            let o = Rc::clone(&order);
            scheduler.schedule(
                scheduler.allocate_key(),
                Duration::from_millis(ms),
                Rc::new(move || o.borrow_mut().push(name)),
            );
        }

        clock.advance(Duration::from_millis(30));
        assert_eq!(scheduler.run_due(), 3);
        assert_eq!(*order.borrow(), vec!["early", "mid", "late"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_idle_on_runtime_clock() {
        let scheduler = Scheduler::new();
        let (count, task) = counter();
        scheduler.schedule(scheduler.allocate_key(), Duration::from_secs(1), Rc::clone(&task));
        scheduler.schedule(scheduler.allocate_key(), Duration::from_secs(3), task);

        let start = tokio::time::Instant::now();
        assert_eq!(scheduler.run_until_idle().await, 2);
        assert_eq!(count.get(), 2);
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_idle_stops_on_manual_clock() {
        let (scheduler, clock) = Scheduler::manual();
        let (count, task) = counter();
        scheduler.schedule(scheduler.allocate_key(), Duration::from_secs(1), task);

        assert_eq!(scheduler.run_until_idle().await, 0);
        assert_eq!(scheduler.pending(), 1);

        clock.advance(Duration::from_secs(1));
        assert_eq!(scheduler.run_until_idle().await, 1);
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.pending(), 0);
    }
}
