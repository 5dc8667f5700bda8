//! Change notification and debounce scheduling.

mod notifier;
mod scheduler;

pub use notifier::{ChangeKind, ChangeNotifier, Subscription};
pub use scheduler::{Clock, ManualClock, RuntimeClock, Scheduler, TimerKey};
