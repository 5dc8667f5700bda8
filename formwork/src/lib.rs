//! Reactive form models with declarative validation.
//!
//! A form is a tree of controls built from a [`GroupSchema`](control::GroupSchema):
//! leaf fields hold scalar [`Value`]s, groups hold named children, arrays hold
//! groups built from a template. Every control carries its own validators,
//! touched/dirty flags and a change notifier; changes propagate from a leaf
//! up to the root.
//!
//! Cross-field behavior is declared rather than hand-wired: group validators
//! compare siblings, [`LinkedPolicy`](policy::LinkedPolicy) swaps a field's
//! validators based on another field, and debounced subscriptions driven by a
//! [`Scheduler`](notify::Scheduler) derive display messages once input settles.
//!
//! Everything is single-threaded. Controls are `Rc` handles and must stay on
//! the thread that built them.

pub mod config;
pub mod control;
pub mod error;
pub mod notify;
pub mod path;
pub mod policy;
pub mod prelude;
pub mod state;
pub mod validation;
pub mod value;

pub use config::FormConfig;
pub use error::{FormError, Result};
pub use path::FieldPath;
pub use state::State;
pub use value::Value;
