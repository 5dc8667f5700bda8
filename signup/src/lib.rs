//! Customer sign-up form built on `formwork`.
//!
//! The form collects a name, a confirmed email address, contact preferences
//! and any number of postal addresses. Phone becomes required when the
//! customer picks text notifications, and the email input shows a message
//! once typing pauses.

pub mod customer;
pub mod error;
pub mod form;
pub mod logging;

pub use customer::{Address, Customer, EmailGroup};
pub use error::{Result, SignupError};
pub use form::SignupForm;
