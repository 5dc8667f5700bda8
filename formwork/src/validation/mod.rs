//! Validation for form controls.
//!
//! Validators are pure functions attached to controls; their failures are
//! stored on the control as [`ValidationErrors`] and never returned as `Err`.
//! Display text is derived separately through a [`ValidationMessageTable`].
//!
//! # Example
//!
//! ```
//! use formwork::prelude::*;
//!
//! let form = GroupSchema::new()
//!     .field("firstName", FieldSchema::new("").required())
//!     .field("lastName", FieldSchema::new("").required().max_length(25))
//!     .build()
//!     .unwrap();
//!
//! let result = form.validate(&ValidationMessageTable::defaults());
//! assert!(result.is_invalid());
//! assert_eq!(result.first_invalid_path().unwrap().to_string(), "firstName");
//!
//! form.field("firstName").unwrap().set_value("Jack");
//! form.field("lastName").unwrap().set_value("Harkness");
//! assert!(form.validate(&ValidationMessageTable::defaults()).is_valid());
//! ```

mod errors;
mod messages;
mod result;
mod validatable;
mod validator;
mod visibility;

pub use errors::{ErrorKind, ValidationErrors};
pub use messages::ValidationMessageTable;
pub use result::{FieldError, ValidationResult};
pub use validatable::{Status, Validatable};
pub use validator::{GroupValidator, Validator, run_validators};
pub use visibility::MessageVisibility;
