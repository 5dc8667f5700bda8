//! Prelude module for convenient imports.
//!
//! ```
//! use formwork::prelude::*;
//! ```

// Controls and schemas
pub use crate::control::{
    ArrayControl, ArraySchema, Control, FieldControl, FieldSchema, GroupControl, GroupSchema,
};

// Validation
pub use crate::validation::{
    ErrorKind, GroupValidator, MessageVisibility, Status, Validatable, ValidationErrors,
    ValidationMessageTable, ValidationResult, Validator,
};

// Wiring
pub use crate::notify::{Scheduler, Subscription};
pub use crate::policy::{LinkedPolicy, PolicyTable};

pub use crate::config::FormConfig;
pub use crate::error::FormError;
pub use crate::path::FieldPath;
pub use crate::state::State;
pub use crate::value::Value;
