//! Declarative description of a control tree.
//!
//! A schema is plain data: cloning it is cheap and building it produces a
//! fresh, independent tree each time. Arrays keep their item schema so that
//! `push` can build new items later.

use log::debug;

use super::{ArrayControl, Control, FieldControl, GroupControl};
use crate::error::{FormError, Result};
use crate::path::{FieldPath, check_control_name};
use crate::validation::{GroupValidator, Validator};
use crate::value::Value;

/// Initial value and validators of a field.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    initial: Value,
    validators: Vec<Validator>,
}

impl FieldSchema {
    pub fn new(initial: impl Into<Value>) -> Self {
        Self {
            initial: initial.into(),
            validators: Vec::new(),
        }
    }

    /// Replaces the initial value.
    pub fn initial(mut self, initial: impl Into<Value>) -> Self {
        self.initial = initial.into();
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn validators(mut self, validators: impl IntoIterator<Item = Validator>) -> Self {
        self.validators.extend(validators);
        self
    }

    pub fn required(self) -> Self {
        self.validator(Validator::required())
    }

    pub fn min_length(self, min: usize) -> Self {
        self.validator(Validator::min_length(min))
    }

    pub fn max_length(self, max: usize) -> Self {
        self.validator(Validator::max_length(max))
    }

    pub fn email(self) -> Self {
        self.validator(Validator::email())
    }

    /// Inclusive numeric range.
    pub fn range(self, min: f64, max: f64) -> Self {
        self.validator(Validator::range_between(min, max))
    }

    /// Anchored regex; fails if the pattern does not compile.
    pub fn pattern(self, pattern: &str) -> Result<Self> {
        Ok(self.validator(Validator::pattern(pattern)?))
    }

    /// Predicate rule reporting `ErrorKind::Custom(name)`.
    pub fn rule<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.validator(Validator::rule(name, f))
    }

    pub fn build(&self) -> FieldControl {
        FieldControl::new(self.initial.clone(), self.validators.clone())
    }
}

/// Schema of any control kind.
#[derive(Debug, Clone)]
pub enum ControlSchema {
    Field(FieldSchema),
    Group(GroupSchema),
    Array(ArraySchema),
}

impl ControlSchema {
    fn build_unchecked(&self) -> Control {
        match self {
            ControlSchema::Field(schema) => Control::Field(schema.build()),
            ControlSchema::Group(schema) => Control::Group(schema.build_unchecked()),
            ControlSchema::Array(schema) => Control::Array(schema.build_unchecked()),
        }
    }
}

impl From<FieldSchema> for ControlSchema {
    fn from(schema: FieldSchema) -> Self {
        ControlSchema::Field(schema)
    }
}

impl From<GroupSchema> for ControlSchema {
    fn from(schema: GroupSchema) -> Self {
        ControlSchema::Group(schema)
    }
}

impl From<ArraySchema> for ControlSchema {
    fn from(schema: ArraySchema) -> Self {
        ControlSchema::Array(schema)
    }
}

/// Ordered children and group validators of a group.
///
/// Names are checked when the schema is built, so the builder methods never
/// fail (except [`FieldSchema::pattern`], which compiles its regex eagerly).
#[derive(Debug, Clone, Default)]
pub struct GroupSchema {
    children: Vec<(String, ControlSchema)>,
    validators: Vec<GroupValidator>,
}

impl GroupSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a child of any kind.
    pub fn control(mut self, name: impl Into<String>, schema: impl Into<ControlSchema>) -> Self {
        self.children.push((name.into(), schema.into()));
        self
    }

    pub fn field(self, name: impl Into<String>, schema: FieldSchema) -> Self {
        self.control(name, schema)
    }

    /// Adds a field with an initial value and no validators.
    pub fn value(self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.control(name, FieldSchema::new(initial))
    }

    pub fn group(self, name: impl Into<String>, schema: GroupSchema) -> Self {
        self.control(name, schema)
    }

    pub fn array(self, name: impl Into<String>, schema: ArraySchema) -> Self {
        self.control(name, schema)
    }

    /// Adds a group validator.
    pub fn validator(mut self, validator: GroupValidator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Names of the direct children, in order.
    pub fn names(&self) -> Vec<&str> {
        self.children.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Checks every name in the tree.
    pub fn check(&self) -> Result<()> {
        self.check_at(&FieldPath::root())
    }

    fn check_at(&self, path: &FieldPath) -> Result<()> {
        for (i, (name, schema)) in self.children.iter().enumerate() {
            check_control_name(name).map_err(|e| match e {
                FormError::InvalidPath { reason, .. } => FormError::InvalidPath {
                    path: path.child(name.as_str()).to_string(),
                    reason,
                },
                other => other,
            })?;
            if self.children[..i].iter().any(|(n, _)| n == name) {
                return Err(FormError::DuplicateControl {
                    path: path.to_string(),
                    name: name.clone(),
                });
            }
            let child_path = path.child(name.as_str());
            match schema {
                ControlSchema::Field(_) => {}
                ControlSchema::Group(group) => group.check_at(&child_path)?,
                ControlSchema::Array(array) => array.item.check_at(&child_path.index(0))?,
            }
        }
        Ok(())
    }

    /// Builds a fresh tree after checking every name.
    pub fn build(&self) -> Result<GroupControl> {
        self.check()?;
        let group = self.build_unchecked();
        debug!("Built form with {} top-level control(s)", group.len());
        Ok(group)
    }

    pub(crate) fn build_unchecked(&self) -> GroupControl {
        let children = self
            .children
            .iter()
            .map(|(name, schema)| (name.clone(), schema.build_unchecked()))
            .collect();
        GroupControl::from_parts(children, self.validators.clone())
    }
}

/// Item template and initial length of an array.
#[derive(Debug, Clone)]
pub struct ArraySchema {
    item: GroupSchema,
    len: usize,
}

impl ArraySchema {
    /// An initially empty array of `item` groups.
    pub fn new(item: GroupSchema) -> Self {
        Self { item, len: 0 }
    }

    /// Sets how many items the array starts with.
    pub fn with_len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    pub fn item(&self) -> &GroupSchema {
        &self.item
    }

    pub(crate) fn build_unchecked(&self) -> ArrayControl {
        ArrayControl::from_parts(self.item.clone(), self.len)
    }
}
