//! Typed control paths.
//!
//! A [`FieldPath`] is parsed once and validated up front, so the string form
//! (`"emailGroup.email"`, `"addresses.0.city"`) is never re-interpreted at
//! lookup time. Segments made only of ASCII digits address array items.

use std::fmt;
use std::str::FromStr;

use crate::error::{FormError, Result};

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Named child of a group.
    Name(String),
    /// Item of an array.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => f.write_str(name),
            Segment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// A validated, dot-separated path into a control tree.
///
/// The empty path addresses the root group.
///
/// # Example
///
/// ```
/// use formwork::FieldPath;
///
/// let path = FieldPath::parse("addresses.0.city").unwrap();
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.to_string(), "addresses.0.city");
/// assert!(FieldPath::parse("a..b").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The path of the root group.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dot-separated path.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            if part.is_empty() {
                return Err(FormError::InvalidPath {
                    path: path.to_string(),
                    reason: "empty segment",
                });
            }
            if part.chars().any(char::is_whitespace) {
                return Err(FormError::InvalidPath {
                    path: path.to_string(),
                    reason: "segments may not contain whitespace",
                });
            }
            if part.bytes().all(|b| b.is_ascii_digit()) {
                let index = part.parse().map_err(|_| FormError::InvalidPath {
                    path: path.to_string(),
                    reason: "array index too large",
                })?;
                segments.push(Segment::Index(index));
            } else {
                segments.push(Segment::Name(part.to_string()));
            }
        }
        Ok(Self { segments })
    }

    /// Returns the segments of this path.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` for the root path.
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// Returns a new path with a named child appended.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Name(name.into()));
        Self { segments }
    }

    /// Returns a new path with an array index appended.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// Returns the first `len` segments as a path.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Returns the last segment, if any.
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }
}

/// Checks that `name` can be used as a control name inside a group.
pub(crate) fn check_control_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "empty control name"
    } else if name.contains('.') {
        "control names may not contain '.'"
    } else if name.chars().any(char::is_whitespace) {
        "control names may not contain whitespace"
    } else if name.bytes().all(|b| b.is_ascii_digit()) {
        "control names may not be numeric"
    } else {
        return Ok(());
    };
    Err(FormError::InvalidPath {
        path: name.to_string(),
        reason,
    })
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = FormError;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
