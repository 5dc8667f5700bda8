//! Value enum for scalar field values

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A scalar value held by a [`FieldControl`](crate::control::FieldControl).
///
/// Container controls never hold a `Value` directly; their value is the
/// nested JSON produced by `to_value()`.
///
/// # Type Mapping
///
/// | JSON | Rust Variant |
/// |------|--------------|
/// | null | `Null` |
/// | boolean | `Bool` |
/// | integer number | `Int` |
/// | other number | `Float` |
/// | string | `String` |
///
/// # Example
///
/// ```
/// use formwork::Value;
///
/// let name = Value::from("Jack");
/// let rating = Value::from(4);
/// let catalog = Value::from(true);
/// let unset = Value::Null;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value. Plays the role of "undefined" for validators that skip
    /// unset input.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(String),
}

impl Value {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for `Null` and for the empty string. Whitespace counts
    /// as content.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns the string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bool if this is a bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view of the value.
    ///
    /// Numbers convert directly. Strings are parsed after trimming, so `"3"`
    /// is numeric while `""` and `"abc"` are not. `NaN` is never numeric.
    pub fn as_f64(&self) -> Option<f64> {
        let n = match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            Value::Null | Value::Bool(_) => return None,
        };
        if n.is_nan() { None } else { Some(n) }
    }

    /// Returns the name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
        }
    }

    /// Converts to a JSON value. Non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Converts a JSON scalar into a `Value`.
    ///
    /// Returns `None` for arrays and objects.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Int(i)),
                None => n.as_f64().map(Value::Float),
            },
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}
