use std::collections::BTreeMap;
use std::fmt;

use jiff::Timestamp;

/// Ordered mapping from field name to value.
pub type Fields = BTreeMap<String, Value>;

/// A single document field value.
///
/// Covers every value type a Firestore document can hold, so copying a
/// document never loses type information.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Point in time with nanosecond precision.
    Timestamp(Timestamp),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Reference to another document, relative to the database root
    /// (`collection/document[/collection/document...]`).
    Reference(String),
    /// Geographic point.
    GeoPoint {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },
    /// Ordered list of values.
    Array(Vec<Value>),
    /// Nested map.
    Map(Fields),
}

impl Value {
    /// Returns the name of the value type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Bytes(_) => "bytes",
            Self::Reference(_) => "reference",
            Self::GeoPoint { .. } => "geoPoint",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string slice if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this is a [`Value::Boolean`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Renders scalar values as text.
    ///
    /// Strings render as themselves, numbers and booleans in their canonical
    /// decimal or `true`/`false` form. Other types have no text rendering.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Double(d) => Some(d.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Reference(path) => write!(f, "ref({path})"),
            Self::GeoPoint {
                latitude,
                longitude,
            } => write!(f, "({latitude}, {longitude})"),
            Self::Array(values) => write!(f, "<array of {}>", values.len()),
            Self::Map(fields) => write!(f, "<map of {}>", fields.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Fields> for Value {
    fn from(value: Fields) -> Self {
        Self::Map(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}
