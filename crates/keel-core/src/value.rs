mod object;
pub use object::Object;

use crate::{Error, Result};

use std::fmt;

/// A value read from, or written to, a mapped field or a table column.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Signed 32-bit integer
    I32(i32),

    /// Signed 64-bit integer
    I64(i64),

    /// Double precision float
    F64(f64),

    /// String value
    String(String),

    /// Binary value, stored in binary and LOB columns
    Bytes(Vec<u8>),

    /// A list of values, used for to-many relationships and `IN` lists
    List(Vec<Value>),

    /// A nested object, used for to-one relationships
    Object(Object),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_bytes(&self) -> bool {
        matches!(self, Self::Bytes(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Integer view of the value, widening `I32`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I32(v) => Some(v as i64),
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Compares two values for index and predicate evaluation. Integers of
    /// different widths compare numerically; values of unrelated kinds do not
    /// compare.
    pub fn compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        use Value::*;

        match (self, other) {
            (Null, Null) => Some(std::cmp::Ordering::Equal),
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (F64(a), F64(b)) => a.partial_cmp(b),
            (F64(a), b) => b.as_i64().and_then(|b| a.partial_cmp(&(b as f64))),
            (a, F64(b)) => a.as_i64().and_then(|a| (a as f64).partial_cmp(b)),
            (String(a), String(b)) => a.partial_cmp(b),
            (Bytes(a), Bytes(b)) => a.partial_cmp(b),
            (a, b) => match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Equality used when matching keys: `I32(1)` and `I64(1)` are the same
    /// key.
    pub fn key_eq(&self, other: &Value) -> bool {
        self.compare(other) == Some(std::cmp::Ordering::Equal)
    }

    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Converts the value into JSON, used by the sparse field converter.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Null => Json::Null,
            Self::Bool(v) => Json::Bool(*v),
            Self::I32(v) => Json::from(*v),
            Self::I64(v) => Json::from(*v),
            Self::F64(v) => Json::from(*v),
            Self::String(v) => Json::String(v.clone()),
            Self::Bytes(v) => Json::Array(v.iter().map(|b| Json::from(*b)).collect()),
            Self::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Object(object) => Json::Object(
                object
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(v) => Self::Bool(v),
            Json::Number(n) => match n.as_i64() {
                Some(v) => Self::I64(v),
                None => Self::F64(n.as_f64().unwrap_or_default()),
            },
            Json::String(v) => Self::String(v),
            Json::Array(items) => Self::List(items.into_iter().map(Value::from_json).collect()),
            Json::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(name, value)| (name, Value::from_json(value)))
                    .collect(),
            ),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::I32(_) => "I32",
            Self::I64(_) => "I64",
            Self::F64(_) => "F64",
            Self::String(_) => "String",
            Self::Bytes(_) => "Bytes",
            Self::List(_) => "List",
            Self::Object(_) => "Object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::List(_) | Self::Object(_) => write!(f, "{}", self.to_json()),
        }
    }
}

/// Conversion from a field value into a Rust field type, used by the
/// `entity!` macro when assigning fields.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn conversion_error(value: &Value, ty: &str) -> Error {
    Error::invalid_argument(format!("cannot convert {} to {ty}", value.kind_name()))
}

macro_rules! impl_value_int {
    ( $( $t:ty => $variant:ident ),+ ) => {
        $(
            impl From<$t> for Value {
                fn from(src: $t) -> Self {
                    Self::$variant(src.into())
                }
            }

            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self> {
                    value
                        .as_i64()
                        .and_then(|v| <$t>::try_from(v).ok())
                        .ok_or_else(|| conversion_error(&value, stringify!($t)))
                }
            }
        )+
    };
}

impl_value_int!(i8 => I32, i16 => I32, i32 => I32, u8 => I32, u16 => I32, i64 => I64, u32 => I64);

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(conversion_error(&other, "bool")),
        }
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Self::F64(src)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F64(v) => Ok(v),
            other => other
                .as_i64()
                .map(|v| v as f64)
                .ok_or_else(|| conversion_error(&other, "f64")),
        }
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<&String> for Value {
    fn from(src: &String) -> Self {
        Self::String(src.clone())
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(conversion_error(&other, "String")),
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(src: Vec<u8>) -> Self {
        Self::Bytes(src)
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => Err(conversion_error(&other, "Vec<u8>")),
        }
    }
}

impl From<Object> for Value {
    fn from(src: Object) -> Self {
        Self::Object(src)
    }
}

impl FromValue for Object {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(v) => Ok(v),
            other => Err(conversion_error(&other, "Object")),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(src: Vec<Value>) -> Self {
        Self::List(src)
    }
}

impl<T> From<Option<T>> for Value
where
    Self: From<T>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::from(value),
            None => Self::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

impl From<Vec<Object>> for Value {
    fn from(src: Vec<Object>) -> Self {
        Self::List(src.into_iter().map(Value::Object).collect())
    }
}

impl FromValue for Vec<Object> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(vec![]),
            Value::List(items) => items.into_iter().map(Object::from_value).collect(),
            other => Err(conversion_error(&other, "Vec<Object>")),
        }
    }
}
