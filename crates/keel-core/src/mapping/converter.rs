use crate::{Result, Value};

use std::fmt::Debug;

/// Converts between a field's domain value and the value stored in its
/// column.
///
/// For any converter, `from_db(to_db(x))` must give back `x`.
pub trait Converter: Debug + Send + Sync + 'static {
    fn to_db(&self, value: Value) -> Result<Value>;

    fn from_db(&self, value: Value) -> Result<Value>;
}

/// Stores a value as its JSON text. This is the default converter for sparse
/// field columns.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonConverter;

impl Converter for JsonConverter {
    fn to_db(&self, value: Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            value => Ok(Value::String(serde_json::to_string(&value.to_json())?)),
        }
    }

    fn from_db(&self, value: Value) -> Result<Value> {
        match value {
            Value::String(text) => Ok(Value::from_json(serde_json::from_str(&text)?)),
            value => Ok(value),
        }
    }
}
