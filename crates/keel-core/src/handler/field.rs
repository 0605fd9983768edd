use crate::{mapping::Converter, schema::Column, Result, Value};

use std::{collections::HashMap, fmt, sync::Arc};

/// A mapped field as resolved against its column.
#[derive(Clone)]
pub struct HandlerField {
    pub field_name: String,
    pub column_name: String,
    pub field_number: usize,
    pub column_number: usize,

    /// Binary columns only accept `Value::Bytes`.
    pub binary: bool,

    pub default_value: Option<Value>,

    /// Set when the column carries sparse fields.
    pub sparse_field_names: Option<Vec<String>>,

    domain_converter: Option<Arc<dyn Converter>>,
    database_converters: HashMap<String, Arc<dyn Converter>>,
}

impl HandlerField {
    pub(super) fn new(
        field_name: &str,
        field_number: usize,
        column: &Column,
        converter: Option<Arc<dyn Converter>>,
        sparse_field_names: Option<Vec<String>>,
    ) -> Self {
        Self {
            field_name: field_name.to_string(),
            column_name: column.name.clone(),
            field_number,
            column_number: column.column_number,
            binary: column.binary,
            default_value: column.default_value.clone(),
            sparse_field_names,
            domain_converter: converter.or_else(|| column.domain_type_converter.clone()),
            database_converters: column.database_type_converters.clone(),
        }
    }

    pub fn is_sparse_container(&self) -> bool {
        self.sparse_field_names.is_some()
    }

    /// Domain value to stored value: the field's converter first, then the
    /// adapter's.
    pub fn to_db(&self, value: Value, adapter: &str) -> Result<Value> {
        let value = match &self.domain_converter {
            Some(converter) => converter.to_db(value)?,
            None => value,
        };

        match self.database_converters.get(adapter) {
            Some(converter) => converter.to_db(value),
            None => Ok(value),
        }
    }

    /// Stored value to domain value, undoing [`to_db`](Self::to_db).
    pub fn from_db(&self, value: Value, adapter: &str) -> Result<Value> {
        let value = match self.database_converters.get(adapter) {
            Some(converter) => converter.from_db(value)?,
            None => value,
        };

        match &self.domain_converter {
            Some(converter) => converter.from_db(value),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for HandlerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerField")
            .field("field_name", &self.field_name)
            .field("column_name", &self.column_name)
            .field("field_number", &self.field_number)
            .field("column_number", &self.column_number)
            .finish()
    }
}
