use super::{HandlerField, Keys};
use crate::{schema::Index, Error, Result, Value};

/// A table handler's view restricted to the columns of one index.
#[derive(Debug, Clone)]
pub struct IndexHandler {
    /// Position of the index in the table's index list; `0` is the primary
    /// key.
    pub index_number: usize,

    pub name: String,

    pub index: Index,

    /// Set when the index covers exactly one column.
    pub single_column: bool,

    /// Mapped fields of the index columns, in index order.
    fields: Vec<HandlerField>,
}

impl IndexHandler {
    pub(super) fn new(index_number: usize, index: &Index, fields: Vec<HandlerField>) -> Self {
        Self {
            index_number,
            name: index.name.clone().unwrap_or_else(|| "PRIMARY".to_string()),
            single_column: index.is_single_column(),
            index: index.clone(),
            fields,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.index.primary_key
    }

    pub fn is_unique(&self) -> bool {
        self.index.unique
    }

    pub fn is_ordered(&self) -> bool {
        self.index.ordered
    }

    /// True when every index column is mapped to a field, which is required
    /// to extract keys through this index.
    pub fn is_complete(&self) -> bool {
        self.fields.len() == self.index.columns.len()
    }

    pub fn fields(&self) -> &[HandlerField] {
        &self.fields
    }

    /// Field numbers of the index columns, in index order.
    pub fn field_numbers(&self) -> Vec<usize> {
        self.fields.iter().map(|field| field.field_number).collect()
    }

    /// Stored key values for `keys`, in index column order.
    pub fn get_key_values(&self, keys: &Keys, adapter: &str) -> Result<Vec<Value>> {
        match keys {
            Keys::Scalar(value) if self.single_column && self.is_complete() => {
                Ok(vec![self.fields[0].to_db(value.clone(), adapter)?])
            }
            Keys::Scalar(_) => Err(Error::invalid_argument(format!(
                "index `{}` needs {} key fields, a single key value was given",
                self.name,
                self.index.columns.len()
            ))),
            Keys::Object(object) => self
                .fields
                .iter()
                .map(|field| match object.get(&field.field_name) {
                    Some(value) => field.to_db(value.clone(), adapter),
                    None => Err(Error::invalid_argument(format!(
                        "key field `{}` of index `{}` is missing",
                        field.field_name, self.name
                    ))),
                })
                .collect(),
        }
    }
}
