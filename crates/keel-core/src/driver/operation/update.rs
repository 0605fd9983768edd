use super::Operation;
use crate::{
    handler::{IndexHandler, Keys, TableHandler},
    Entity, Result, Value,
};

use std::sync::Arc;

/// Sets the defined fields of `values` on the row `keys` identifies.
#[derive(Debug, Clone)]
pub struct Update {
    pub handler: Arc<TableHandler>,
    pub index: usize,
    pub keys: Vec<Value>,
    pub values: Vec<Option<Value>>,
}

impl Update {
    pub fn new(
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        keys: &Keys,
        values: &dyn Entity,
        adapter: &str,
    ) -> Result<Self> {
        Ok(Self {
            handler: handler.clone(),
            index: index.index_number,
            keys: index.get_key_values(keys, adapter)?,
            values: handler.get_write_set(values, adapter)?,
        })
    }
}

impl From<Update> for Operation {
    fn from(value: Update) -> Self {
        Self::Update(value)
    }
}
