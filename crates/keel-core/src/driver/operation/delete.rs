use super::Operation;
use crate::{
    handler::{IndexHandler, Keys, TableHandler},
    Result, Value,
};

use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Delete {
    pub handler: Arc<TableHandler>,
    pub index: usize,
    pub keys: Vec<Value>,
}

impl Delete {
    pub fn new(handler: &Arc<TableHandler>, index: &IndexHandler, keys: &Keys, adapter: &str) -> Result<Self> {
        Ok(Self {
            handler: handler.clone(),
            index: index.index_number,
            keys: index.get_key_values(keys, adapter)?,
        })
    }
}

impl From<Delete> for Operation {
    fn from(value: Delete) -> Self {
        Self::Delete(value)
    }
}
