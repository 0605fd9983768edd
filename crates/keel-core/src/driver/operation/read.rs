use super::Operation;
use crate::{
    handler::{IndexHandler, Keys, TableHandler},
    Result, Value,
};

use std::sync::Arc;

/// Reads the row a unique index maps `keys` to.
#[derive(Debug, Clone)]
pub struct Read {
    pub handler: Arc<TableHandler>,
    pub index: usize,

    /// Stored key values, in index column order
    pub keys: Vec<Value>,
}

impl Read {
    pub fn new(handler: &Arc<TableHandler>, index: &IndexHandler, keys: &Keys, adapter: &str) -> Result<Self> {
        Ok(Self {
            handler: handler.clone(),
            index: index.index_number,
            keys: index.get_key_values(keys, adapter)?,
        })
    }
}

impl From<Read> for Operation {
    fn from(value: Read) -> Self {
        Self::Read(value)
    }
}
