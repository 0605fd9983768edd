use super::Operation;
use crate::{
    handler::{IndexHandler, TableHandler},
    Entity, Result, Value,
};

use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Write {
    pub handler: Arc<TableHandler>,
    pub index: usize,
    pub values: Vec<Option<Value>>,
}

impl Write {
    pub fn new(
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        values: &dyn Entity,
        adapter: &str,
    ) -> Result<Self> {
        Ok(Self {
            handler: handler.clone(),
            index: index.index_number,
            values: handler.get_write_set(values, adapter)?,
        })
    }
}

impl From<Write> for Operation {
    fn from(value: Write) -> Self {
        Self::Write(value)
    }
}
