use super::Operation;
use crate::{handler::TableHandler, Entity, Result, Value};

use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Insert {
    pub handler: Arc<TableHandler>,

    /// Stored values by field number; `None` for fields the entity left
    /// undefined.
    pub values: Vec<Option<Value>>,
}

impl Insert {
    pub fn new(handler: &Arc<TableHandler>, values: &dyn Entity, adapter: &str) -> Result<Self> {
        Ok(Self {
            values: handler.get_write_set(values, adapter)?,
            handler: handler.clone(),
        })
    }
}

impl From<Insert> for Operation {
    fn from(value: Insert) -> Self {
        Self::Insert(value)
    }
}
