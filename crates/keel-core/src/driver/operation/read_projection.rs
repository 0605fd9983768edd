use super::Operation;
use crate::{
    handler::{IndexHandler, Keys, TableHandler},
    projection::ResolvedProjection,
    Result, Value,
};

use std::sync::Arc;

/// Reads a root row by unique key together with its related rows, as flat
/// rows laid out by the projection's sectors.
#[derive(Debug, Clone)]
pub struct ReadProjection {
    pub handler: Arc<TableHandler>,
    pub index: usize,
    pub keys: Vec<Value>,
    pub projection: Arc<ResolvedProjection>,
}

impl ReadProjection {
    pub fn new(
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        keys: &Keys,
        projection: &Arc<ResolvedProjection>,
        adapter: &str,
    ) -> Result<Self> {
        Ok(Self {
            handler: handler.clone(),
            index: index.index_number,
            keys: index.get_key_values(keys, adapter)?,
            projection: projection.clone(),
        })
    }
}

impl From<ReadProjection> for Operation {
    fn from(value: ReadProjection) -> Self {
        Self::ReadProjection(value)
    }
}
