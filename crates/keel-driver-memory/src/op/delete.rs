use super::index_columns;
use crate::store::{failure, StoredTable};

use keel_core::{
    driver::{operation::Delete, OperationResult},
    Result, Value,
};

pub(super) fn exec(table: &mut StoredTable, op: &Delete) -> Result<OperationResult> {
    let columns = index_columns(&op.handler, op.index)?;

    match table.find(columns, &op.keys) {
        Some(position) => {
            table.rows.remove(position);
            Ok(OperationResult::success(Value::Null))
        }
        None => Ok(OperationResult::failure(failure::no_row(&table.meta))),
    }
}
