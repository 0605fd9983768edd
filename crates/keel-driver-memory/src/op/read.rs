use super::{index_columns, row_to_object};
use crate::store::{failure, StoredTable};

use keel_core::{
    driver::{operation::Read, OperationResult},
    Result, Value,
};

pub(super) fn exec(table: &StoredTable, op: &Read) -> Result<OperationResult> {
    let columns = index_columns(&op.handler, op.index)?;

    Ok(match table.find(columns, &op.keys) {
        Some(position) => OperationResult::success(Value::Object(row_to_object(
            &op.handler,
            &table.rows[position],
        ))),
        None => OperationResult::failure(failure::no_row(&table.meta)),
    })
}
