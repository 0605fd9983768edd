use super::{apply_values, index_columns};
use crate::store::{failure, StoredTable};

use keel_core::{
    driver::{operation::Update, OperationResult},
    Result, Value,
};

pub(super) fn exec(table: &mut StoredTable, op: &Update) -> Result<OperationResult> {
    let columns = index_columns(&op.handler, op.index)?;

    let Some(position) = table.find(columns, &op.keys) else {
        return Ok(OperationResult::failure(failure::no_row(&table.meta)));
    };

    let mut row = table.rows[position].clone();
    apply_values(&op.handler, &mut row, &op.values);

    if let Err(error) = table.check(&row, Some(position)) {
        return Ok(OperationResult::failure(error));
    }

    table.rows[position] = row;
    Ok(OperationResult::success(Value::Null))
}
