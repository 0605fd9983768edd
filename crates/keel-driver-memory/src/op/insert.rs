use super::{apply_values, auto_increment};
use crate::store::StoredTable;

use keel_core::{
    driver::{operation::Insert, OperationResult},
    Result, Value,
};

pub(super) fn exec(table: &mut StoredTable, op: &Insert) -> Result<OperationResult> {
    let mut row = table.empty_row();
    apply_values(&op.handler, &mut row, &op.values);

    let counter = table.next_auto_increment;
    let generated = auto_increment(table, &mut row);

    if let Err(error) = table.check(&row, None) {
        table.next_auto_increment = counter;
        return Ok(OperationResult::failure(error));
    }

    table.rows.push(row);

    let result = OperationResult::success(Value::Null);
    Ok(match generated {
        Some(value) => result.with_autoincrement_value(value),
        None => result,
    })
}
