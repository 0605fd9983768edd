use super::{apply_values, auto_increment, index_columns};
use crate::store::StoredTable;

use keel_core::{
    driver::{operation::Write, OperationResult},
    Result, Value,
};

/// Insert, or update the row with the same primary key. A key left
/// undefined always inserts.
pub(super) fn exec(table: &mut StoredTable, op: &Write) -> Result<OperationResult> {
    let columns = index_columns(&op.handler, op.index)?;

    let key: Option<Vec<Value>> = columns
        .iter()
        .map(|column| {
            op.handler
                .field_for_column(*column)
                .and_then(|field| op.values.get(field.field_number).cloned().flatten())
                .filter(|value| !value.is_null())
        })
        .collect();

    let position = key.and_then(|key| table.find(columns, &key));

    let mut row = match position {
        Some(position) => table.rows[position].clone(),
        None => table.empty_row(),
    };
    apply_values(&op.handler, &mut row, &op.values);

    let counter = table.next_auto_increment;
    if position.is_none() {
        auto_increment(table, &mut row);
    }

    if let Err(error) = table.check(&row, position) {
        table.next_auto_increment = counter;
        return Ok(OperationResult::failure(error));
    }

    match position {
        Some(position) => table.rows[position] = row,
        None => table.rows.push(row),
    }

    Ok(OperationResult::success(Value::Null))
}
