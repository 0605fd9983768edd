mod delete;
mod insert;
mod read;
mod read_projection;
mod scan;
mod update;
mod write;

use crate::store::{failure, StoredTable};
use crate::Store;

use keel_core::{
    driver::{Operation, OperationResult},
    handler::TableHandler,
    Error, Object, Result, Value,
};

/// Runs one operation against the store.
///
/// Failures the engine reports, such as a missing row or a duplicate key,
/// come back as failed results. `Err` is reserved for operations the engine
/// cannot make sense of.
pub(crate) fn exec(store: &mut Store, operation: &Operation) -> Result<OperationResult> {
    let key = operation.handler().table().qualified_name();

    if store.get(&key).is_none() {
        return Ok(OperationResult::failure(failure::no_such_table(
            operation.handler().table(),
        )));
    }

    match operation {
        Operation::Insert(op) => insert::exec(table_mut(store, &key)?, op),
        Operation::Read(op) => read::exec(table(store, &key)?, op),
        Operation::Update(op) => update::exec(table_mut(store, &key)?, op),
        Operation::Write(op) => write::exec(table_mut(store, &key)?, op),
        Operation::Delete(op) => delete::exec(table_mut(store, &key)?, op),
        Operation::Scan(op) => scan::exec(table(store, &key)?, op),
        Operation::ReadProjection(op) => read_projection::exec(store, op),
    }
}

/// True for operations that modify a table.
pub(crate) fn is_write(operation: &Operation) -> bool {
    matches!(
        operation,
        Operation::Insert(_) | Operation::Update(_) | Operation::Write(_) | Operation::Delete(_)
    )
}

fn table<'a>(store: &'a Store, key: &str) -> Result<&'a StoredTable> {
    store
        .get(key)
        .ok_or_else(|| Error::not_found(format!("table {key}")))
}

fn table_mut<'a>(store: &'a mut Store, key: &str) -> Result<&'a mut StoredTable> {
    store
        .get_mut(key)
        .ok_or_else(|| Error::not_found(format!("table {key}")))
}

/// Column numbers of an index of the handler's table.
fn index_columns(handler: &TableHandler, index: usize) -> Result<&[usize]> {
    handler
        .table()
        .indexes
        .get(index)
        .map(|index| &index.columns[..])
        .ok_or_else(|| {
            Error::invalid_argument(format!(
                "{} has no index number {index}",
                handler.table().qualified_name()
            ))
        })
}

/// The mapped fields of a stored row, keyed by field name.
fn row_to_object(handler: &TableHandler, row: &[Value]) -> Object {
    let mut object = Object::new();
    for field in handler.fields() {
        object.insert(
            field.field_name.clone(),
            row.get(field.column_number).cloned().unwrap_or_default(),
        );
    }
    object
}

/// Stores the defined values, by field number, into `row`.
fn apply_values(handler: &TableHandler, row: &mut [Value], values: &[Option<Value>]) {
    for (field, value) in handler.fields().iter().zip(values) {
        if let Some(value) = value {
            row[field.column_number] = value.clone();
        }
    }
}

/// Fills the auto-increment column of a new row if it was left empty, and
/// keeps the table's counter ahead of explicit values. Returns the
/// generated value.
fn auto_increment(table: &mut StoredTable, row: &mut [Value]) -> Option<Value> {
    let column = table.meta.columns.iter().find(|column| column.auto_increment)?;
    let slot = &mut row[column.column_number];

    match slot.as_i64() {
        Some(explicit) => {
            table.next_auto_increment = table.next_auto_increment.max(explicit + 1);
            None
        }
        None => {
            let generated = Value::I64(table.next_auto_increment);
            table.next_auto_increment += 1;
            *slot = generated.clone();
            Some(generated)
        }
    }
}
