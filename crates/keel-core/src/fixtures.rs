//! Table metadata shared by unit tests.

use crate::schema::{Column, ColumnType, ForeignKey, Index, Table};

use std::sync::Arc;

/// `hr.employee`:
///
/// | # | column  | notes                  |
/// |---|---------|------------------------|
/// | 0 | id      | primary key            |
/// | 1 | name    | ordered with age       |
/// | 2 | age     | ordered alone          |
/// | 3 | magic   | unique                 |
/// | 4 | dept_id | foreign key, ordered   |
/// | 5 | photo   | blob                   |
pub(crate) fn employee() -> Arc<Table> {
    let mut table = Table::new("hr", "employee");

    let id = table.push_column(Column::new("id", 0, ColumnType::Int));
    id.primary_key = true;
    id.nullable = false;
    table.push_column(Column::new("name", 0, ColumnType::VarChar(32)));
    table.push_column(Column::new("age", 0, ColumnType::Int));
    table.push_column(Column::new("magic", 0, ColumnType::Int)).nullable = false;
    table.push_column(Column::new("dept_id", 0, ColumnType::Int));
    table.push_column(Column::new("photo", 0, ColumnType::Blob));

    table.indexes = vec![
        Index::primary_key(vec![0]),
        Index::unique("idx_unique_magic", vec![3]),
        Index::ordered("idx_name_age", vec![1, 2]),
        Index::ordered("idx_age", vec![2]),
        Index::ordered("idx_dept", vec![4]),
    ];

    table.foreign_keys = vec![ForeignKey {
        name: "fk_dept".to_string(),
        columns: vec!["dept_id".to_string()],
        target_database: "hr".to_string(),
        target_table: "department".to_string(),
        target_columns: vec!["id".to_string()],
    }];

    Arc::new(table)
}

/// `shop.line_item`, keyed by `(order_id, line)`, with a unique `sku` and
/// a JSON `extra` column.
pub(crate) fn line_item() -> Arc<Table> {
    let mut table = Table::new("shop", "line_item");

    table.push_column(Column::new("order_id", 0, ColumnType::BigInt)).primary_key = true;
    table.push_column(Column::new("line", 0, ColumnType::Int)).primary_key = true;
    table.push_column(Column::new("sku", 0, ColumnType::VarChar(16)));
    table.push_column(Column::new("quantity", 0, ColumnType::Int));
    table.push_column(Column::new("extra", 0, ColumnType::Json));

    table.indexes = vec![
        Index::primary_key(vec![0, 1]),
        Index::unique("idx_sku", vec![2]),
        Index::ordered("idx_order_quantity", vec![0, 3]),
    ];

    Arc::new(table)
}

/// `hr.department`, referenced by `hr.employee.dept_id`.
pub(crate) fn department() -> Arc<Table> {
    let mut table = Table::new("hr", "department");

    table.push_column(Column::new("id", 0, ColumnType::Int)).primary_key = true;
    table.push_column(Column::new("name", 0, ColumnType::VarChar(32)));

    table.indexes = vec![Index::primary_key(vec![0])];

    Arc::new(table)
}
