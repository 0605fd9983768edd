use keel_core::{
    driver::OperationError,
    mapping::TableMapping,
    schema::{Column, Index, Table},
    Error, Result, Value,
};

use indexmap::IndexMap;

/// Storage failures reported with MySQL's SQLSTATEs and error codes.
pub(crate) mod failure {
    use super::*;

    pub(crate) fn no_such_table(table: &Table) -> OperationError {
        OperationError::new("42S02", format!("Table '{}' doesn't exist", table.qualified_name()))
            .with_code(1146)
    }

    pub(crate) fn duplicate(index: &Index, key: &[Value]) -> OperationError {
        let key = key.iter().map(ToString::to_string).collect::<Vec<_>>().join("-");
        OperationError::new(
            "23000",
            format!(
                "Duplicate entry '{key}' for key '{}'",
                index.name.as_deref().unwrap_or("PRIMARY")
            ),
        )
        .with_code(1062)
    }

    pub(crate) fn not_null(column: &Column) -> OperationError {
        OperationError::new("23000", format!("Column '{}' cannot be null", column.name)).with_code(1048)
    }

    pub(crate) fn no_row(table: &Table) -> OperationError {
        OperationError::no_data(format!("no matching row in {}", table.qualified_name()))
    }
}

/// Every table of one pool, by qualified name.
#[derive(Debug, Default)]
pub(crate) struct Store {
    tables: IndexMap<String, StoredTable>,
}

#[derive(Debug, Clone)]
pub(crate) struct StoredTable {
    pub(crate) meta: Table,

    /// Rows indexed by column number
    pub(crate) rows: Vec<Vec<Value>>,

    pub(crate) next_auto_increment: i64,
}

impl Store {
    pub(crate) fn table(&self, database: &str, table: &str) -> Option<&StoredTable> {
        self.tables.get(&format!("{database}.{table}"))
    }

    pub(crate) fn get(&self, key: &str) -> Option<&StoredTable> {
        self.tables.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut StoredTable> {
        self.tables.get_mut(key)
    }

    /// Adds the table unless one of that name exists. Returns `true` if it
    /// was added.
    pub(crate) fn create_table(&mut self, meta: Table) -> bool {
        let key = meta.qualified_name();
        if self.tables.contains_key(&key) {
            return false;
        }

        self.tables.insert(
            key,
            StoredTable {
                meta,
                rows: vec![],
                next_auto_increment: 1,
            },
        );
        true
    }

    /// Puts back a table as it was saved, or drops it if it did not exist.
    pub(crate) fn restore(&mut self, key: String, saved: Option<StoredTable>) {
        match saved {
            Some(table) => {
                self.tables.insert(key, table);
            }
            None => {
                self.tables.shift_remove(&key);
            }
        }
    }

    pub(crate) fn table_names(&self, database: &str) -> Vec<String> {
        self.tables
            .values()
            .filter(|table| table.meta.database == database)
            .map(|table| table.meta.name.clone())
            .collect()
    }
}

impl StoredTable {
    /// Positions of the rows whose `columns` equal `key`.
    pub(crate) fn matching(&self, columns: &[usize], key: &[Value]) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row_matches(row, columns, key))
            .map(|(position, _)| position)
            .collect()
    }

    /// Position of the first row whose `columns` equal `key`.
    pub(crate) fn find(&self, columns: &[usize], key: &[Value]) -> Option<usize> {
        self.rows.iter().position(|row| row_matches(row, columns, key))
    }

    /// Checks a row about to be stored at `position` (or appended, when
    /// `None`) against the not-null columns and the unique indexes.
    pub(crate) fn check(&self, row: &[Value], position: Option<usize>) -> Result<(), OperationError> {
        for column in &self.meta.columns {
            if !column.nullable && row[column.column_number].is_null() {
                return Err(failure::not_null(column));
            }
        }

        for index in self.meta.indexes.iter().filter(|index| index.unique) {
            let key: Vec<Value> = index.columns.iter().map(|column| row[*column].clone()).collect();

            // Null never collides in a unique index
            if key.iter().any(Value::is_null) {
                continue;
            }

            let collides = self
                .matching(&index.columns, &key)
                .into_iter()
                .any(|other| Some(other) != position);

            if collides {
                return Err(failure::duplicate(index, &key));
            }
        }

        Ok(())
    }

    /// Values of the named columns of `row`.
    pub(crate) fn values(&self, row: &[Value], columns: &[String]) -> Option<Vec<Value>> {
        columns
            .iter()
            .map(|name| self.meta.column(name).map(|column| row[column.column_number].clone()))
            .collect()
    }

    /// Column numbers of the named columns.
    pub(crate) fn column_numbers(&self, columns: &[String]) -> Option<Vec<usize>> {
        columns
            .iter()
            .map(|name| self.meta.column(name).map(|column| column.column_number))
            .collect()
    }

    /// A new row holding each column's default.
    pub(crate) fn empty_row(&self) -> Vec<Value> {
        self.meta
            .columns
            .iter()
            .map(|column| column.default_value.clone().unwrap_or_default())
            .collect()
    }
}

fn row_matches(row: &[Value], columns: &[usize], key: &[Value]) -> bool {
    columns.len() == key.len()
        && columns
            .iter()
            .zip(key)
            .all(|(column, value)| row.get(*column).is_some_and(|stored| stored.key_eq(value)))
}

/// The table a mapping describes, built from each field's column hints.
pub(crate) fn table_from_mapping(mapping: &TableMapping, database: &str) -> Result<Table> {
    if !mapping.is_valid() {
        return Err(Error::mapping(mapping.error()));
    }

    let mut table = Table::new(database, &mapping.table);
    let mut primary_key = vec![];
    let mut indexes = vec![];

    for field in mapping.fields.iter().filter(|field| field.persistent && !field.is_relationship()) {
        if table.column(&field.column_name).is_some() {
            continue;
        }

        let meta = &field.meta;
        let mut column = Column::new(&field.column_name, 0, meta.column_type);
        column.nullable = meta.nullable && !meta.primary_key;
        column.primary_key = meta.primary_key;
        column.auto_increment = meta.auto_increment;

        let column_number = table.push_column(column).column_number;

        if meta.primary_key {
            primary_key.push(column_number);
        }
        if meta.unique {
            indexes.push(Index::unique(format!("{}_UNIQUE", field.column_name), vec![column_number]));
        }
        if meta.ordered_index {
            indexes.push(Index::ordered(format!("{}_idx", field.column_name), vec![column_number]));
        }
    }

    if primary_key.is_empty() {
        return Err(Error::invalid_argument(format!(
            "cannot create {}: no field is mapped as the primary key",
            table.qualified_name()
        )));
    }

    table.indexes.push(Index::primary_key(primary_key));
    table.indexes.extend(indexes);

    table.foreign_keys = mapping
        .foreign_keys
        .iter()
        .cloned()
        .map(|mut foreign_key| {
            if foreign_key.target_database.is_empty() {
                foreign_key.target_database = database.to_string();
            }
            foreign_key
        })
        .collect();

    Ok(table)
}
