use super::{Column, ForeignKey, Index};

/// Metadata describing one stored table.
///
/// `indexes[0]` is always the primary key index; the collaborator reports
/// remaining indexes in declaration order.
#[derive(Debug, Clone)]
pub struct Table {
    /// Database (schema) the table lives in
    pub database: String,

    /// Name of the table
    pub name: String,

    /// The table's columns. `columns[n].column_number == n`.
    pub columns: Vec<Column>,

    pub indexes: Vec<Index>,

    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
            columns: vec![],
            indexes: vec![],
            foreign_keys: vec![],
        }
    }

    /// `database.table`, the key table metadata and handlers are cached
    /// under.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn primary_key(&self) -> Option<&Index> {
        self.indexes.first().filter(|index| index.primary_key)
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.primary_key()
            .into_iter()
            .flat_map(|index| index.columns.iter())
            .filter_map(|column_number| self.columns.get(*column_number))
    }

    /// Appends a column, numbering it after the existing ones.
    pub fn push_column(&mut self, mut column: Column) -> &mut Column {
        let column_number = self.columns.len();
        column.column_number = column_number;
        self.columns.push(column);
        &mut self.columns[column_number]
    }

    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.name == name)
    }
}
