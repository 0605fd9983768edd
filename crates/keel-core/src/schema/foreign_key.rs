/// A foreign key from columns of one table to columns of another.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub name: String,

    /// Referencing column names, in key order
    pub columns: Vec<String>,

    pub target_database: String,

    pub target_table: String,

    /// Referenced column names, parallel to `columns`
    pub target_columns: Vec<String>,
}

impl ForeignKey {
    /// A foreign key to `target_table`, which may be qualified as
    /// `database.table`. Without a qualifier the target database is left
    /// empty, meaning the referencing table's database.
    pub fn new(
        name: impl Into<String>,
        columns: &[&str],
        target_table: &str,
        target_columns: &[&str],
    ) -> Self {
        let (target_database, target_table) = match target_table.split_once('.') {
            Some((database, table)) => (database.to_string(), table.to_string()),
            None => (String::new(), target_table.to_string()),
        };

        Self {
            name: name.into(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
            target_database,
            target_table,
            target_columns: target_columns.iter().map(|column| column.to_string()).collect(),
        }
    }

    /// True if the key references `database.table`.
    pub fn targets(&self, database: &str, table: &str) -> bool {
        self.target_table == table && (self.target_database.is_empty() || self.target_database == database)
    }
}
