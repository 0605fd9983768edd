/// An index over one or more columns of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    /// Index name; unnamed indexes are reported as `PRIMARY` by the table
    /// handler.
    pub name: Option<String>,

    /// Column numbers, in index order.
    pub columns: Vec<usize>,

    /// When `true`, the index indexes the table's primary key columns.
    pub primary_key: bool,

    /// When `true`, indexed entries are unique.
    pub unique: bool,

    /// When `true`, the index supports range scans.
    pub ordered: bool,
}

impl Index {
    pub fn primary_key(columns: Vec<usize>) -> Self {
        Self {
            name: Some("PRIMARY".to_string()),
            columns,
            primary_key: true,
            unique: true,
            ordered: false,
        }
    }

    pub fn unique(name: impl Into<String>, columns: Vec<usize>) -> Self {
        Self {
            name: Some(name.into()),
            columns,
            primary_key: false,
            unique: true,
            ordered: false,
        }
    }

    pub fn ordered(name: impl Into<String>, columns: Vec<usize>) -> Self {
        Self {
            name: Some(name.into()),
            columns,
            primary_key: false,
            unique: false,
            ordered: true,
        }
    }

    pub fn is_single_column(&self) -> bool {
        self.columns.len() == 1
    }
}
