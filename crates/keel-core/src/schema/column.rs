use crate::mapping::Converter;

use std::{collections::HashMap, fmt, sync::Arc};

/// A column of a stored table.
#[derive(Clone)]
pub struct Column {
    pub name: String,

    /// Position of the column in the table; used as the bit position in
    /// planner masks.
    pub column_number: usize,

    pub column_type: ColumnType,

    pub nullable: bool,

    /// True if the column is part of the table's primary key
    pub primary_key: bool,

    pub auto_increment: bool,

    /// Large object columns (BLOB/TEXT) are counted separately because some
    /// engines read them in a second pass.
    pub lob: bool,

    /// Binary columns only accept `Value::Bytes`.
    pub binary: bool,

    pub default_value: Option<crate::Value>,

    /// Converter applied to domain values before the adapter's converter.
    pub domain_type_converter: Option<Arc<dyn Converter>>,

    /// Per-adapter converters, keyed by adapter name.
    pub database_type_converters: HashMap<String, Arc<dyn Converter>>,
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    Int,
    BigInt,
    Double,
    VarChar(u32),
    Text,
    Binary(u32),
    Blob,
    Json,
}

impl Column {
    pub fn new(name: impl Into<String>, column_number: usize, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_number,
            column_type,
            nullable: true,
            primary_key: false,
            auto_increment: false,
            lob: column_type.is_lob(),
            binary: column_type.is_binary(),
            default_value: None,
            domain_type_converter: None,
            database_type_converters: HashMap::new(),
        }
    }

    pub fn database_type_converter(&self, adapter: &str) -> Option<&Arc<dyn Converter>> {
        self.database_type_converters.get(adapter)
    }
}

impl ColumnType {
    /// Type name converters are registered under, without length.
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::BigInt => "bigint",
            Self::Double => "double",
            Self::VarChar(_) => "varchar",
            Self::Text => "text",
            Self::Binary(_) => "binary",
            Self::Blob => "blob",
            Self::Json => "json",
        }
    }

    pub fn is_lob(self) -> bool {
        matches!(self, Self::Text | Self::Blob)
    }

    pub fn is_binary(self) -> bool {
        matches!(self, Self::Binary(_) | Self::Blob)
    }

    /// Whether values of this type order meaningfully, i.e. whether the
    /// column may lead an ordered index.
    pub fn is_orderable(self) -> bool {
        !matches!(self, Self::Blob | Self::Json)
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("column_number", &self.column_number)
            .field("column_type", &self.column_type)
            .field("nullable", &self.nullable)
            .field("primary_key", &self.primary_key)
            .field("auto_increment", &self.auto_increment)
            .finish()
    }
}
