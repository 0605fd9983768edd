use super::{Converter, JsonConverter, Relationship};
use crate::schema::ColumnType;

use std::{fmt, sync::Arc};

/// How one field of a domain type maps onto a column.
#[derive(Clone)]
pub struct FieldMapping {
    pub field_name: String,

    /// Defaults to `field_name`.
    pub column_name: String,

    /// Non-persistent fields are never read from or written to storage.
    pub persistent: bool,

    pub converter: Option<Arc<dyn Converter>>,

    /// Set for relationship fields, which have no column of their own.
    pub relationship: Option<Relationship>,

    /// Set when this field's column carries sparse fields. An empty list
    /// means "every field not otherwise mapped".
    pub sparse_field_names: Option<Vec<String>>,

    /// Column hints used when the table is created from the mapping.
    pub meta: FieldMeta,
}

/// Column description used to create a table that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMeta {
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub nullable: bool,
    pub unique: bool,
    pub ordered_index: bool,
}

impl FieldMapping {
    pub fn new(field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        Self {
            column_name: field_name.clone(),
            field_name,
            persistent: true,
            converter: None,
            relationship: None,
            sparse_field_names: None,
            meta: FieldMeta::default(),
        }
    }

    pub fn column(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = column_name.into();
        self
    }

    pub fn converter(mut self, converter: impl Converter) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    pub fn not_persistent(mut self) -> Self {
        self.persistent = false;
        self
    }

    pub fn meta(mut self, meta: FieldMeta) -> Self {
        self.meta = meta;
        self
    }

    pub(super) fn sparse(
        column_name: &str,
        field_names: Vec<String>,
        converter: Option<Arc<dyn Converter>>,
    ) -> Self {
        Self {
            field_name: column_name.to_string(),
            column_name: column_name.to_string(),
            persistent: true,
            converter: Some(converter.unwrap_or_else(|| Arc::new(JsonConverter))),
            relationship: None,
            sparse_field_names: Some(field_names),
            meta: FieldMeta {
                column_type: ColumnType::Json,
                ..FieldMeta::default()
            },
        }
    }

    pub fn is_relationship(&self) -> bool {
        self.relationship.is_some()
    }

    pub fn is_sparse_container(&self) -> bool {
        self.sparse_field_names.is_some()
    }

    /// Problems with this field, described for the mapping's error string.
    pub(super) fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        if self.field_name.is_empty() {
            errors.push("field name must be a non-empty string".to_string());
        }

        if self.persistent && self.relationship.is_none() && self.column_name.is_empty() {
            errors.push(format!(
                "field `{}`: column name must be a non-empty string",
                self.field_name
            ));
        }

        errors
    }
}

impl Default for FieldMeta {
    fn default() -> Self {
        Self {
            column_type: ColumnType::VarChar(255),
            primary_key: false,
            auto_increment: false,
            nullable: true,
            unique: false,
            ordered_index: false,
        }
    }
}

impl FieldMeta {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            ..Self::default()
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn ordered_index(mut self) -> Self {
        self.ordered_index = true;
        self
    }
}

impl fmt::Debug for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMapping")
            .field("field_name", &self.field_name)
            .field("column_name", &self.column_name)
            .field("persistent", &self.persistent)
            .field("converter", &self.converter.is_some())
            .field("relationship", &self.relationship)
            .field("sparse_field_names", &self.sparse_field_names)
            .finish()
    }
}
