use super::{Converter, FieldMapping, Relationship, RelationshipKind};
use crate::schema::ForeignKey;

use std::sync::Arc;

/// A declarative mapping from a domain type to a stored table.
///
/// Problems found while building the mapping never panic and are never
/// returned from the builder methods. They accumulate in [`error`] and the
/// mapping is refused when it is registered or used.
///
/// [`error`]: TableMapping::error
#[derive(Debug, Clone)]
pub struct TableMapping {
    pub table: String,
    pub database: Option<String>,
    pub fields: Vec<FieldMapping>,

    /// Map every column not mentioned in `fields` to a field of the same name.
    pub map_all_columns: bool,

    /// Fields kept out of sparse field handling.
    pub excluded_field_names: Vec<String>,

    /// Foreign keys declared when the table is created from the mapping.
    /// An empty `target_database` means the table's own database.
    pub foreign_keys: Vec<ForeignKey>,

    error: String,
}

impl TableMapping {
    /// Creates a mapping for `table`, which may be qualified as
    /// `database.table`.
    pub fn new(table: impl AsRef<str>) -> Self {
        let mut mapping = Self {
            table: String::new(),
            database: None,
            fields: vec![],
            map_all_columns: true,
            excluded_field_names: vec![],
            foreign_keys: vec![],
            error: String::new(),
        };

        match table.as_ref().split_once('.') {
            Some((database, table)) => {
                mapping.database = Some(database.to_string());
                mapping.table = table.to_string();
            }
            None => mapping.table = table.as_ref().to_string(),
        }

        if mapping.table.is_empty() {
            mapping.push_error("table name must be a non-empty string");
        }
        if mapping.database.as_deref() == Some("") {
            mapping.push_error("database name must be a non-empty string");
        }

        mapping
    }

    /// Accumulated validation problems, empty when the mapping is valid.
    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_empty()
    }

    /// `database.table`, or just the table when no database is given.
    pub fn qualified_name(&self) -> String {
        match &self.database {
            Some(database) => format!("{database}.{}", self.table),
            None => self.table.clone(),
        }
    }

    pub fn map_all_columns(mut self, map_all_columns: bool) -> Self {
        self.map_all_columns = map_all_columns;
        self
    }

    /// Adds the field mapping, replacing an earlier mapping of the same field.
    pub fn map_field(mut self, field: FieldMapping) -> Self {
        for message in field.validate() {
            self.push_error(&message);
        }

        if let Some(other) = self.fields.iter().find(|other| {
            other.field_name != field.field_name
                && other.persistent
                && field.persistent
                && other.relationship.is_none()
                && field.relationship.is_none()
                && other.column_name == field.column_name
        }) {
            let message = format!(
                "fields `{}` and `{}` both map column `{}`",
                other.field_name, field.field_name, field.column_name
            );
            self.push_error(&message);
        }

        self.upsert(field);
        self
    }

    pub fn map_one_to_one(self, relationship: Relationship) -> Self {
        self.map_relationship(RelationshipKind::OneToOne, relationship)
    }

    pub fn map_many_to_one(self, relationship: Relationship) -> Self {
        self.map_relationship(RelationshipKind::ManyToOne, relationship)
    }

    pub fn map_one_to_many(self, relationship: Relationship) -> Self {
        self.map_relationship(RelationshipKind::OneToMany, relationship)
    }

    pub fn map_many_to_many(self, relationship: Relationship) -> Self {
        self.map_relationship(RelationshipKind::ManyToMany, relationship)
    }

    fn map_relationship(mut self, kind: RelationshipKind, mut relationship: Relationship) -> Self {
        relationship.kind = kind;

        for message in relationship.validate() {
            self.push_error(&message);
        }

        let mut field = FieldMapping::new(relationship.field_name.clone());
        field.persistent = false;
        field.relationship = Some(relationship);
        self.upsert(field);
        self
    }

    /// Stores `field_names` (or, when `None`, every field not otherwise
    /// mapped) together in `column`. The JSON converter is used unless
    /// another converter is given.
    pub fn map_sparse_fields(
        mut self,
        column: impl Into<String>,
        field_names: Option<Vec<String>>,
        converter: Option<Arc<dyn Converter>>,
    ) -> Self {
        let column = column.into();

        if column.is_empty() {
            self.push_error("sparse field column name must be a non-empty string");
        }

        let field = FieldMapping::sparse(&column, field_names.unwrap_or_default(), converter);
        self.upsert(field);
        self
    }

    /// Keeps the named fields out of sparse field handling.
    pub fn exclude_fields<I>(mut self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.excluded_field_names.contains(&name) {
                self.excluded_field_names.push(name);
            }
        }
        self
    }

    pub fn map_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        if foreign_key.name.is_empty() {
            self.push_error("foreign key name must be a non-empty string");
        }
        if foreign_key.columns.is_empty() || foreign_key.columns.len() != foreign_key.target_columns.len() {
            let message = format!(
                "foreign key `{}` must pair each column with a target column",
                foreign_key.name
            );
            self.push_error(&message);
        }
        self.foreign_keys.push(foreign_key);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|field| field.field_name == name)
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.fields
            .iter()
            .filter_map(|field| field.relationship.as_ref())
    }

    fn upsert(&mut self, field: FieldMapping) {
        match self
            .fields
            .iter_mut()
            .find(|existing| existing.field_name == field.field_name)
        {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    fn push_error(&mut self, message: &str) {
        if !self.error.is_empty() {
            self.error.push('\n');
        }
        self.error.push_str(message);
    }
}
