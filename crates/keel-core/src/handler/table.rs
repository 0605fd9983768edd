use super::{choose_index, FieldListener, FieldPresence, HandlerField, IndexHandler, Keys};
use crate::{
    mapping::{FieldMapping, MappingId, Relationship, TableMapping, TypeDescriptor},
    schema::{ForeignKey, Table},
    Entity, Error, Object, Result, Value,
};

use indexmap::IndexMap;
use std::{collections::HashMap, sync::Arc};

/// Maps the fields of a domain type onto the columns and indexes of one
/// table, and marshals values between the two.
///
/// Building a handler never fails. Structural problems, such as a field
/// naming a column the table does not have, are recorded in
/// [`error_messages`] and mark the handler invalid; [`err`] turns them into
/// an error when the handler is used.
///
/// [`error_messages`]: TableHandler::error_messages
/// [`err`]: TableHandler::err
#[derive(Debug)]
pub struct TableHandler {
    table: Arc<Table>,
    descriptor: Option<Arc<TypeDescriptor>>,
    mapping: TableMapping,
    resolved_mapping: TableMapping,

    /// Mapped fields, by field number
    fields: Vec<HandlerField>,

    /// Field number of each column, by column number
    column_to_field: Vec<Option<usize>>,

    field_names: HashMap<String, usize>,
    relationship_fields: Vec<Relationship>,
    foreign_keys: IndexMap<String, ForeignKey>,
    index_handlers: Vec<IndexHandler>,
    auto_increment_field: Option<usize>,
    number_of_lob_columns: usize,
    is_valid: bool,
    error_messages: Vec<String>,
}

impl TableHandler {
    /// Builds the handler for `table`.
    ///
    /// The mapping defaults to the descriptor's, and without either every
    /// column is mapped to a field of the same name.
    pub fn new(
        table: Arc<Table>,
        mapping: Option<&TableMapping>,
        descriptor: Option<Arc<TypeDescriptor>>,
    ) -> Self {
        let mapping = match (mapping, &descriptor) {
            (Some(mapping), _) => mapping.clone(),
            (None, Some(descriptor)) => descriptor.mapping.clone(),
            (None, None) => default_mapping(&table),
        };

        let mut error_messages = vec![];
        let mut relationship_fields = vec![];

        // Declared field for each column, by column number
        let mut declared: Vec<Option<FieldMapping>> = vec![None; table.columns.len()];
        let mut mapped_field_count = 0;

        for field in &mapping.fields {
            if let Some(relationship) = &field.relationship {
                relationship_fields.push(relationship.clone());
                continue;
            }

            if !field.persistent {
                continue;
            }

            mapped_field_count += 1;

            match table.column(&field.column_name) {
                Some(column) => declared[column.column_number] = Some(field.clone()),
                None => error_messages.push(format!(
                    "field {}: column {} does not exist",
                    field.field_name, field.column_name
                )),
            }
        }

        if mapping.map_all_columns {
            for column in &table.columns {
                let slot = &mut declared[column.column_number];
                if slot.is_none() && mapping.field(&column.name).is_none() {
                    *slot = Some(FieldMapping::new(column.name.clone()));
                    mapped_field_count += 1;
                }
            }
        }

        let mut fields = vec![];
        let mut column_to_field = vec![None; table.columns.len()];
        let mut field_names = HashMap::new();
        let mut auto_increment_field = None;
        let mut number_of_lob_columns = 0;

        let mut resolved_mapping = mapping.clone();
        resolved_mapping.fields = vec![];
        resolved_mapping.map_all_columns = false;

        for column in &table.columns {
            if column.lob {
                number_of_lob_columns += 1;
            }

            let Some(field) = &declared[column.column_number] else {
                continue;
            };

            let field_number = fields.len();

            if column.auto_increment {
                auto_increment_field = Some(field_number);
            }

            column_to_field[column.column_number] = Some(field_number);
            field_names.insert(field.field_name.clone(), field_number);

            fields.push(HandlerField::new(
                &field.field_name,
                field_number,
                column,
                field.converter.clone(),
                field.sparse_field_names.clone(),
            ));

            resolved_mapping.fields.push(field.clone());
        }

        for field in mapping.fields.iter().filter(|field| field.is_relationship()) {
            resolved_mapping.fields.push(field.clone());
        }

        if mapped_field_count != fields.len() {
            error_messages.push(format!(
                "{mapped_field_count} fields are mapped but only {} map to columns of {}",
                fields.len(),
                table.qualified_name()
            ));
        }

        let index_handlers = table
            .indexes
            .iter()
            .enumerate()
            .map(|(index_number, index)| {
                let index_fields = index
                    .columns
                    .iter()
                    .filter_map(|column_number| column_to_field.get(*column_number).copied().flatten())
                    .map(|field_number| fields[field_number].clone())
                    .collect();
                IndexHandler::new(index_number, index, index_fields)
            })
            .collect();

        let foreign_keys = table
            .foreign_keys
            .iter()
            .map(|fk| (fk.name.clone(), fk.clone()))
            .collect();

        let is_valid = error_messages.is_empty();

        if !is_valid {
            tracing::debug!(
                table = %table.qualified_name(),
                errors = ?error_messages,
                "table handler is invalid"
            );
        }

        Self {
            table,
            descriptor,
            mapping,
            resolved_mapping,
            fields,
            column_to_field,
            field_names,
            relationship_fields,
            foreign_keys,
            index_handlers,
            auto_increment_field,
            number_of_lob_columns,
            is_valid,
            error_messages,
        }
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn descriptor(&self) -> Option<&Arc<TypeDescriptor>> {
        self.descriptor.as_ref()
    }

    pub fn mapping_id(&self) -> Option<MappingId> {
        self.descriptor.as_ref().map(|descriptor| descriptor.id)
    }

    pub fn mapping(&self) -> &TableMapping {
        &self.mapping
    }

    /// The mapping as resolved against the table: one field per mapped
    /// column in column order, followed by the relationship fields.
    pub fn resolved_mapping(&self) -> &TableMapping {
        &self.resolved_mapping
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    /// The accumulated problems as an error, if the handler is invalid.
    pub fn err(&self) -> Option<Error> {
        if self.is_valid {
            None
        } else {
            Some(Error::mapping(self.error_messages.join("; ")))
        }
    }

    pub fn fields(&self) -> &[HandlerField] {
        &self.fields
    }

    pub fn field(&self, field_number: usize) -> Option<&HandlerField> {
        self.fields.get(field_number)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&HandlerField> {
        self.field_names
            .get(name)
            .map(|field_number| &self.fields[*field_number])
    }

    pub fn field_for_column(&self, column_number: usize) -> Option<&HandlerField> {
        self.column_to_field
            .get(column_number)
            .copied()
            .flatten()
            .map(|field_number| &self.fields[field_number])
    }

    pub fn relationship_fields(&self) -> &[Relationship] {
        &self.relationship_fields
    }

    pub fn relationship(&self, field_name: &str) -> Option<&Relationship> {
        self.relationship_fields
            .iter()
            .find(|relationship| relationship.field_name == field_name)
    }

    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.get(name)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.foreign_keys.values()
    }

    pub fn index_handlers(&self) -> &[IndexHandler] {
        &self.index_handlers
    }

    pub fn index_handler(&self, index_number: usize) -> Option<&IndexHandler> {
        self.index_handlers.get(index_number)
    }

    pub fn primary_index(&self) -> Option<&IndexHandler> {
        self.index_handlers
            .first()
            .filter(|index| index.is_primary_key())
    }

    /// The auto-increment field, if the table has an auto-increment column
    /// that is mapped.
    pub fn auto_increment_field(&self) -> Option<&HandlerField> {
        self.auto_increment_field
            .map(|field_number| &self.fields[field_number])
    }

    pub fn number_of_lob_columns(&self) -> usize {
        self.number_of_lob_columns
    }

    /// The index a keyed operation should use, see [`choose_index`].
    pub fn get_index_handler(&self, keys: &Keys, unique_only: bool) -> Option<&IndexHandler> {
        choose_index(self, keys, unique_only).and_then(|index| self.index_handler(index))
    }

    pub fn all_columns_mapped(&self) -> bool {
        self.fields.len() == self.table.columns.len()
    }

    pub fn get_mapped_field_count(&self) -> usize {
        self.fields.len()
    }

    /// True if `values` has an entry for every mapped field.
    pub fn all_fields_included(&self, values: &Object) -> bool {
        self.fields
            .iter()
            .all(|field| values.contains(&field.field_name))
    }

    /// Reads one field of `entity` as a stored value.
    ///
    /// Returns `None` when the entity does not define the field. The
    /// listener, when given, hears whether the field was defined and is told
    /// about non-binary values headed for binary columns.
    pub fn get(
        &self,
        entity: &dyn Entity,
        field_number: usize,
        adapter: &str,
        listener: Option<&mut dyn FieldListener>,
    ) -> Result<Option<Value>> {
        let Some(field) = self.fields.get(field_number) else {
            return Err(Error::invalid_argument(format!(
                "{} has no field number {field_number}",
                self.table.qualified_name()
            )));
        };

        let value = match &field.sparse_field_names {
            Some(names) => self.sparse_value(entity, names),
            None => entity.get_field(&field.field_name),
        };

        let Some(value) = value else {
            if let Some(listener) = listener {
                listener.set_undefined(field_number);
            }
            return Ok(None);
        };

        let value = field.to_db(value, adapter)?;

        if let Some(listener) = listener {
            if field.binary && !value.is_null() && !value.is_bytes() {
                listener.set_error(format!(
                    "column {} requires a binary value",
                    field.column_name
                ));
            }
            listener.set_defined(field_number);
        }

        Ok(Some(value))
    }

    /// Stores a value read from storage onto `entity`. Returns `false` if
    /// there is no field with that number.
    pub fn set(
        &self,
        entity: &mut dyn Entity,
        field_number: usize,
        value: Value,
        adapter: &str,
    ) -> Result<bool> {
        let Some(field) = self.fields.get(field_number) else {
            return Ok(false);
        };

        let value = field.from_db(value, adapter)?;

        if field.is_sparse_container() {
            match value {
                Value::Object(sparse) => {
                    for (name, value) in sparse {
                        entity.set_field(&name, value)?;
                    }
                }
                Value::Null => {}
                value => {
                    return Err(Error::invalid_argument(format!(
                        "sparse column {} holds {value}, expected an object",
                        field.column_name
                    )))
                }
            }
        } else {
            entity.set_field(&field.field_name, value)?;
        }

        Ok(true)
    }

    /// Sets every field present in `values`, which is keyed by field name.
    pub fn set_fields(&self, entity: &mut dyn Entity, values: &Object, adapter: &str) -> Result<()> {
        for field in &self.fields {
            if let Some(value) = values.get(&field.field_name) {
                self.set(entity, field.field_number, value.clone(), adapter)?;
            }
        }
        Ok(())
    }

    /// Every field as a stored value, in field-number order. Undefined
    /// fields read as null.
    pub fn get_fields(&self, entity: &dyn Entity, adapter: &str) -> Result<Vec<Value>> {
        (0..self.fields.len())
            .map(|field_number| {
                Ok(self
                    .get(entity, field_number, adapter, None)?
                    .unwrap_or_default())
            })
            .collect()
    }

    /// Stored values of the fields `entity` defines, by field number, with
    /// `None` for undefined fields.
    pub fn get_write_set(&self, entity: &dyn Entity, adapter: &str) -> Result<Vec<Option<Value>>> {
        let mut presence = FieldPresence::new(self.fields.len());
        let values = (0..self.fields.len())
            .map(|field_number| self.get(entity, field_number, adapter, Some(&mut presence)))
            .collect::<Result<Vec<_>>>()?;
        presence.into_result()?;
        Ok(values)
    }

    /// A new domain object populated from `values`, keyed by field name.
    pub fn new_result_object(&self, values: &Object, adapter: &str) -> Result<Box<dyn Entity>> {
        let mut entity = self.new_instance();
        self.set_fields(&mut *entity, values, adapter)?;
        Ok(entity)
    }

    /// A new domain object populated positionally from a flat row: the
    /// `key_fields` values start at `offset`, followed by the
    /// `non_key_fields` values.
    pub fn new_result_object_from_row(
        &self,
        row: &[Value],
        adapter: &str,
        offset: usize,
        key_fields: &[usize],
        non_key_fields: &[usize],
    ) -> Result<Box<dyn Entity>> {
        let mut entity = self.new_instance();

        for (position, field_number) in key_fields.iter().chain(non_key_fields).enumerate() {
            let Some(value) = row.get(offset + position) else {
                return Err(Error::invalid_argument(format!(
                    "row has {} values, expected at least {}",
                    row.len(),
                    offset + key_fields.len() + non_key_fields.len()
                )));
            };
            self.set(&mut *entity, *field_number, value.clone(), adapter)?;
        }

        Ok(entity)
    }

    /// Turns a raw result keyed by field name into a domain object. Without
    /// a registered type, the converters are applied to the object in place.
    pub fn apply_mapping_to_result(&self, mut object: Object, adapter: &str) -> Result<Box<dyn Entity>> {
        if self.descriptor.is_some() {
            return self.new_result_object(&object, adapter);
        }

        for field in &self.fields {
            let Some(value) = object.remove(&field.field_name) else {
                continue;
            };

            match (field.from_db(value, adapter)?, field.is_sparse_container()) {
                (Value::Object(sparse), true) => {
                    for (name, value) in sparse {
                        object.insert(name, value);
                    }
                }
                (Value::Null, true) => {}
                (value, _) => {
                    object.insert(field.field_name.clone(), value);
                }
            }
        }

        Ok(Box::new(object))
    }

    fn new_instance(&self) -> Box<dyn Entity> {
        match &self.descriptor {
            Some(descriptor) => descriptor.new_instance(),
            None => Box::new(Object::new()),
        }
    }

    /// The object stored in a sparse column: the named fields, or every
    /// field not otherwise mapped or excluded.
    fn sparse_value(&self, entity: &dyn Entity, names: &[String]) -> Option<Value> {
        let names: Vec<String> = if names.is_empty() {
            entity
                .field_names()
                .into_iter()
                .filter(|name| {
                    !self.field_names.contains_key(name)
                        && self.relationship(name).is_none()
                        && !self.mapping.excluded_field_names.contains(name)
                })
                .collect()
        } else {
            names.to_vec()
        };

        let sparse: Object = names
            .into_iter()
            .filter_map(|name| {
                let value = entity.get_field(&name)?;
                Some((name, value))
            })
            .collect();

        if sparse.is_empty() {
            None
        } else {
            Some(Value::Object(sparse))
        }
    }
}

fn default_mapping(table: &Table) -> TableMapping {
    let mut mapping = TableMapping::new(&table.name);
    mapping.database = Some(table.database.clone());
    mapping
}
