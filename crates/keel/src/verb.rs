//! The keyed operations shared by sessions and batches: find, load,
//! persist, save, update and remove.
//!
//! Building an operation resolves the table handler and, for keyed verbs,
//! a unique index; finishing it turns the storage result into the verb's
//! reply.

use crate::{Session, TableIndicator};

use keel_core::{
    driver::{Operation, OperationResult},
    handler::{Keys, TableHandler},
    Entity, Error, Object, Result, Value,
};

use std::sync::Arc;

#[derive(Debug)]
pub(crate) enum Verb {
    Find(Keys),
    Load(Box<dyn Entity>),
    Persist(Box<dyn Entity>),
    Save(Box<dyn Entity>),
    Update(Keys, Object),
    Remove(Keys),
}

/// A built operation and what is needed to interpret its result.
pub(crate) struct Built {
    pub(crate) operation: Operation,
    pub(crate) finish: Finish,
}

pub(crate) struct Finish {
    handler: Arc<TableHandler>,
    adapter: &'static str,
    kind: FinishKind,
}

enum FinishKind {
    Find,
    Load(Box<dyn Entity>),
    Persist(Box<dyn Entity>),
    Done,
}

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Found(Option<Box<dyn Entity>>),
    Entity(Box<dyn Entity>),
    Done,
}

impl Verb {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Find(_) => "find",
            Self::Load(_) => "load",
            Self::Persist(_) => "persist",
            Self::Save(_) => "save",
            Self::Update(..) => "update",
            Self::Remove(_) => "remove",
        }
    }
}

impl Session {
    pub(crate) async fn build(&self, indicator: TableIndicator, verb: Verb) -> Result<Built> {
        let handler = self
            .factory()
            .table_handler(&indicator, Some(&**self.db_session()))
            .await?;

        let th = self.db_session().transaction_handler();
        let adapter = self.factory().pool().adapter();
        let verb_name = verb.name();

        let (operation, kind) = match verb {
            Verb::Find(keys) => {
                let index = unique_index(&handler, &keys, verb_name)?;
                let op = th.build_read_operation(&handler, index, &keys).await?;
                (op, FinishKind::Find)
            }
            Verb::Load(instance) => {
                let keys = Keys::from_entity(&*instance);
                let index = unique_index(&handler, &keys, verb_name)?;
                let op = th.build_read_operation(&handler, index, &keys).await?;
                (op, FinishKind::Load(instance))
            }
            Verb::Persist(instance) => {
                let op = th.build_insert_operation(&handler, &*instance).await?;
                (op, FinishKind::Persist(instance))
            }
            Verb::Save(instance) => {
                let Some(index) = handler.primary_index() else {
                    return Err(no_primary_key(&handler));
                };
                let op = th.build_write_operation(&handler, index, &*instance).await?;
                (op, FinishKind::Done)
            }
            Verb::Update(keys, values) => {
                let index = unique_index(&handler, &keys, verb_name)?;
                let op = th.build_update_operation(&handler, index, &keys, &values).await?;
                (op, FinishKind::Done)
            }
            Verb::Remove(keys) => {
                let index = unique_index(&handler, &keys, verb_name)?;
                let op = th.build_delete_operation(&handler, index, &keys).await?;
                (op, FinishKind::Done)
            }
        };

        tracing::trace!(
            verb = verb_name,
            table = %handler.table().qualified_name(),
            operation = operation.name(),
            "operation built"
        );

        Ok(Built {
            operation,
            finish: Finish {
                handler,
                adapter,
                kind,
            },
        })
    }

    /// Builds and executes one operation.
    pub(crate) async fn perform(&self, indicator: TableIndicator, verb: Verb) -> Result<Reply> {
        let built = self.build(indicator, verb).await?;

        let reply = self
            .execute_one(&built.operation)
            .await
            .and_then(|result| built.finish.apply(result));
        if let Err(err) = &reply {
            self.current_transaction().on_operation_failed(err);
        }
        reply
    }
}

impl Session {
    /// Executes a single operation and returns its result.
    pub(crate) async fn execute_one(&self, operation: &Operation) -> Result<OperationResult> {
        self.db_session()
            .transaction_handler()
            .execute(std::slice::from_ref(operation))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::invalid_argument("storage returned no result"))
    }
}

impl Finish {
    /// Interprets the storage result. A find that matched no row replies
    /// `None` rather than failing.
    pub(crate) fn apply(self, result: OperationResult) -> Result<Reply> {
        let autoincrement_value = result.autoincrement_value.clone();

        let value = match (result.into_result(), &self.kind) {
            (Err(err), FinishKind::Find) if err.is_not_found() => return Ok(Reply::Found(None)),
            (result, _) => result?,
        };

        match self.kind {
            FinishKind::Find => {
                let object = into_object(value)?;
                let entity = self.handler.apply_mapping_to_result(object, self.adapter)?;
                Ok(Reply::Found(Some(entity)))
            }
            FinishKind::Load(mut instance) => {
                let object = into_object(value)?;
                self.handler.set_fields(&mut *instance, &object, self.adapter)?;
                Ok(Reply::Entity(instance))
            }
            FinishKind::Persist(mut instance) => {
                if let (Some(field), Some(value)) =
                    (self.handler.auto_increment_field(), autoincrement_value)
                {
                    let field_number = field.field_number;
                    self.handler.set(&mut *instance, field_number, value, self.adapter)?;
                }
                Ok(Reply::Entity(instance))
            }
            FinishKind::Done => Ok(Reply::Done),
        }
    }
}

impl Reply {
    pub(crate) fn into_found<T: Entity>(self) -> Result<Option<T>> {
        match self {
            Self::Found(Some(entity)) | Self::Entity(entity) => entity.downcast().map(Some),
            Self::Found(None) => Ok(None),
            Self::Done => Err(unexpected()),
        }
    }

    pub(crate) fn into_entity<T: Entity>(self) -> Result<T> {
        match self {
            Self::Entity(entity) => entity.downcast(),
            _ => Err(unexpected()),
        }
    }

    pub(crate) fn into_done(self) -> Result<()> {
        match self {
            Self::Done => Ok(()),
            _ => Err(unexpected()),
        }
    }
}

fn unexpected() -> Error {
    Error::invalid_argument("operation produced an unexpected reply")
}

fn into_object(value: Value) -> Result<Object> {
    match value {
        Value::Object(object) => Ok(object),
        value => Err(Error::invalid_argument(format!(
            "storage returned {value}, expected an object"
        ))),
    }
}

fn unique_index<'a>(
    handler: &'a TableHandler,
    keys: &Keys,
    verb: &str,
) -> Result<&'a keel_core::handler::IndexHandler> {
    handler.get_index_handler(keys, true).ok_or_else(|| {
        Error::invalid_argument(format!(
            "{verb}: no unique index of {} is covered by the keys {:?}",
            handler.table().qualified_name(),
            keys.defined_names()
        ))
    })
}

fn no_primary_key(handler: &TableHandler) -> Error {
    Error::invalid_argument(format!(
        "{} has no primary key",
        handler.table().qualified_name()
    ))
}
