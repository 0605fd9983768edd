use super::{Predicate, QueryField, QueryHandler, QueryParameter};
use crate::{handler::TableHandler, Error, Result};

use indexmap::IndexMap;
use std::sync::Arc;

/// Builds a query over one mapped table: one [`QueryField`] per mapped
/// field, named parameters, and at most one predicate.
#[derive(Debug, Clone)]
pub struct QueryDomainType {
    handler: Arc<TableHandler>,
    fields: IndexMap<String, QueryField>,
    predicate: Option<Predicate>,
}

impl QueryDomainType {
    pub fn new(handler: Arc<TableHandler>) -> Self {
        let fields = handler
            .fields()
            .iter()
            .map(|field| (field.field_name.clone(), QueryField::new(field)))
            .collect();

        Self {
            handler,
            fields,
            predicate: None,
        }
    }

    pub fn handler(&self) -> &Arc<TableHandler> {
        &self.handler
    }

    pub fn field(&self, name: &str) -> Result<QueryField> {
        self.fields.get(name).cloned().ok_or_else(|| {
            Error::invalid_argument(format!(
                "{} has no mapped field `{name}`",
                self.handler.table().qualified_name()
            ))
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &QueryField> {
        self.fields.values()
    }

    pub fn param(&self, name: impl Into<String>) -> QueryParameter {
        QueryParameter::new(name)
    }

    /// Sets the predicate. It cannot be replaced once set.
    pub fn where_(&mut self, predicate: Predicate) -> Result<&mut Self> {
        if self.predicate.is_some() {
            return Err(Error::invalid_argument("the query already has a predicate"));
        }
        self.predicate = Some(predicate);
        Ok(self)
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn plan(&self) -> QueryHandler {
        match &self.predicate {
            Some(predicate) => QueryHandler::new(&self.handler, predicate),
            None => QueryHandler::table_scan(),
        }
    }
}
