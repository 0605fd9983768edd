//! Queries over one mapped table.
//!
//! ```ignore
//! let mut query = session.create_query::<Employee>(None).await?;
//! let age = query.field("age")?;
//! query.where_(age.gt(query.param("min")))?;
//!
//! let rows = query
//!     .execute(Object::new().with("min", 40), QueryOptions::new().order("desc").limit(10), None)
//!     .await?;
//! ```

use crate::{context::run, Callback, Session};

use keel_core::{
    driver::{Order, ScanOptions},
    query::{Predicate, QueryDomainType, QueryField, QueryHandler, QueryParameter},
    Entity, Error, Object, Promise, Result, Value,
};

use std::{fmt, marker::PhantomData};

/// Largest `skip` or `limit` accepted: the largest integer a double holds
/// exactly.
pub const MAX_SKIP_LIMIT: i64 = 1 << 52;

/// A query whose results are read as `T`; [`Object`] for tables addressed
/// by name.
pub struct Query<T> {
    session: Session,
    domain: QueryDomainType,
    _p: PhantomData<fn() -> T>,
}

/// Ordering and paging requested for a query, validated when it executes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// `"asc"` or `"desc"`, in any case
    pub order: Option<String>,

    /// Rows to skip; requires `order`
    pub skip: Option<i64>,

    pub limit: Option<i64>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Checks every option. Nothing is clamped: a bad value is an error.
    pub fn validate(&self) -> Result<ScanOptions> {
        let order = match self.order.as_deref() {
            None => None,
            Some(order) if order.eq_ignore_ascii_case("asc") => Some(Order::Asc),
            Some(order) if order.eq_ignore_ascii_case("desc") => Some(Order::Desc),
            Some(order) => {
                return Err(Error::invalid_argument(format!(
                    "Bad order parameter '{order}'; order must be 'asc' or 'desc'."
                )))
            }
        };

        let skip = match self.skip {
            None => None,
            Some(skip) if !(0..=MAX_SKIP_LIMIT).contains(&skip) => {
                return Err(Error::invalid_argument(format!(
                    "Bad skip parameter '{skip}'; skip must be between 0 and {MAX_SKIP_LIMIT}."
                )))
            }
            Some(skip) if order.is_none() => {
                return Err(Error::invalid_argument(format!(
                    "Bad skip parameter '{skip}'; skip requires order."
                )))
            }
            Some(skip) => Some(skip as u64),
        };

        let limit = match self.limit {
            None => None,
            Some(limit) if !(0..=MAX_SKIP_LIMIT).contains(&limit) => {
                return Err(Error::invalid_argument(format!(
                    "Bad limit parameter '{limit}'; limit must be between 0 and {MAX_SKIP_LIMIT}."
                )))
            }
            Some(limit) => Some(limit as u64),
        };

        Ok(ScanOptions { order, skip, limit })
    }
}

impl<T: Entity + Clone> Query<T> {
    pub(crate) fn new(session: Session, domain: QueryDomainType) -> Self {
        Self {
            session,
            domain,
            _p: PhantomData,
        }
    }

    pub fn field(&self, name: &str) -> Result<QueryField> {
        self.domain.field(name)
    }

    pub fn param(&self, name: impl Into<String>) -> QueryParameter {
        self.domain.param(name)
    }

    pub fn where_(&mut self, predicate: Predicate) -> Result<&mut Self> {
        self.domain.where_(predicate)?;
        Ok(self)
    }

    pub fn domain_type(&self) -> &QueryDomainType {
        &self.domain
    }

    /// The access path the query will use.
    pub fn plan(&self) -> QueryHandler {
        self.domain.plan()
    }

    /// Runs the query with `params` bound to its named parameters.
    pub fn execute(
        &self,
        params: Object,
        options: QueryOptions,
        callback: Option<Callback<Vec<T>>>,
    ) -> Promise<Vec<T>> {
        let (session, domain) = (self.session.clone(), self.domain.clone());
        run("execute_query", callback, async move {
            session.check_open()?;

            let options = options.validate()?;
            if let Some(predicate) = domain.predicate() {
                for name in predicate.parameters() {
                    if !params.contains(name) {
                        return Err(Error::invalid_argument(format!(
                            "no value for query parameter `{name}`"
                        )));
                    }
                }
            }

            let handler = domain.handler().clone();
            let adapter = session.factory().pool().adapter();
            let th = session.db_session().transaction_handler();

            tracing::debug!(
                table = %handler.table().qualified_name(),
                query_type = domain.plan().query_type().code(),
                "executing query"
            );

            let operation = th.build_scan_operation(&domain, &params, &options).await?;
            let result = session
                .execute_one(&operation)
                .await
                .and_then(|result| result.into_result());

            let rows = match result {
                Ok(Value::List(rows)) => rows,
                Ok(value) => {
                    return Err(Error::invalid_argument(format!(
                        "scan returned {value}, expected a list"
                    )))
                }
                Err(err) => {
                    session.current_transaction().on_operation_failed(&err);
                    return Err(err);
                }
            };

            rows.into_iter()
                .map(|row| match row {
                    Value::Object(object) => handler.apply_mapping_to_result(object, adapter)?.downcast(),
                    row => Err(Error::invalid_argument(format!(
                        "scan row {row} is not an object"
                    ))),
                })
                .collect()
        })
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            domain: self.domain.clone(),
            _p: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("table", &self.domain.handler().table().qualified_name())
            .field("predicate", &self.domain.predicate())
            .finish()
    }
}
