//! The interface to a storage engine.
//!
//! A [`Driver`] connects to an engine and hands out a [`ConnectionPool`].
//! The pool reports table metadata and opens [`DbSession`]s; each session has
//! a [`TransactionHandler`] that builds [`Operation`]s and executes them.

pub mod operation;
pub use operation::{Operation, Order, ScanOptions};

mod properties;
pub use properties::ConnectionProperties;

mod result;
pub use result::{OperationError, OperationResult};

use crate::{
    async_trait,
    handler::{IndexHandler, Keys, TableHandler},
    mapping::{Converter, TableMapping},
    projection::ResolvedProjection,
    query::QueryDomainType,
    schema::Table,
    Entity, Object, Result,
};

use std::{fmt::Debug, sync::Arc};

#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Name of the adapter, also the URL scheme selecting the driver and the
    /// key of adapter-specific column converters.
    fn adapter(&self) -> &'static str;

    async fn connect(&self, properties: &ConnectionProperties) -> Result<Arc<dyn ConnectionPool>>;
}

#[async_trait]
pub trait ConnectionPool: Debug + Send + Sync + 'static {
    fn adapter(&self) -> &'static str;

    async fn get_db_session(&self, index: usize) -> Result<Arc<dyn DbSession>>;

    /// Metadata of `database.table`, or `None` if the table does not exist.
    async fn get_table_metadata(
        &self,
        database: &str,
        table: &str,
        session: Option<&dyn DbSession>,
    ) -> Result<Option<Arc<Table>>>;

    /// Creates the table described by `mapping`, using each field's column
    /// hints. `database` is used when the mapping names none.
    async fn create_table(
        &self,
        mapping: &TableMapping,
        database: &str,
        session: Option<&dyn DbSession>,
    ) -> Result<()>;

    async fn list_tables(&self, database: &str, session: Option<&dyn DbSession>) -> Result<Vec<String>>;

    async fn close(&self) -> Result<()>;

    /// Sets the domain type converter reported for columns of `type_name`
    /// (see [`ColumnType::name`]), or removes it.
    ///
    /// [`ColumnType::name`]: crate::schema::ColumnType::name
    fn register_type_converter(&self, type_name: &str, converter: Option<Arc<dyn Converter>>);
}

#[async_trait]
pub trait DbSession: Debug + Send + Sync + 'static {
    async fn begin(&self) -> Result<()>;

    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;

    fn transaction_handler(&self) -> Arc<dyn TransactionHandler>;
}

/// Builds and executes operations in the session's current transaction, or
/// in autocommit mode when none is active.
#[async_trait]
pub trait TransactionHandler: Debug + Send + Sync + 'static {
    async fn build_insert_operation(
        &self,
        handler: &Arc<TableHandler>,
        values: &dyn Entity,
    ) -> Result<Operation>;

    async fn build_read_operation(
        &self,
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        keys: &Keys,
    ) -> Result<Operation>;

    async fn build_update_operation(
        &self,
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        keys: &Keys,
        values: &dyn Entity,
    ) -> Result<Operation>;

    /// Insert or replace, by the primary key.
    async fn build_write_operation(
        &self,
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        values: &dyn Entity,
    ) -> Result<Operation>;

    async fn build_delete_operation(
        &self,
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        keys: &Keys,
    ) -> Result<Operation>;

    async fn build_scan_operation(
        &self,
        query: &QueryDomainType,
        params: &Object,
        options: &ScanOptions,
    ) -> Result<Operation>;

    async fn build_read_projection_operation(
        &self,
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        keys: &Keys,
        projection: &Arc<ResolvedProjection>,
    ) -> Result<Operation>;

    /// Executes `operations` in order. An operation that fails reports it in
    /// its own result; `Err` means none of the results are available.
    async fn execute(&self, operations: &[Operation]) -> Result<Vec<OperationResult>>;

    async fn rollback(&self) -> Result<()>;
}
