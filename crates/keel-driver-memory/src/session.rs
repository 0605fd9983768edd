use crate::{op, store::StoredTable, Store, ADAPTER};

use keel_sql::{Serializer, Transaction};

use keel_core::{
    async_trait,
    driver::{
        operation::{Delete, Insert, Read, ReadProjection, Scan, Update, Write},
        DbSession, Operation, OperationResult, ScanOptions, TransactionHandler,
    },
    handler::{IndexHandler, Keys, TableHandler},
    projection::ResolvedProjection,
    query::QueryDomainType,
    Entity, Error, Object, Result,
};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

#[derive(Debug)]
pub(crate) struct MemorySession {
    handler: Arc<MemoryTransactionHandler>,
}

#[derive(Debug)]
pub(crate) struct MemoryTransactionHandler {
    index: usize,
    store: Arc<Mutex<Store>>,

    /// Tables as they were before the active transaction first modified
    /// them, by qualified name. `None` outside of a transaction.
    undo: Mutex<Option<HashMap<String, Option<StoredTable>>>>,
}

impl MemorySession {
    pub(crate) fn new(index: usize, store: Arc<Mutex<Store>>) -> Self {
        Self {
            handler: Arc::new(MemoryTransactionHandler {
                index,
                store,
                undo: Mutex::new(None),
            }),
        }
    }
}

#[async_trait]
impl DbSession for MemorySession {
    async fn begin(&self) -> Result<()> {
        let mut undo = self.handler.undo.lock().unwrap();
        if undo.is_some() {
            return Err(Error::invalid_argument("a transaction is already active"));
        }
        *undo = Some(HashMap::new());
        tracing::trace!(
            session = self.handler.index,
            statement = Serializer::mysql().serialize_transaction(Transaction::Begin),
            "transaction control"
        );
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let Some(undo) = self.handler.undo.lock().unwrap().take() else {
            return Err(Error::invalid_argument("no transaction is active"));
        };
        tracing::trace!(
            session = self.handler.index,
            tables = undo.len(),
            statement = Serializer::mysql().serialize_transaction(Transaction::Commit),
            "transaction control"
        );
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.handler.rollback().await
    }

    async fn close(&self) -> Result<()> {
        // An open transaction is abandoned, not committed
        let active = self.handler.undo.lock().unwrap().is_some();
        if active {
            self.handler.rollback().await?;
        }
        Ok(())
    }

    fn transaction_handler(&self) -> Arc<dyn TransactionHandler> {
        self.handler.clone()
    }
}

impl MemoryTransactionHandler {
    /// Saves the table's current state if the active transaction has not
    /// touched it yet.
    fn record(&self, store: &Store, key: &str) {
        if let Some(undo) = self.undo.lock().unwrap().as_mut() {
            undo.entry(key.to_string())
                .or_insert_with(|| store.get(key).cloned());
        }
    }
}

#[async_trait]
impl TransactionHandler for MemoryTransactionHandler {
    async fn build_insert_operation(
        &self,
        handler: &Arc<TableHandler>,
        values: &dyn Entity,
    ) -> Result<Operation> {
        Ok(Insert::new(handler, values, ADAPTER)?.into())
    }

    async fn build_read_operation(
        &self,
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        keys: &Keys,
    ) -> Result<Operation> {
        Ok(Read::new(handler, index, keys, ADAPTER)?.into())
    }

    async fn build_update_operation(
        &self,
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        keys: &Keys,
        values: &dyn Entity,
    ) -> Result<Operation> {
        Ok(Update::new(handler, index, keys, values, ADAPTER)?.into())
    }

    async fn build_write_operation(
        &self,
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        values: &dyn Entity,
    ) -> Result<Operation> {
        Ok(Write::new(handler, index, values, ADAPTER)?.into())
    }

    async fn build_delete_operation(
        &self,
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        keys: &Keys,
    ) -> Result<Operation> {
        Ok(Delete::new(handler, index, keys, ADAPTER)?.into())
    }

    async fn build_scan_operation(
        &self,
        query: &QueryDomainType,
        params: &Object,
        options: &ScanOptions,
    ) -> Result<Operation> {
        Ok(Scan::new(query, params, options).into())
    }

    async fn build_read_projection_operation(
        &self,
        handler: &Arc<TableHandler>,
        index: &IndexHandler,
        keys: &Keys,
        projection: &Arc<ResolvedProjection>,
    ) -> Result<Operation> {
        Ok(ReadProjection::new(handler, index, keys, projection, ADAPTER)?.into())
    }

    async fn execute(&self, operations: &[Operation]) -> Result<Vec<OperationResult>> {
        tracing::debug!(
            session = self.index,
            operations = operations.len(),
            "executing operations"
        );

        let mut store = self.store.lock().unwrap();
        let mut results = Vec::with_capacity(operations.len());

        for operation in operations {
            if op::is_write(operation) {
                self.record(&store, &operation.handler().table().qualified_name());
            }

            let result = op::exec(&mut store, operation)?;

            if let Some(error) = &result.error {
                tracing::debug!(
                    operation = operation.name(),
                    sqlstate = %error.sqlstate,
                    message = %error.message,
                    "operation failed"
                );
            }

            results.push(result);
        }

        Ok(results)
    }

    async fn rollback(&self) -> Result<()> {
        let Some(undo) = self.undo.lock().unwrap().take() else {
            return Err(Error::invalid_argument("no transaction is active"));
        };

        let mut store = self.store.lock().unwrap();
        for (key, saved) in undo {
            store.restore(key, saved);
        }

        tracing::trace!(
            session = self.index,
            statement = Serializer::mysql().serialize_transaction(Transaction::Rollback),
            "transaction control"
        );
        Ok(())
    }
}
