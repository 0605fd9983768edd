//! An in-memory storage engine for keel.
//!
//! Tables live in process memory for as long as the connection pool is
//! open. Every session of a pool sees the same tables. Transactions record
//! the original state of each table they modify and restore it on rollback;
//! there is no isolation between sessions.

mod op;

mod session;
use session::MemorySession;

mod store;
use store::Store;

use keel_core::{
    async_trait,
    driver::{ConnectionPool, ConnectionProperties, DbSession, Driver},
    mapping::{Converter, TableMapping},
    schema::Table,
    Error, Result,
};

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

/// Adapter name of the memory engine, also its connection URL scheme.
pub const ADAPTER: &str = "memory";

#[derive(Debug, Default, Clone, Copy)]
pub struct Memory;

#[async_trait]
impl Driver for Memory {
    fn adapter(&self) -> &'static str {
        ADAPTER
    }

    async fn connect(&self, properties: &ConnectionProperties) -> Result<Arc<dyn ConnectionPool>> {
        if properties.adapter != ADAPTER {
            return Err(Error::invalid_argument(format!(
                "connection properties name adapter `{}`; expected `{ADAPTER}`",
                properties.adapter
            )));
        }

        tracing::debug!(connection = %properties.connection_key(), "memory pool opened");
        Ok(Arc::new(MemoryPool::new()))
    }
}

/// All tables of one connection, and the sessions sharing them.
#[derive(Debug)]
pub struct MemoryPool {
    store: Arc<Mutex<Store>>,

    /// Domain converters reported for columns, by column type name
    converters: Mutex<HashMap<String, Arc<dyn Converter>>>,

    closed: AtomicBool,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            converters: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::invalid_argument("connection pool is closed"));
        }
        Ok(())
    }

    /// Table metadata with the registered domain converters applied.
    fn with_converters(&self, mut table: Table) -> Table {
        let converters = self.converters.lock().unwrap();

        for column in &mut table.columns {
            if let Some(converter) = converters.get(column.column_type.name()) {
                column.domain_type_converter = Some(converter.clone());
            }
        }

        table
    }
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionPool for MemoryPool {
    fn adapter(&self) -> &'static str {
        ADAPTER
    }

    async fn get_db_session(&self, index: usize) -> Result<Arc<dyn DbSession>> {
        self.check_open()?;
        tracing::trace!(index, "memory session opened");
        Ok(Arc::new(MemorySession::new(index, self.store.clone())))
    }

    async fn get_table_metadata(
        &self,
        database: &str,
        table: &str,
        _session: Option<&dyn DbSession>,
    ) -> Result<Option<Arc<Table>>> {
        self.check_open()?;

        let meta = self
            .store
            .lock()
            .unwrap()
            .table(database, table)
            .map(|stored| stored.meta.clone());

        Ok(meta.map(|meta| Arc::new(self.with_converters(meta))))
    }

    async fn create_table(
        &self,
        mapping: &TableMapping,
        database: &str,
        _session: Option<&dyn DbSession>,
    ) -> Result<()> {
        self.check_open()?;

        let database = mapping.database.as_deref().unwrap_or(database);
        let table = store::table_from_mapping(mapping, database)?;

        let mut store = self.store.lock().unwrap();
        if store.create_table(table) {
            tracing::debug!(table = %format!("{database}.{}", mapping.table), "table created");
        }
        Ok(())
    }

    async fn list_tables(&self, database: &str, _session: Option<&dyn DbSession>) -> Result<Vec<String>> {
        self.check_open()?;
        Ok(self.store.lock().unwrap().table_names(database))
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("memory pool closed");
        }
        Ok(())
    }

    fn register_type_converter(&self, type_name: &str, converter: Option<Arc<dyn Converter>>) {
        let mut converters = self.converters.lock().unwrap();
        match converter {
            Some(converter) => {
                converters.insert(type_name.to_string(), converter);
            }
            None => {
                converters.remove(type_name);
            }
        }
    }
}
