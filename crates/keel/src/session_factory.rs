use crate::{connections, context, Callback, Session, TableIndicator};

use keel_core::{
    driver::{ConnectionPool, ConnectionProperties, DbSession},
    handler::TableHandler,
    mapping::{Converter, MappingId, Mappings, TableMapping},
    schema::Table,
    Error, Promise, Result,
};

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

/// Opens sessions against one connection pool and caches what they share:
/// table metadata and table handlers.
///
/// Cloning is cheap; clones refer to the same factory.
#[derive(Clone)]
pub struct SessionFactory {
    shared: Arc<Shared>,
}

struct Shared {
    properties: ConnectionProperties,
    mappings: Mappings,
    pool: Arc<dyn ConnectionPool>,

    /// Open storage sessions by slot; closed slots are reused.
    sessions: Mutex<Vec<Option<Arc<dyn DbSession>>>>,

    /// Handlers for tables addressed by name, by qualified table name
    named_handlers: Mutex<HashMap<String, Arc<TableHandler>>>,

    /// Handlers for registered types
    mapped_handlers: Mutex<HashMap<MappingId, Arc<TableHandler>>>,

    /// Metadata by qualified table name
    metadata: Mutex<HashMap<String, Arc<Table>>>,

    closed: AtomicBool,
}

impl SessionFactory {
    pub(crate) async fn connect(properties: ConnectionProperties, mappings: Mappings) -> Result<Self> {
        let pool = connections::acquire(&properties).await?;

        tracing::debug!(
            key = %properties.connection_key(),
            database = %properties.database,
            mappings = mappings.len(),
            "session factory created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                properties,
                mappings,
                pool,
                sessions: Mutex::new(vec![]),
                named_handlers: Mutex::new(HashMap::new()),
                mapped_handlers: Mutex::new(HashMap::new()),
                metadata: Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
            }),
        })
    }

    pub fn properties(&self) -> &ConnectionProperties {
        &self.shared.properties
    }

    pub fn mappings(&self) -> &Mappings {
        &self.shared.mappings
    }

    pub(crate) fn pool(&self) -> &Arc<dyn ConnectionPool> {
        &self.shared.pool
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn open_session(&self, callback: Option<Callback<Session>>) -> Promise<Session> {
        let factory = self.clone();
        context::run("open_session", callback, async move {
            factory.open_session_impl(false).await
        })
    }

    /// Opens a session in a free slot. An owning session closes this
    /// factory when it closes.
    pub(crate) async fn open_session_impl(&self, owns_factory: bool) -> Result<Session> {
        self.check_open()?;

        let index = {
            let mut sessions = self.shared.sessions.lock().unwrap();
            match sessions.iter().position(Option::is_none) {
                Some(index) => index,
                None => {
                    sessions.push(None);
                    sessions.len() - 1
                }
            }
        };

        let db_session = match self.shared.pool.get_db_session(index).await {
            Ok(db_session) => db_session,
            Err(err) => {
                self.release_slot(index);
                return Err(err);
            }
        };

        self.shared.sessions.lock().unwrap()[index] = Some(db_session.clone());
        tracing::debug!(index, "session opened");

        Ok(Session::new(self.clone(), index, db_session, owns_factory))
    }

    pub(crate) fn release_slot(&self, index: usize) {
        let mut sessions = self.shared.sessions.lock().unwrap();
        if let Some(slot) = sessions.get_mut(index) {
            *slot = None;
        }
    }

    /// Number of sessions currently open on this factory.
    pub fn open_session_count(&self) -> usize {
        self.shared
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    /// Closes every open session and releases the connection pool.
    pub fn close(&self, callback: Option<Callback<()>>) -> Promise<()> {
        let factory = self.clone();
        context::run("close_factory", callback, async move {
            if factory.shared.closed.swap(true, Ordering::SeqCst) {
                return Ok(());
            }

            let sessions: Vec<_> = std::mem::take(&mut *factory.shared.sessions.lock().unwrap());
            let first_err = close_sessions(sessions.into_iter().flatten()).await;

            // The pool is released even when a session failed to close
            let released = connections::release(&factory.shared.properties.connection_key()).await;
            tracing::debug!("session factory closed");

            match first_err {
                Some(err) => Err(err),
                None => released,
            }
        })
    }

    pub fn get_table_metadata(
        &self,
        database: &str,
        table: &str,
        callback: Option<Callback<Arc<Table>>>,
    ) -> Promise<Arc<Table>> {
        let factory = self.clone();
        let (database, table) = (database.to_string(), table.to_string());
        context::run("get_table_metadata", callback, async move {
            factory.table_metadata_or_err(&database, &table, None).await
        })
    }

    /// Sets the converter applied to every column of `type_name`, such as
    /// `"varchar"` or `"json"`, in tables whose metadata is fetched from now
    /// on. Cached metadata and handlers are dropped.
    pub fn register_type_converter(&self, type_name: &str, converter: Option<Arc<dyn Converter>>) {
        self.shared.pool.register_type_converter(type_name, converter);
        self.shared.metadata.lock().unwrap().clear();
        self.shared.named_handlers.lock().unwrap().clear();
        self.shared.mapped_handlers.lock().unwrap().clear();
    }

    /// The mapping the handler of `T` resolved: declared fields plus the
    /// stubs synthesized for unmapped columns.
    pub fn get_mapping<T: 'static>(&self, callback: Option<Callback<TableMapping>>) -> Promise<TableMapping> {
        let indicator = self.indicator_for::<T>();
        let factory = self.clone();
        context::run("get_mapping", callback, async move {
            let handler = factory.table_handler(&indicator?, None).await?;
            Ok(handler.resolved_mapping().clone())
        })
    }

    pub fn get_mapping_by_name(
        &self,
        table: &str,
        callback: Option<Callback<TableMapping>>,
    ) -> Promise<TableMapping> {
        let indicator = TableIndicator::ByName(table.to_string());
        let factory = self.clone();
        context::run("get_mapping", callback, async move {
            let handler = factory.table_handler(&indicator, None).await?;
            Ok(handler.resolved_mapping().clone())
        })
    }

    pub(crate) fn indicator_for<T: 'static>(&self) -> Result<TableIndicator> {
        match self.shared.mappings.get::<T>() {
            Some(descriptor) => Ok(TableIndicator::ByType(descriptor.clone())),
            None => Err(unmapped(std::any::type_name::<T>())),
        }
    }

    /// Splits `database.table`, defaulting the database.
    pub(crate) fn qualify<'a>(&'a self, name: &'a str) -> (&'a str, &'a str) {
        match name.split_once('.') {
            Some((database, table)) => (database, table),
            None => (&self.shared.properties.database, name),
        }
    }

    pub(crate) async fn table_metadata(
        &self,
        database: &str,
        table: &str,
        session: Option<&dyn DbSession>,
    ) -> Result<Option<Arc<Table>>> {
        let key = format!("{database}.{table}");

        if let Some(metadata) = self.shared.metadata.lock().unwrap().get(&key) {
            return Ok(Some(metadata.clone()));
        }

        let Some(metadata) = self.shared.pool.get_table_metadata(database, table, session).await? else {
            return Ok(None);
        };

        let mut cache = self.shared.metadata.lock().unwrap();
        Ok(Some(cache.entry(key).or_insert(metadata).clone()))
    }

    pub(crate) async fn table_metadata_or_err(
        &self,
        database: &str,
        table: &str,
        session: Option<&dyn DbSession>,
    ) -> Result<Arc<Table>> {
        self.table_metadata(database, table, session)
            .await?
            .ok_or_else(|| Error::not_found(format!("table {database}.{table}")))
    }

    /// The handler for the indicated table, built on first use.
    ///
    /// A registered type whose table does not exist gets the table created
    /// from its mapping. Concurrent first uses may each build a handler; the
    /// first one cached is kept. A handler whose mapping does not fit the
    /// table is cached too, and reported as an error every time it is used.
    pub(crate) async fn table_handler(
        &self,
        indicator: &TableIndicator,
        session: Option<&dyn DbSession>,
    ) -> Result<Arc<TableHandler>> {
        self.check_open()?;

        let handler = match indicator {
            TableIndicator::ByName(name) => self.named_handler(name, session).await?,
            TableIndicator::ByType(descriptor) | TableIndicator::ByInstance(descriptor, _) => {
                self.mapped_handler(descriptor, session).await?
            }
        };

        match handler.err() {
            Some(err) => Err(err),
            None => Ok(handler),
        }
    }

    async fn named_handler(&self, name: &str, session: Option<&dyn DbSession>) -> Result<Arc<TableHandler>> {
        let (database, table) = self.qualify(name);
        let key = format!("{database}.{table}");

        if let Some(handler) = self.shared.named_handlers.lock().unwrap().get(&key) {
            return Ok(handler.clone());
        }

        let metadata = self.table_metadata_or_err(database, table, session).await?;
        let handler = Arc::new(TableHandler::new(metadata, None, None));
        tracing::debug!(table = %key, "table handler created");

        let mut cache = self.shared.named_handlers.lock().unwrap();
        Ok(cache.entry(key).or_insert(handler).clone())
    }

    async fn mapped_handler(
        &self,
        descriptor: &Arc<keel_core::mapping::TypeDescriptor>,
        session: Option<&dyn DbSession>,
    ) -> Result<Arc<TableHandler>> {
        if let Some(handler) = self.shared.mapped_handlers.lock().unwrap().get(&descriptor.id) {
            return Ok(handler.clone());
        }

        let mapping = &descriptor.mapping;
        let database = mapping
            .database
            .as_deref()
            .unwrap_or(&self.shared.properties.database);

        let metadata = match self.table_metadata(database, &mapping.table, session).await? {
            Some(metadata) => metadata,
            None => {
                tracing::debug!(
                    table = %format!("{database}.{}", mapping.table),
                    type_name = descriptor.type_name,
                    "creating table from mapping"
                );
                self.shared.pool.create_table(mapping, database, session).await?;
                self.table_metadata_or_err(database, &mapping.table, session).await?
            }
        };

        let handler = Arc::new(TableHandler::new(metadata, None, Some(descriptor.clone())));
        tracing::debug!(
            table = %handler.table().qualified_name(),
            type_name = descriptor.type_name,
            valid = handler.is_valid(),
            "table handler created"
        );

        let mut cache = self.shared.mapped_handlers.lock().unwrap();
        Ok(cache.entry(descriptor.id).or_insert(handler).clone())
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::invalid_argument("session factory is closed"));
        }
        Ok(())
    }
}

pub(crate) fn unmapped(type_name: &str) -> Error {
    Error::invalid_argument(format!("`{type_name}` is not mapped"))
}

/// Closes every session, returning the first failure.
async fn close_sessions(sessions: impl IntoIterator<Item = Arc<dyn DbSession>>) -> Option<Error> {
    let mut first_err = None;
    for db_session in sessions {
        if let Err(err) = db_session.close().await {
            tracing::debug!(error = %err, "session close failed");
            first_err.get_or_insert(err);
        }
    }
    first_err
}

impl fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionFactory")
            .field("connection", &self.shared.properties.connection_key())
            .field("database", &self.shared.properties.database)
            .field("mappings", &self.shared.mappings.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::{async_trait, driver::TransactionHandler};

    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct ClosingSession {
        closes: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl DbSession for ClosingSession {
        async fn begin(&self) -> Result<()> {
            Ok(())
        }

        async fn commit(&self) -> Result<()> {
            Ok(())
        }

        async fn rollback(&self) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::operation_failed(Some("08S01"), "connection lost", None));
            }
            Ok(())
        }

        fn transaction_handler(&self) -> Arc<dyn TransactionHandler> {
            unreachable!("close tests build no operations")
        }
    }

    #[tokio::test]
    async fn failed_close_does_not_stop_the_others() {
        let closes = Arc::new(AtomicUsize::new(0));
        let sessions: Vec<Arc<dyn DbSession>> = [false, true, false, true]
            .into_iter()
            .map(|fail| {
                Arc::new(ClosingSession {
                    closes: closes.clone(),
                    fail,
                }) as Arc<dyn DbSession>
            })
            .collect();

        let err = close_sessions(sessions).await.unwrap();
        assert_eq!(err.sqlstate(), Some("08S01"));
        assert_eq!(closes.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn clean_close_reports_nothing() {
        let closes = Arc::new(AtomicUsize::new(0));
        let session: Arc<dyn DbSession> = Arc::new(ClosingSession {
            closes: closes.clone(),
            fail: false,
        });

        assert!(close_sessions([session]).await.is_none());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
