use crate::{
    context::run,
    projection,
    query::Query,
    session_factory::unmapped,
    verb::Verb,
    Batch, Callback, SessionFactory, TableIndicator, Transaction,
};

use keel_core::{
    driver::DbSession,
    handler::Keys,
    mapping::{TableMapping, TypeDescriptor},
    projection::{Projection, ResolvedProjection},
    query::QueryDomainType,
    schema::Table,
    Entity, Error, Object, Promise, Result,
};

use std::{
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// A unit of work against the storage engine: keyed reads and writes,
/// queries, batches and one explicit transaction.
///
/// Every operation returns a [`Promise`] and accepts an optional
/// [`Callback`] that receives the same outcome after the promise settles.
/// Domain types are addressed by type parameter and must be registered in
/// the factory's mappings; the `*_by_name` variants address a table by
/// name and work with dynamic [`Object`]s.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

struct Shared {
    factory: SessionFactory,
    index: usize,
    db_session: Arc<dyn DbSession>,
    transaction: Transaction,
    closed: AtomicBool,

    /// Set when the factory was created for this session alone, which then
    /// closes it too
    owns_factory: bool,
}

impl Session {
    pub(crate) fn new(
        factory: SessionFactory,
        index: usize,
        db_session: Arc<dyn DbSession>,
        owns_factory: bool,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                factory,
                index,
                transaction: Transaction::new(db_session.clone()),
                db_session,
                closed: AtomicBool::new(false),
                owns_factory,
            }),
        }
    }

    pub fn factory(&self) -> &SessionFactory {
        &self.shared.factory
    }

    pub(crate) fn db_session(&self) -> &Arc<dyn DbSession> {
        &self.shared.db_session
    }

    pub fn current_transaction(&self) -> Transaction {
        self.shared.transaction.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// The row of `T` whose unique key is `keys`, or `None`.
    pub fn find<T: Entity + Clone>(
        &self,
        keys: impl Into<Keys>,
        callback: Option<Callback<Option<T>>>,
    ) -> Promise<Option<T>> {
        let keys = keys.into();
        self.typed::<T, _, _, _>("find", callback, move |session, indicator| async move {
            session.perform(indicator, Verb::Find(keys)).await?.into_found()
        })
    }

    pub fn find_by_name(
        &self,
        table: &str,
        keys: impl Into<Keys>,
        callback: Option<Callback<Option<Object>>>,
    ) -> Promise<Option<Object>> {
        let (session, indicator, keys) = (self.clone(), by_name(table), keys.into());
        run("find", callback, async move {
            session.check_open()?;
            session.perform(indicator, Verb::Find(keys)).await?.into_found()
        })
    }

    /// Fills `instance` from the row its key fields identify.
    pub fn load<T: Entity + Clone>(&self, instance: T, callback: Option<Callback<T>>) -> Promise<T> {
        self.instance("load", instance, callback, |session, indicator, instance| async move {
            session.perform(indicator, Verb::Load(instance)).await?.into_entity()
        })
    }

    /// Inserts `instance`. The returned instance carries the generated
    /// auto-increment value, if the table has one.
    pub fn persist<T: Entity + Clone>(&self, instance: T, callback: Option<Callback<T>>) -> Promise<T> {
        self.instance("persist", instance, callback, |session, indicator, instance| async move {
            session.perform(indicator, Verb::Persist(instance)).await?.into_entity()
        })
    }

    pub fn persist_by_name(
        &self,
        table: &str,
        values: Object,
        callback: Option<Callback<Object>>,
    ) -> Promise<Object> {
        let (session, indicator) = (self.clone(), by_name(table));
        run("persist", callback, async move {
            session.check_open()?;
            session
                .perform(indicator, Verb::Persist(Box::new(values)))
                .await?
                .into_entity()
        })
    }

    /// Inserts `instance`, or replaces the row with the same primary key.
    pub fn save<T: Entity + Clone>(&self, instance: T, callback: Option<Callback<()>>) -> Promise<()> {
        self.instance("save", instance, callback, |session, indicator, instance| async move {
            session.perform(indicator, Verb::Save(instance)).await?.into_done()
        })
    }

    pub fn save_by_name(&self, table: &str, values: Object, callback: Option<Callback<()>>) -> Promise<()> {
        let (session, indicator) = (self.clone(), by_name(table));
        run("save", callback, async move {
            session.check_open()?;
            session
                .perform(indicator, Verb::Save(Box::new(values)))
                .await?
                .into_done()
        })
    }

    /// Sets `values` on the row of `T` whose unique key is `keys`. Updating
    /// a row that does not exist fails.
    pub fn update<T: Entity>(
        &self,
        keys: impl Into<Keys>,
        values: Object,
        callback: Option<Callback<()>>,
    ) -> Promise<()> {
        let keys = keys.into();
        self.typed::<T, _, _, _>("update", callback, move |session, indicator| async move {
            session.perform(indicator, Verb::Update(keys, values)).await?.into_done()
        })
    }

    pub fn update_by_name(
        &self,
        table: &str,
        keys: impl Into<Keys>,
        values: Object,
        callback: Option<Callback<()>>,
    ) -> Promise<()> {
        let (session, indicator, keys) = (self.clone(), by_name(table), keys.into());
        run("update", callback, async move {
            session.check_open()?;
            session.perform(indicator, Verb::Update(keys, values)).await?.into_done()
        })
    }

    pub fn remove<T: Entity>(&self, keys: impl Into<Keys>, callback: Option<Callback<()>>) -> Promise<()> {
        let keys = keys.into();
        self.typed::<T, _, _, _>("remove", callback, move |session, indicator| async move {
            session.perform(indicator, Verb::Remove(keys)).await?.into_done()
        })
    }

    pub fn remove_by_name(
        &self,
        table: &str,
        keys: impl Into<Keys>,
        callback: Option<Callback<()>>,
    ) -> Promise<()> {
        let (session, indicator, keys) = (self.clone(), by_name(table), keys.into());
        run("remove", callback, async move {
            session.check_open()?;
            session.perform(indicator, Verb::Remove(keys)).await?.into_done()
        })
    }

    /// Removes the row `instance`'s key fields identify.
    pub fn remove_instance<T: Entity + Clone>(
        &self,
        instance: T,
        callback: Option<Callback<()>>,
    ) -> Promise<()> {
        self.instance("remove", instance, callback, |session, indicator, instance| async move {
            let keys = Keys::from_entity(&*instance);
            session.perform(indicator, Verb::Remove(keys)).await?.into_done()
        })
    }

    pub fn create_query<T: Entity + Clone>(&self, callback: Option<Callback<Query<T>>>) -> Promise<Query<T>> {
        self.typed::<T, _, _, _>("create_query", callback, |session, indicator| async move {
            session.create_query_impl(indicator).await
        })
    }

    pub fn create_query_by_name(
        &self,
        table: &str,
        callback: Option<Callback<Query<Object>>>,
    ) -> Promise<Query<Object>> {
        let (session, indicator) = (self.clone(), by_name(table));
        run("create_query", callback, async move {
            session.check_open()?;
            session.create_query_impl(indicator).await
        })
    }

    async fn create_query_impl<T: Entity + Clone>(&self, indicator: TableIndicator) -> Result<Query<T>> {
        let handler = self
            .factory()
            .table_handler(&indicator, Some(&**self.db_session()))
            .await?;
        Ok(Query::new(self.clone(), QueryDomainType::new(handler)))
    }

    /// A batch whose operations are defined now and executed together.
    pub fn create_batch(&self) -> Batch {
        Batch::new(self.clone())
    }

    pub fn get_table_metadata(
        &self,
        database: &str,
        table: &str,
        callback: Option<Callback<Arc<Table>>>,
    ) -> Promise<Arc<Table>> {
        let session = self.clone();
        let (database, table) = (database.to_string(), table.to_string());
        run("get_table_metadata", callback, async move {
            session.check_open()?;
            session
                .factory()
                .table_metadata_or_err(&database, &table, Some(&**session.db_session()))
                .await
        })
    }

    /// Creates the table `mapping` describes, in the default database when
    /// the mapping names none.
    pub fn create_table(&self, mapping: TableMapping, callback: Option<Callback<()>>) -> Promise<()> {
        let session = self.clone();
        run("create_table", callback, async move {
            session.check_open()?;
            if !mapping.is_valid() {
                return Err(Error::mapping(mapping.error()));
            }
            let factory = session.factory();
            let database = mapping
                .database
                .clone()
                .unwrap_or_else(|| factory.properties().database.clone());
            factory
                .pool()
                .create_table(&mapping, &database, Some(&**session.db_session()))
                .await
        })
    }

    pub fn list_tables(&self, database: &str, callback: Option<Callback<Vec<String>>>) -> Promise<Vec<String>> {
        let session = self.clone();
        let database = database.to_string();
        run("list_tables", callback, async move {
            session.check_open()?;
            session
                .factory()
                .pool()
                .list_tables(&database, Some(&**session.db_session()))
                .await
        })
    }

    pub fn get_mapping<T: 'static>(&self, callback: Option<Callback<TableMapping>>) -> Promise<TableMapping> {
        self.factory().get_mapping::<T>(callback)
    }

    /// Checks `projection` against the registered mappings and the tables'
    /// metadata, and lays out its sectors.
    pub fn validate_projection(
        &self,
        projection: &Projection,
        callback: Option<Callback<Arc<ResolvedProjection>>>,
    ) -> Promise<Arc<ResolvedProjection>> {
        let (session, projection) = (self.clone(), projection.clone());
        run("validate_projection", callback, async move {
            session.check_open()?;
            projection::resolve(&session, &projection).await.map(Arc::new)
        })
    }

    /// Reads the root object of `projection` by unique key, with its
    /// relationships populated as the projection describes.
    pub fn find_with_projection<T: Entity + Clone>(
        &self,
        projection: &Projection,
        keys: impl Into<Keys>,
        callback: Option<Callback<Option<T>>>,
    ) -> Promise<Option<T>> {
        let (session, projection, keys) = (self.clone(), projection.clone(), keys.into());
        run("find_with_projection", callback, async move {
            session.check_open()?;
            if projection.domain_object.type_id != std::any::TypeId::of::<T>() {
                return Err(Error::invalid_argument(format!(
                    "projection of `{}` cannot be read as `{}`",
                    projection.domain_object.type_name,
                    std::any::type_name::<T>()
                )));
            }
            let resolved = Arc::new(projection::resolve(&session, &projection).await?);
            match projection::find(&session, &resolved, &keys).await? {
                Some(entity) => entity.downcast().map(Some),
                None => Ok(None),
            }
        })
    }

    /// Closes the storage session. Closing twice is a no-op.
    pub fn close(&self, callback: Option<Callback<()>>) -> Promise<()> {
        let session = self.clone();
        run("close_session", callback, async move {
            if session.shared.closed.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            session.factory().release_slot(session.shared.index);
            let closed = session.db_session().close().await;
            tracing::debug!(index = session.shared.index, "session closed");

            if session.shared.owns_factory {
                session.factory().close(None).await?;
            }
            closed
        })
    }

    pub(crate) fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::invalid_argument("session is closed"));
        }
        Ok(())
    }

    pub(crate) fn descriptor_for<T: 'static>(&self) -> Result<Arc<TypeDescriptor>> {
        self.factory()
            .mappings()
            .get::<T>()
            .cloned()
            .ok_or_else(|| unmapped(std::any::type_name::<T>()))
    }

    /// Runs an operation addressed by type. An unmapped type fails the
    /// operation's promise.
    fn typed<T, U, F, Fut>(
        &self,
        operation: &'static str,
        callback: Option<Callback<U>>,
        task: F,
    ) -> Promise<U>
    where
        T: 'static,
        U: Clone + Send + 'static,
        F: FnOnce(Session, TableIndicator) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U>> + Send + 'static,
    {
        let (session, descriptor) = (self.clone(), self.descriptor_for::<T>());
        run(operation, callback, async move {
            session.check_open()?;
            task(session, TableIndicator::ByType(descriptor?)).await
        })
    }

    /// Runs an operation addressed by a domain object.
    fn instance<T, U, F, Fut>(
        &self,
        operation: &'static str,
        instance: T,
        callback: Option<Callback<U>>,
        task: F,
    ) -> Promise<U>
    where
        T: Entity + Clone,
        U: Clone + Send + 'static,
        F: FnOnce(Session, TableIndicator, Box<dyn Entity>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U>> + Send + 'static,
    {
        let (session, descriptor) = (self.clone(), self.descriptor_for::<T>());
        run(operation, callback, async move {
            session.check_open()?;
            let instance: Box<dyn Entity> = Box::new(instance);
            let indicator = TableIndicator::ByInstance(descriptor?, instance.clone());
            task(session, indicator, instance).await
        })
    }
}

fn by_name(table: &str) -> TableIndicator {
    TableIndicator::ByName(table.to_string())
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("index", &self.shared.index)
            .field("transaction", &self.shared.transaction)
            .field("closed", &self.is_closed())
            .finish()
    }
}
