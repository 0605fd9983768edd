use crate::{
    context::{run, UserContext},
    session_factory::unmapped,
    verb::{Finish, Reply, Verb},
    Callback, Session, TableIndicator,
};

use keel_core::{
    driver::{Operation, OperationResult},
    handler::Keys,
    Entity, Error, Object, Promise, Result,
};

use std::{
    fmt,
    sync::{Arc, Mutex},
};
use tokio::sync::Notify;

/// Operations defined now and executed together by [`Batch::execute`].
///
/// Each verb returns a promise that settles when the batch executes, or
/// when it is cleared first.
#[derive(Clone)]
pub struct Batch {
    shared: Arc<Shared>,
}

struct Shared {
    session: Session,
    entries: Mutex<Vec<Arc<Mutex<Entry>>>>,

    /// Wakes every waiting `execute` whenever an entry leaves `Pending`
    defined: Notify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for the table handler and the operation to be built
    Pending,

    /// Ready to execute
    Defined,

    /// Completed, by execution or by a failure to build
    Executed,

    /// Failed by `clear`
    Cleared,
}

type Complete = Box<dyn FnOnce(Result<Reply>) + Send>;

struct Entry {
    state: State,
    operation: Option<Operation>,
    finish: Option<Finish>,
    complete: Option<Complete>,
}

impl Entry {
    /// Takes the completion, so each entry completes exactly once.
    fn take_complete(&mut self, state: State) -> Option<Complete> {
        self.state = state;
        self.complete.take()
    }
}

impl Batch {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            shared: Arc::new(Shared {
                session,
                entries: Mutex::new(vec![]),
                defined: Notify::new(),
            }),
        }
    }

    pub fn session(&self) -> &Session {
        &self.shared.session
    }

    pub fn find<T: Entity + Clone>(
        &self,
        keys: impl Into<Keys>,
        callback: Option<Callback<Option<T>>>,
    ) -> Promise<Option<T>> {
        let indicator = self.indicator_for::<T>();
        self.define("find", indicator, Verb::Find(keys.into()), callback, Reply::into_found)
    }

    pub fn find_by_name(
        &self,
        table: &str,
        keys: impl Into<Keys>,
        callback: Option<Callback<Option<Object>>>,
    ) -> Promise<Option<Object>> {
        let indicator = Ok(TableIndicator::ByName(table.to_string()));
        self.define("find", indicator, Verb::Find(keys.into()), callback, Reply::into_found)
    }

    pub fn load<T: Entity + Clone>(&self, instance: T, callback: Option<Callback<T>>) -> Promise<T> {
        let (indicator, instance) = self.instance_indicator(instance);
        self.define("load", indicator, Verb::Load(instance), callback, Reply::into_entity)
    }

    pub fn persist<T: Entity + Clone>(&self, instance: T, callback: Option<Callback<T>>) -> Promise<T> {
        let (indicator, instance) = self.instance_indicator(instance);
        self.define("persist", indicator, Verb::Persist(instance), callback, Reply::into_entity)
    }

    pub fn persist_by_name(
        &self,
        table: &str,
        values: Object,
        callback: Option<Callback<Object>>,
    ) -> Promise<Object> {
        let indicator = Ok(TableIndicator::ByName(table.to_string()));
        let verb = Verb::Persist(Box::new(values));
        self.define("persist", indicator, verb, callback, Reply::into_entity)
    }

    pub fn save<T: Entity + Clone>(&self, instance: T, callback: Option<Callback<()>>) -> Promise<()> {
        let (indicator, instance) = self.instance_indicator(instance);
        self.define("save", indicator, Verb::Save(instance), callback, Reply::into_done)
    }

    pub fn update<T: Entity>(
        &self,
        keys: impl Into<Keys>,
        values: Object,
        callback: Option<Callback<()>>,
    ) -> Promise<()> {
        let indicator = self.indicator_for::<T>();
        let verb = Verb::Update(keys.into(), values);
        self.define("update", indicator, verb, callback, Reply::into_done)
    }

    pub fn update_by_name(
        &self,
        table: &str,
        keys: impl Into<Keys>,
        values: Object,
        callback: Option<Callback<()>>,
    ) -> Promise<()> {
        let indicator = Ok(TableIndicator::ByName(table.to_string()));
        let verb = Verb::Update(keys.into(), values);
        self.define("update", indicator, verb, callback, Reply::into_done)
    }

    pub fn remove<T: Entity>(&self, keys: impl Into<Keys>, callback: Option<Callback<()>>) -> Promise<()> {
        let indicator = self.indicator_for::<T>();
        self.define("remove", indicator, Verb::Remove(keys.into()), callback, Reply::into_done)
    }

    pub fn remove_by_name(
        &self,
        table: &str,
        keys: impl Into<Keys>,
        callback: Option<Callback<()>>,
    ) -> Promise<()> {
        let indicator = Ok(TableIndicator::ByName(table.to_string()));
        self.define("remove", indicator, Verb::Remove(keys.into()), callback, Reply::into_done)
    }

    /// Number of operations queued and not yet executed or cleared.
    pub fn get_operation_count(&self) -> usize {
        self.shared.entries.lock().unwrap().len()
    }

    /// Fails every queued operation with "Batch was cleared" and empties
    /// the queue. Callbacks run before this returns. Operations whose
    /// table is still being resolved are dropped when resolution finishes.
    pub fn clear(&self) {
        let entries = std::mem::take(&mut *self.shared.entries.lock().unwrap());
        tracing::debug!(operations = entries.len(), "batch cleared");

        for entry in entries {
            let complete = {
                let mut entry = entry.lock().unwrap();
                match entry.state {
                    State::Pending | State::Defined => entry.take_complete(State::Cleared),
                    State::Executed | State::Cleared => None,
                }
            };

            if let Some(complete) = complete {
                complete(Err(Error::batch_cleared()));
            }
        }

        self.shared.defined.notify_waiters();
    }

    /// Waits until every queued operation is built, then executes them in
    /// queue order with a single storage call. An empty batch completes
    /// without touching storage.
    pub fn execute(&self, callback: Option<Callback<()>>) -> Promise<()> {
        let batch = self.clone();
        run("execute_batch", callback, async move { batch.execute_impl().await })
    }

    async fn execute_impl(&self) -> Result<()> {
        self.shared.session.check_open()?;

        let entries = loop {
            // Registered before the check so a wakeup in between is not lost
            let notified = self.shared.defined.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut entries = self.shared.entries.lock().unwrap();
                let pending = entries
                    .iter()
                    .any(|entry| entry.lock().unwrap().state == State::Pending);
                if !pending {
                    break std::mem::take(&mut *entries);
                }
            }
            notified.await;
        };

        let mut operations = vec![];
        let mut completions = vec![];

        for entry in &entries {
            let mut entry = entry.lock().unwrap();
            if entry.state != State::Defined {
                continue;
            }
            if let (Some(operation), Some(finish)) = (entry.operation.take(), entry.finish.take()) {
                operations.push(operation);
                completions.push((finish, entry.take_complete(State::Executed)));
            }
        }

        if operations.is_empty() {
            tracing::debug!("empty batch executed");
            return Ok(());
        }

        tracing::debug!(operations = operations.len(), "executing batch");

        let session = &self.shared.session;
        let transaction = session.current_transaction();
        let th = session.db_session().transaction_handler();

        let results = th.execute(&operations).await.and_then(|results| {
            if results.len() == operations.len() {
                Ok(results)
            } else {
                Err(Error::invalid_argument(format!(
                    "storage returned {} results for {} operations",
                    results.len(),
                    operations.len()
                )))
            }
        });

        let (results, outcome): (Vec<Result<OperationResult>>, _) = match results {
            Ok(results) => (results.into_iter().map(Ok).collect(), Ok(())),
            Err(err) => {
                transaction.on_operation_failed(&err);
                (completions.iter().map(|_| Err(err.clone())).collect(), Err(err))
            }
        };

        for ((finish, complete), result) in completions.into_iter().zip(results) {
            let reply = result.and_then(|result| finish.apply(result));
            if let Err(err) = &reply {
                transaction.on_operation_failed(err);
            }
            if let Some(complete) = complete {
                complete(reply);
            }
        }

        outcome
    }

    fn indicator_for<T: 'static>(&self) -> Result<TableIndicator> {
        match self.shared.session.factory().mappings().get::<T>() {
            Some(descriptor) => Ok(TableIndicator::ByType(descriptor.clone())),
            None => Err(unmapped(std::any::type_name::<T>())),
        }
    }

    fn instance_indicator<T: Entity + Clone>(&self, instance: T) -> (Result<TableIndicator>, Box<dyn Entity>) {
        let instance: Box<dyn Entity> = Box::new(instance);
        let indicator = match self.shared.session.factory().mappings().get::<T>() {
            Some(descriptor) => Ok(TableIndicator::ByInstance(descriptor.clone(), instance.clone())),
            None => Err(unmapped(std::any::type_name::<T>())),
        };
        (indicator, instance)
    }

    /// Queues an operation and starts building it.
    fn define<U>(
        &self,
        operation: &'static str,
        indicator: Result<TableIndicator>,
        verb: Verb,
        callback: Option<Callback<U>>,
        reply: fn(Reply) -> Result<U>,
    ) -> Promise<U>
    where
        U: Clone + Send + 'static,
    {
        let cx = UserContext::new(operation, callback);
        let promise = cx.promise();

        let entry = Arc::new(Mutex::new(Entry {
            state: State::Pending,
            operation: None,
            finish: None,
            complete: Some(Box::new(move |result: Result<Reply>| {
                cx.apply_callback(result.and_then(reply));
            })),
        }));

        self.shared.entries.lock().unwrap().push(entry.clone());

        let batch = self.clone();
        tokio::spawn(async move {
            let built = match indicator {
                Ok(indicator) => batch.shared.session.build(indicator, verb).await,
                Err(err) => Err(err),
            };

            let complete = {
                let mut entry = entry.lock().unwrap();
                match (entry.state, built) {
                    (State::Pending, Ok(built)) => {
                        entry.operation = Some(built.operation);
                        entry.finish = Some(built.finish);
                        entry.state = State::Defined;
                        None
                    }
                    (State::Pending, Err(err)) => entry.take_complete(State::Executed).map(|c| (c, err)),
                    _ => None,
                }
            };

            if let Some((complete, err)) = complete {
                complete(Err(err));
            }

            batch.shared.defined.notify_waiters();
        });

        promise
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("operations", &self.get_operation_count())
            .finish()
    }
}
