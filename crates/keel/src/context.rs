use keel_core::{mapping::TypeDescriptor, Entity, Promise, Result};

use std::{future::Future, sync::Arc};

/// Completion callback accepted as the last argument of every asynchronous
/// operation. It runs after the operation's promise settles, with the same
/// outcome. Extra caller state travels in the closure.
pub type Callback<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

/// The table an operation addresses.
#[derive(Debug, Clone)]
pub enum TableIndicator {
    /// A table name, optionally qualified as `database.table`, read and
    /// written as dynamic objects.
    ByName(String),

    /// A registered domain type.
    ByType(Arc<TypeDescriptor>),

    /// An instance of a registered domain type.
    ByInstance(Arc<TypeDescriptor>, Box<dyn Entity>),
}

impl TableIndicator {
    pub fn descriptor(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            Self::ByName(_) => None,
            Self::ByType(descriptor) | Self::ByInstance(descriptor, _) => Some(descriptor),
        }
    }
}

/// Carries one call from its arguments to its single exit point: the
/// operation's promise and the optional user callback.
pub(crate) struct UserContext<T> {
    operation: &'static str,
    promise: Promise<T>,
    callback: Option<Callback<T>>,
}

impl<T: Clone + Send + 'static> UserContext<T> {
    pub(crate) fn new(operation: &'static str, callback: Option<Callback<T>>) -> Self {
        Self {
            operation,
            promise: Promise::new(),
            callback,
        }
    }

    pub(crate) fn promise(&self) -> Promise<T> {
        self.promise.clone()
    }

    /// Settles the promise, then hands the same outcome to the callback.
    pub(crate) fn apply_callback(self, result: Result<T>) {
        if let Err(err) = &result {
            tracing::debug!(operation = self.operation, %err, "operation failed");
        }

        self.promise.settle(result.clone());

        if let Some(callback) = self.callback {
            callback(result);
        }
    }

    /// Runs `task` on its own task and completes the context with its
    /// output. The outcome is never observed before this returns.
    pub(crate) fn spawn<F>(self, task: F) -> Promise<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let promise = self.promise();
        tokio::spawn(async move {
            let result = task.await;
            self.apply_callback(result);
        });
        promise
    }
}

/// Shorthand for `UserContext::new(operation, callback).spawn(task)`.
pub(crate) fn run<T, F>(operation: &'static str, callback: Option<Callback<T>>, task: F) -> Promise<T>
where
    T: Clone + Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    UserContext::new(operation, callback).spawn(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::Error;

    use std::sync::Mutex;

    #[tokio::test]
    async fn callback_sees_the_settled_promise() {
        let promise_seen = Arc::new(Mutex::new(None));

        let cx = UserContext::new("test", None);
        let promise = cx.promise();

        let observed = promise_seen.clone();
        let inner = promise.clone();
        let cx = UserContext {
            callback: Some(Box::new(move |result: Result<i32>| {
                *observed.lock().unwrap() = Some((inner.is_resolved(), result.unwrap()));
            })),
            ..cx
        };

        cx.apply_callback(Ok(3));
        assert_eq!(*promise_seen.lock().unwrap(), Some((true, 3)));
        assert_eq!(promise.await.unwrap(), 3);
    }

    #[tokio::test]
    async fn errors_reach_promise_and_callback() {
        let (tx, rx) = tokio::sync::oneshot::channel();

        let promise = run::<(), _>(
            "test",
            Some(Box::new(move |result: Result<()>| {
                let _ = tx.send(result);
            })),
            async { Err(Error::batch_cleared()) },
        );

        assert!(promise.await.unwrap_err().is_batch_cleared());
        assert!(rx.await.unwrap().unwrap_err().is_batch_cleared());
    }
}
