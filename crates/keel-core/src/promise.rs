//! A settle-once promise that is also a [`Future`].
//!
//! Handlers attached with [`Promise::then`] and friends always run on a
//! spawned task, never inside the call that attaches them or the call that
//! settles the promise. A handler may return a value or another promise,
//! which the chained promise then adopts. Settling a promise twice is a bug
//! and panics.
//!
//! Settling a promise that has handlers attached, and attaching a handler to
//! a settled promise, must happen within a Tokio runtime.

use crate::{Error, Result};

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll, Waker},
};

type Handler<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

pub struct Promise<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

struct Shared<T> {
    outcome: Option<Result<T>>,
    handlers: Vec<Handler<T>>,
    wakers: Vec<Waker>,
}

/// What a `then` handler hands to the chained promise.
pub enum Next<T> {
    Value(T),

    /// Adopt the eventual outcome of another promise.
    Promise(Promise<T>),
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// A pending promise.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                outcome: None,
                handlers: vec![],
                wakers: vec![],
            })),
        }
    }

    pub fn fulfilled(value: T) -> Self {
        let promise = Self::new();
        promise.fulfill(value);
        promise
    }

    pub fn rejected(error: Error) -> Self {
        let promise = Self::new();
        promise.reject(error);
        promise
    }

    /// # Panics
    ///
    /// If the promise is already settled.
    pub fn fulfill(&self, value: T) {
        self.settle(Ok(value));
    }

    /// # Panics
    ///
    /// If the promise is already settled.
    pub fn reject(&self, error: Error) {
        self.settle(Err(error));
    }

    /// Fulfills or rejects with `outcome`.
    ///
    /// # Panics
    ///
    /// If the promise is already settled.
    pub fn settle(&self, outcome: Result<T>) {
        let (handlers, wakers) = {
            let mut shared = self.shared.lock().unwrap();
            assert!(shared.outcome.is_none(), "promise settled twice");
            shared.outcome = Some(outcome.clone());
            (
                std::mem::take(&mut shared.handlers),
                std::mem::take(&mut shared.wakers),
            )
        };

        for handler in handlers {
            let outcome = outcome.clone();
            tokio::spawn(async move { handler(outcome) });
        }

        for waker in wakers {
            waker.wake();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.shared.lock().unwrap().outcome.is_none()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.shared.lock().unwrap().outcome, Some(Ok(_)))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.shared.lock().unwrap().outcome, Some(Err(_)))
    }

    /// Chains a handler for the fulfilled value. A rejection passes through
    /// to the returned promise unchanged.
    pub fn then<U, F>(&self, on_fulfilled: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<Next<U>> + Send + 'static,
    {
        self.then_else(on_fulfilled, Err)
    }

    /// Chains a handler for the rejection. A fulfilled value passes through.
    pub fn catch<R>(&self, on_rejected: R) -> Promise<T>
    where
        R: FnOnce(Error) -> Result<Next<T>> + Send + 'static,
    {
        self.then_else(|value| Ok(Next::Value(value)), on_rejected)
    }

    /// Chains one handler per outcome. The returned promise settles with
    /// what the handler that ran returns: its value, the outcome of the
    /// promise it returns, or its error.
    pub fn then_else<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<Next<U>> + Send + 'static,
        R: FnOnce(Error) -> Result<Next<U>> + Send + 'static,
    {
        let chained = Promise::new();
        let target = chained.clone();

        self.subscribe(Box::new(move |outcome: Result<T>| {
            let next = match outcome {
                Ok(value) => on_fulfilled(value),
                Err(error) => on_rejected(error),
            };
            target.resolve(next);
        }));

        chained
    }

    fn resolve(&self, next: Result<Next<T>>) {
        match next {
            Ok(Next::Value(value)) => self.fulfill(value),
            Ok(Next::Promise(promise)) if Arc::ptr_eq(&promise.shared, &self.shared) => {
                self.reject(Error::invalid_argument("a promise cannot adopt itself"))
            }
            Ok(Next::Promise(promise)) => {
                let target = self.clone();
                promise.subscribe(Box::new(move |outcome: Result<T>| target.settle(outcome)));
            }
            Err(error) => self.reject(error),
        }
    }

    fn subscribe(&self, handler: Handler<T>) {
        let mut shared = self.shared.lock().unwrap();
        match &shared.outcome {
            Some(outcome) => {
                let outcome = outcome.clone();
                drop(shared);
                tokio::spawn(async move { handler(outcome) });
            }
            None => shared.handlers.push(handler),
        }
    }
}

impl<T: Clone + Send + 'static> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.shared.lock().unwrap().outcome {
            None => "pending",
            Some(Ok(_)) => "fulfilled",
            Some(Err(_)) => "rejected",
        };
        f.debug_struct("Promise").field("state", &state).finish()
    }
}

impl<T: Clone + Send + 'static> Future for Promise<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut shared = self.shared.lock().unwrap();
        match &shared.outcome {
            Some(outcome) => Poll::Ready(outcome.clone()),
            None => {
                if !shared.wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
                    shared.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl<T> From<Promise<T>> for Next<T> {
    fn from(promise: Promise<T>) -> Self {
        Self::Promise(promise)
    }
}
