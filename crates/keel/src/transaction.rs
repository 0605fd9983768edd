use crate::{context, Callback};

use keel_core::{driver::DbSession, Error, Promise, Result};

use std::{
    fmt,
    sync::{Arc, Mutex},
};

/// The explicit transaction of one session.
///
/// State changes happen when an operation is called, so a second call made
/// while the storage round trip is in flight sees the new state. If the
/// storage call fails the state is put back. Calls that are illegal in the
/// current state leave it unchanged and fail their promise with SQLSTATE
/// `25000`.
///
/// | state        | begin  | commit | rollback | set_rollback_only |
/// |--------------|--------|--------|----------|-------------------|
/// | Idle         | Active | error  | error    | error             |
/// | Active       | error  | Idle   | Idle     | RollbackOnly      |
/// | RollbackOnly | error  | error  | Idle     | RollbackOnly      |
#[derive(Clone)]
pub struct Transaction {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<TransactionState>,
    db_session: Arc<dyn DbSession>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    Active,
    RollbackOnly,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Begin,
    Commit,
    Rollback,
}

impl TransactionState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Active => "Active",
            Self::RollbackOnly => "RollbackOnly",
        }
    }

    fn transition(self, action: Action) -> Result<Self> {
        use Action::*;
        use TransactionState::*;

        match (self, action) {
            (Idle, Begin) => Ok(Active),
            (Active, Commit) | (Active, Rollback) | (RollbackOnly, Rollback) => Ok(Idle),
            (state, action) => Err(Error::illegal_state(state.name(), action.name())),
        }
    }
}

impl Action {
    fn name(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
        }
    }
}

impl Transaction {
    pub(crate) fn new(db_session: Arc<dyn DbSession>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(TransactionState::Idle),
                db_session,
            }),
        }
    }

    pub fn state(&self) -> TransactionState {
        *self.shared.state.lock().unwrap()
    }

    /// True between a successful `begin` and the matching `commit` or
    /// `rollback`, including while rollback-only.
    pub fn is_active(&self) -> bool {
        self.state() != TransactionState::Idle
    }

    pub fn get_rollback_only(&self) -> bool {
        self.state() == TransactionState::RollbackOnly
    }

    pub fn set_rollback_only(&self) -> Result<()> {
        let mut state = self.shared.state.lock().unwrap();
        match *state {
            TransactionState::Idle => Err(Error::illegal_state("Idle", "setRollbackOnly")),
            _ => {
                *state = TransactionState::RollbackOnly;
                tracing::debug!("transaction marked rollback-only");
                Ok(())
            }
        }
    }

    pub fn begin(&self, callback: Option<Callback<()>>) -> Promise<()> {
        self.run(Action::Begin, callback)
    }

    pub fn commit(&self, callback: Option<Callback<()>>) -> Promise<()> {
        self.run(Action::Commit, callback)
    }

    pub fn rollback(&self, callback: Option<Callback<()>>) -> Promise<()> {
        self.run(Action::Rollback, callback)
    }

    /// Marks an active transaction rollback-only after a failed operation.
    pub(crate) fn on_operation_failed(&self, err: &Error) {
        if err.is_operation_failed() && self.is_active() {
            // Active or already rollback-only, so this cannot fail.
            let _ = self.set_rollback_only();
        }
    }

    fn run(&self, action: Action, callback: Option<Callback<()>>) -> Promise<()> {
        let transition = {
            let mut state = self.shared.state.lock().unwrap();
            let from = *state;
            from.transition(action).map(|to| {
                *state = to;
                tracing::debug!(from = from.name(), to = to.name(), "transaction {}", action.name());
                (from, to)
            })
        };

        let transaction = self.clone();
        context::run(action.name(), callback, async move {
            let (from, to) = transition?;
            let db_session = &transaction.shared.db_session;

            let result = match action {
                Action::Begin => db_session.begin().await,
                Action::Commit => db_session.commit().await,
                Action::Rollback => db_session.rollback().await,
            };

            if let Err(err) = &result {
                transaction.revert(action, from, to, err);
            }
            result
        })
    }

    /// Puts back the state a failed storage call left behind. A failed
    /// `begin` always returns to `Idle`, since storage holds no transaction.
    fn revert(&self, action: Action, from: TransactionState, to: TransactionState, err: &Error) {
        let mut state = self.shared.state.lock().unwrap();
        if matches!(action, Action::Begin) || *state == to {
            tracing::debug!(
                from = state.name(),
                to = from.name(),
                error = %err,
                "transaction {} failed",
                action.name()
            );
            *state = from;
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction").field("state", &self.state()).finish()
    }
}
