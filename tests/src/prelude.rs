//! Common imports for test files: `use tests::prelude::*;`

pub use crate::{models, models::*, Fixture, Model};

pub use keel::{
    Batch, ConnectionProperties, Keys, Object, Projection, QueryOptions, Session, Transaction,
    TransactionState, Value,
};

pub use std_util::prelude::*;
