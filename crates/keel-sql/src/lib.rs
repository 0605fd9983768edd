//! Renders keel queries as parameterized SQL.

pub mod serializer;
pub use serializer::{Params, Placeholder, Serializer, SqlVisitor, Transaction};
