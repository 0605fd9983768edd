#[macro_use]
mod macros;

pub mod driver;
pub use driver::Driver;

mod entity;
pub use entity::Entity;

pub mod error;
pub use error::Error;

pub mod handler;

pub mod mapping;

pub mod projection;

pub mod promise;
pub use promise::Promise;

pub mod query;

pub mod schema;

pub mod value;
pub use value::{Object, Value};

#[cfg(test)]
mod fixtures;

pub use async_trait::async_trait;

/// A Result type alias that uses Keel's [`Error`] type.
pub type Result<T, E = Error> = core::result::Result<T, E>;
