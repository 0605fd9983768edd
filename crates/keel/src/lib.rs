mod batch;
pub use batch::Batch;

mod connect;
pub use connect::{connect, open_session};

mod connections;

mod context;
pub use context::{Callback, TableIndicator};

mod projection;

pub mod query;
pub use query::{Query, QueryOptions};

mod session;
pub use session::Session;

mod session_factory;
pub use session_factory::SessionFactory;

mod transaction;
pub use transaction::{Transaction, TransactionState};

mod verb;

pub use keel_core::{
    driver::ConnectionProperties,
    entity,
    handler::Keys,
    mapping::{
        Converter, FieldMapping, FieldMeta, JsonConverter, Mappings, Relationship,
        RelationshipKind, TableMapping,
    },
    projection::Projection,
    promise::{Next, Promise},
    schema::{ColumnType, ForeignKey, Table},
    Entity, Error, Object, Result, Value,
};
