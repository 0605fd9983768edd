mod delete;
pub use delete::Delete;

mod insert;
pub use insert::Insert;

mod read;
pub use read::Read;

mod read_projection;
pub use read_projection::ReadProjection;

mod scan;
pub use scan::{Order, Scan, ScanOptions};

mod update;
pub use update::Update;

mod write;
pub use write::Write;

use crate::handler::TableHandler;

use std::sync::Arc;

/// A storage operation built by a [`TransactionHandler`], waiting to be
/// executed.
///
/// [`TransactionHandler`]: super::TransactionHandler
#[derive(Debug, Clone)]
pub enum Operation {
    Insert(Insert),
    Read(Read),
    Update(Update),

    /// Insert or replace by primary key
    Write(Write),

    Delete(Delete),
    Scan(Scan),
    ReadProjection(ReadProjection),
}

impl Operation {
    pub fn handler(&self) -> &Arc<TableHandler> {
        match self {
            Self::Insert(op) => &op.handler,
            Self::Read(op) => &op.handler,
            Self::Update(op) => &op.handler,
            Self::Write(op) => &op.handler,
            Self::Delete(op) => &op.handler,
            Self::Scan(op) => op.query.handler(),
            Self::ReadProjection(op) => &op.handler,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Read(_) => "read",
            Self::Update(_) => "update",
            Self::Write(_) => "write",
            Self::Delete(_) => "delete",
            Self::Scan(_) => "scan",
            Self::ReadProjection(_) => "read_projection",
        }
    }
}
