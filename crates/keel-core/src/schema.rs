//! Table metadata as reported by the storage collaborator.

mod column;
pub use column::{Column, ColumnType};

mod foreign_key;
pub use foreign_key::ForeignKey;

mod index;
pub use index::Index;

mod table;
pub use table::Table;
