//! Runtime correspondence between a domain type's fields and a table's
//! columns and indexes.

mod choose_index;
pub use choose_index::choose_index;

mod field;
pub use field::HandlerField;

mod index;
pub use index::IndexHandler;

mod keys;
pub use keys::Keys;

mod listener;
pub use listener::{FieldListener, FieldPresence};

mod table;
pub use table::TableHandler;
