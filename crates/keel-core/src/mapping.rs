//! Declarative table mappings: which table a domain type is stored in and how
//! its fields correspond to columns.

mod converter;
pub use converter::{Converter, JsonConverter};

mod field;
pub use field::{FieldMapping, FieldMeta};

mod registry;
pub use registry::{MappingId, Mappings, TypeDescriptor};

mod relationship;
pub use relationship::{Relationship, RelationshipKind, TargetType};

mod table;
pub use table::TableMapping;
