/// A named placeholder in a predicate, bound to a value when the query
/// executes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryParameter {
    pub name: String,
}

impl QueryParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
