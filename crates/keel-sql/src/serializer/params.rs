use super::{Flavor, Serializer};

use keel_core::query::QueryParameter;

use std::fmt;

/// Collects the formal parameters of a statement.
pub trait Params {
    fn push(&mut self, param: &QueryParameter) -> Placeholder;
}

/// Position of a parameter, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder(pub usize);

/// Parameter names in placeholder order. A parameter used twice appears
/// twice.
impl Params for Vec<String> {
    fn push(&mut self, param: &QueryParameter) -> Placeholder {
        self.push(param.name.clone());
        Placeholder(self.len())
    }
}

pub(super) struct Rendered<'a>(pub(super) &'a Serializer, pub(super) Placeholder);

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.flavor {
            Flavor::Mysql => write!(f, "?"),
            Flavor::Postgresql => write!(f, "${}", self.1 .0),
            Flavor::Sqlite => write!(f, "?{}", self.1 .0),
        }
    }
}
