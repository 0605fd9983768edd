use crate::{Entity, Object, Value};

/// The keys handed to a keyed operation: either a bare value for a
/// single-column primary key, or an object carrying key fields by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Keys {
    Scalar(Value),
    Object(Object),
}

impl Keys {
    /// Key fields taken from a domain object.
    pub fn from_entity(entity: &dyn Entity) -> Self {
        Self::Object(entity.to_object())
    }

    /// Names of the key object's fields that are defined and not null.
    pub fn defined_names(&self) -> Vec<&str> {
        match self {
            Self::Scalar(_) => vec![],
            Self::Object(object) => object
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(name, _)| name)
                .collect(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }
}

impl<T: Into<Value>> From<T> for Keys {
    fn from(value: T) -> Self {
        match value.into() {
            Value::Object(object) => Self::Object(object),
            value => Self::Scalar(value),
        }
    }
}
