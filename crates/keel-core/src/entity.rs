use crate::{Object, Result, Value};

use std::{any::Any, fmt};

/// A domain object whose fields the mapping layer reads and writes by name.
///
/// `get_field` returns `None` for a field the object does not define, which
/// the table handler reports as "undefined" to its listener, distinct from
/// an explicit `Value::Null`.
///
/// Implement it for a struct with the [`entity!`](crate::entity) macro.
pub trait Entity: Any + Send + Sync + fmt::Debug {
    fn get_field(&self, name: &str) -> Option<Value>;

    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// Names of the fields currently defined on the object.
    fn field_names(&self) -> Vec<String>;

    fn clone_entity(&self) -> Box<dyn Entity>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn Entity {
    /// Recovers the concrete type of a boxed entity.
    pub fn downcast<T: Entity>(self: Box<Self>) -> Result<T> {
        match self.into_any().downcast::<T>() {
            Ok(entity) => Ok(*entity),
            Err(_) => Err(crate::Error::invalid_argument(format!(
                "entity is not a `{}`",
                std::any::type_name::<T>()
            ))),
        }
    }

    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Copies every defined field into a dynamic object.
    pub fn to_object(&self) -> Object {
        self.field_names()
            .into_iter()
            .filter_map(|name| {
                let value = self.get_field(&name)?;
                Some((name, value))
            })
            .collect()
    }
}

impl Clone for Box<dyn Entity> {
    fn clone(&self) -> Self {
        self.clone_entity()
    }
}

impl Entity for Object {
    fn get_field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.insert(name, value);
        Ok(())
    }

    fn field_names(&self) -> Vec<String> {
        self.names().map(str::to_string).collect()
    }

    fn clone_entity(&self) -> Box<dyn Entity> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
