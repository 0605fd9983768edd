use crate::{Error, Result};

/// Observes which fields a [`TableHandler::get`] call found defined.
///
/// [`TableHandler::get`]: super::TableHandler::get
pub trait FieldListener {
    fn set_defined(&mut self, field_number: usize);

    fn set_undefined(&mut self, field_number: usize);

    fn set_error(&mut self, message: String);
}

/// Records field presence while collecting the values of a write.
#[derive(Debug, Default)]
pub struct FieldPresence {
    defined: Vec<Option<bool>>,
    errors: Vec<String>,
}

impl FieldPresence {
    pub fn new(field_count: usize) -> Self {
        Self {
            defined: vec![None; field_count],
            errors: vec![],
        }
    }

    pub fn is_defined(&self, field_number: usize) -> bool {
        matches!(self.defined.get(field_number), Some(Some(true)))
    }

    pub fn defined_fields(&self) -> impl Iterator<Item = usize> + '_ {
        self.defined
            .iter()
            .enumerate()
            .filter(|(_, defined)| **defined == Some(true))
            .map(|(field_number, _)| field_number)
    }

    pub fn into_result(self) -> Result<Self> {
        if self.errors.is_empty() {
            Ok(self)
        } else {
            Err(Error::invalid_argument(self.errors.join("; ")))
        }
    }

    fn mark(&mut self, field_number: usize, defined: bool) {
        if self.defined.len() <= field_number {
            self.defined.resize(field_number + 1, None);
        }
        self.defined[field_number] = Some(defined);
    }
}

impl FieldListener for FieldPresence {
    fn set_defined(&mut self, field_number: usize) {
        self.mark(field_number, true);
    }

    fn set_undefined(&mut self, field_number: usize) {
        self.mark(field_number, false);
    }

    fn set_error(&mut self, message: String) {
        self.errors.push(message);
    }
}
