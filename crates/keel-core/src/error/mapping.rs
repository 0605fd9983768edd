use super::Error;

/// Error raised when a table mapping or table handler is used while it
/// carries accumulated validation messages.
///
/// Mapping problems are collected as plain strings while the mapping is
/// declared and only become an `Error` when the mapping is used for an
/// operation.
#[derive(Debug)]
pub(super) struct MappingError {
    pub(super) messages: Box<str>,
}

impl std::error::Error for MappingError {}

impl core::fmt::Display for MappingError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid mapping: {}", self.messages)
    }
}

impl Error {
    /// Creates a mapping error from the accumulated validation messages.
    pub fn mapping(messages: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Mapping(MappingError {
            messages: messages.into().into(),
        }))
    }

    /// Returns `true` if this error reports an invalid mapping.
    pub fn is_mapping(&self) -> bool {
        matches!(self.root().kind(), super::ErrorKind::Mapping(_))
    }
}
