use super::Error;

/// Error when an API is called with arguments it cannot act on: a missing
/// key, an unmapped type, an out-of-range query option.
#[derive(Debug)]
pub(super) struct InvalidArgument {
    message: Box<str>,
}

impl std::error::Error for InvalidArgument {}

impl core::fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidArgument(InvalidArgument {
            message: message.into().into(),
        }))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.root().kind(), super::ErrorKind::InvalidArgument(_))
    }
}
