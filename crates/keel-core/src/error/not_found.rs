use super::Error;

/// Error when a keyed lookup matched no row. Reports SQLSTATE `02000`.
#[derive(Debug)]
pub(super) struct NotFoundError {
    pub(super) context: Option<Box<str>>,
}

impl std::error::Error for NotFoundError {}

impl core::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("no row found")?;
        if let Some(ref ctx) = self.context {
            write!(f, ": {}", ctx)?;
        }
        Ok(())
    }
}

impl Error {
    pub fn not_found(context: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::NotFound(NotFoundError {
            context: Some(context.into().into()),
        }))
    }

    /// Returns `true` if this error, or the error it wraps, reports a
    /// missing row.
    pub fn is_not_found(&self) -> bool {
        self.sqlstate() == Some(super::SQLSTATE_NO_DATA)
    }
}
