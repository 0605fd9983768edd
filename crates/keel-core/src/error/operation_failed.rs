use super::Error;

/// The SQLSTATE reported for storage failures that carry no state of their
/// own.
pub const DEFAULT_SQLSTATE: &str = "22000";

/// Error reported by the storage collaborator for a failed operation.
#[derive(Debug)]
pub(super) struct OperationFailed {
    pub(super) sqlstate: Box<str>,
    pub(super) message: Box<str>,
    pub(super) code: Option<i32>,
}

impl std::error::Error for OperationFailed {}

impl core::fmt::Display for OperationFailed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{} (sqlstate {}", self.message, self.sqlstate)?;
        if let Some(code) = self.code {
            write!(f, ", code {code}")?;
        }
        f.write_str(")")
    }
}

impl Error {
    /// Creates an error for a failed storage operation.
    ///
    /// `sqlstate` falls back to `22000` when the storage layer did not
    /// report one.
    pub fn operation_failed(
        sqlstate: Option<&str>,
        message: impl Into<String>,
        code: Option<i32>,
    ) -> Error {
        Error::from(super::ErrorKind::OperationFailed(OperationFailed {
            sqlstate: sqlstate.unwrap_or(DEFAULT_SQLSTATE).into(),
            message: message.into().into(),
            code,
        }))
    }

    /// Returns `true` if this error was reported by the storage layer.
    pub fn is_operation_failed(&self) -> bool {
        matches!(self.root().kind(), super::ErrorKind::OperationFailed(_))
    }

    /// The storage-specific error code, when one was reported.
    pub fn code(&self) -> Option<i32> {
        match self.root().kind() {
            super::ErrorKind::OperationFailed(err) => err.code,
            _ => None,
        }
    }
}
