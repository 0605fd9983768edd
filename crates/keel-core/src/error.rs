mod adhoc;
mod batch_cleared;
mod illegal_state;
mod invalid_argument;
mod mapping;
mod not_found;
mod operation_failed;

pub use operation_failed::DEFAULT_SQLSTATE;

use adhoc::AdhocError;
use batch_cleared::BatchCleared;
use illegal_state::IllegalStateError;
use invalid_argument::InvalidArgument;
use mapping::MappingError;
use not_found::NotFoundError;
use operation_failed::OperationFailed;
use std::sync::Arc;

/// SQLSTATE class reported when an operation matched no row.
pub const SQLSTATE_NO_DATA: &str = "02000";

/// SQLSTATE reported for transaction state violations.
pub const SQLSTATE_INVALID_TRANSACTION_STATE: &str = "25000";

#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur in Keel.
///
/// Errors are cheap to clone: a settled promise hands the same error to every
/// observer, and the user callback receives the very error the promise was
/// rejected with.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context
    /// is shown first, followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let kind = match consequent.inner {
            Some(inner) => match Arc::try_unwrap(inner) {
                Ok(inner) => {
                    assert!(
                        inner.cause.is_none(),
                        "consequent error must not already have a cause"
                    );
                    inner.kind
                }
                Err(shared) => ErrorKind::Adhoc(AdhocError {
                    message: shared.kind.to_string().into(),
                }),
            },
            None => ErrorKind::Unknown,
        };

        Error {
            inner: Some(Arc::new(ErrorInner {
                kind,
                cause: Some(self),
            })),
        }
    }

    fn root(&self) -> &Error {
        self.chain().last().unwrap_or(self)
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    /// The SQLSTATE describing this error, taken from the root cause.
    ///
    /// Errors that do not originate from the storage layer or the transaction
    /// state machine have no SQLSTATE.
    pub fn sqlstate(&self) -> Option<&str> {
        match self.root().kind() {
            ErrorKind::OperationFailed(err) => Some(&err.sqlstate),
            ErrorKind::NotFound(_) => Some(SQLSTATE_NO_DATA),
            ErrorKind::IllegalState(_) => Some(SQLSTATE_INVALID_TRANSACTION_STATE),
            _ => None,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            ErrorKind::OperationFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    Mapping(MappingError),
    IllegalState(IllegalStateError),
    OperationFailed(OperationFailed),
    NotFound(NotFoundError),
    InvalidArgument(InvalidArgument),
    BatchCleared(BatchCleared),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            Mapping(err) => core::fmt::Display::fmt(err, f),
            IllegalState(err) => core::fmt::Display::fmt(err, f),
            OperationFailed(err) => core::fmt::Display::fmt(err, f),
            NotFound(err) => core::fmt::Display::fmt(err, f),
            InvalidArgument(err) => core::fmt::Display::fmt(err, f),
            BatchCleared(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown keel error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_size() {
        // Error stays one word wide
        assert_eq!(core::mem::size_of::<usize>(), core::mem::size_of::<Error>());
    }

    #[test]
    fn error_from_args() {
        let err = Error::from_args(format_args!("test error: {}", 42));
        assert_eq!(err.to_string(), "test error: 42");
        assert_eq!(err.sqlstate(), None);
    }

    #[test]
    fn error_chain_display() {
        let chained = err!("root cause")
            .context(err!("middle context"))
            .context(err!("top context"));

        assert_eq!(
            chained.to_string(),
            "top context: middle context: root cause"
        );
    }

    #[test]
    fn illegal_state_reports_25000() {
        let err = Error::illegal_state("Idle", "commit");
        assert_eq!(err.to_string(), "Illegal state: Idle cannot commit.");
        assert_eq!(err.sqlstate(), Some("25000"));
        assert!(err.is_illegal_state());
    }

    #[test]
    fn operation_failed_defaults_to_22000() {
        let err = Error::operation_failed(None, "duplicate key", Some(1062));
        assert_eq!(err.sqlstate(), Some("22000"));
        assert_eq!(err.code(), Some(1062));
        assert_eq!(
            err.to_string(),
            "duplicate key (sqlstate 22000, code 1062)"
        );
    }

    #[test]
    fn sqlstate_survives_context() {
        let err = Error::operation_failed(Some("02000"), "no such row", None)
            .context(err!("update failed"));
        assert_eq!(err.sqlstate(), Some("02000"));
        assert!(err.is_not_found());
    }

    #[test]
    fn batch_cleared_message() {
        let err = Error::batch_cleared();
        assert_eq!(err.to_string(), "Batch was cleared");
        assert!(err.is_batch_cleared());
    }

    #[test]
    fn anyhow_bridge() {
        let our_err: Error = anyhow::anyhow!("something failed").into();
        assert_eq!(our_err.to_string(), "something failed");
    }
}
