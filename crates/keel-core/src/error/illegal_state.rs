use super::Error;

/// Error when a transaction operation is not allowed in the current state,
/// such as committing a transaction that was never begun.
#[derive(Debug)]
pub(super) struct IllegalStateError {
    pub(super) state: &'static str,
    pub(super) operation: &'static str,
}

impl std::error::Error for IllegalStateError {}

impl core::fmt::Display for IllegalStateError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "Illegal state: {} cannot {}.",
            self.state, self.operation
        )
    }
}

impl Error {
    /// Creates an illegal state error for `operation` attempted in `state`.
    ///
    /// Illegal state errors always report SQLSTATE `25000`.
    pub fn illegal_state(state: &'static str, operation: &'static str) -> Error {
        Error::from(super::ErrorKind::IllegalState(IllegalStateError {
            state,
            operation,
        }))
    }

    /// Returns `true` if this error is an illegal state error.
    pub fn is_illegal_state(&self) -> bool {
        matches!(self.root().kind(), super::ErrorKind::IllegalState(_))
    }
}
