use crate::{error::SQLSTATE_NO_DATA, Error, Result, Value};

/// The outcome of one executed operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationResult {
    pub success: bool,

    /// Rows read: an object keyed by field name for keyed reads, a list of
    /// such objects for scans, a list of flat rows for projections.
    pub value: Value,

    pub error: Option<OperationError>,

    /// The value generated for the auto-increment column by an insert.
    pub autoincrement_value: Option<Value>,
}

/// A failure as reported by the storage engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationError {
    pub sqlstate: String,
    pub message: String,
    pub code: Option<i32>,
}

impl OperationResult {
    pub fn success(value: Value) -> Self {
        Self {
            success: true,
            value,
            error: None,
            autoincrement_value: None,
        }
    }

    pub fn failure(error: OperationError) -> Self {
        Self {
            success: false,
            value: Value::Null,
            error: Some(error),
            autoincrement_value: None,
        }
    }

    pub fn with_autoincrement_value(mut self, value: Value) -> Self {
        self.autoincrement_value = Some(value);
        self
    }

    /// The value read, or the reported failure as an error.
    pub fn into_result(self) -> Result<Value> {
        if self.success {
            return Ok(self.value);
        }

        Err(match self.error {
            Some(error) => error.into(),
            None => Error::operation_failed(None, "operation failed", None),
        })
    }
}

impl OperationError {
    pub fn new(sqlstate: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sqlstate: sqlstate.into(),
            message: message.into(),
            code: None,
        }
    }

    /// No row matched the operation's keys.
    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(SQLSTATE_NO_DATA, message)
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }
}

impl From<OperationError> for Error {
    fn from(error: OperationError) -> Self {
        Error::operation_failed(Some(&error.sqlstate), error.message, error.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_is_not_found() {
        let err = OperationResult::failure(OperationError::no_data("no row for key 1"))
            .into_result()
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err.is_operation_failed());
    }

    #[test]
    fn failure_keeps_code() {
        let err = OperationResult::failure(OperationError::new("23000", "duplicate").with_code(1062))
            .into_result()
            .unwrap_err();

        assert_eq!(err.sqlstate(), Some("23000"));
        assert_eq!(err.code(), Some(1062));
    }

    #[test]
    fn success_passes_the_value() {
        let result = OperationResult::success(Value::I32(1)).with_autoincrement_value(Value::I64(5));
        assert_eq!(result.autoincrement_value, Some(Value::I64(5)));
        assert_eq!(result.into_result().unwrap(), Value::I32(1));
    }
}
