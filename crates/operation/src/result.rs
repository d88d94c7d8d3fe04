//! Operation results
//!
//! A completed operation carries an [`OperationResult`]. Native failures
//! are data here, not errors: one failing operation in a batch never hides
//! the outcome of the others.

use crate::native::NativeError;
use ndb_adapter_core::{AdapterError, Row};

/// Application code used when a successful read cannot be decoded
pub const DECODE_FAILURE_CODE: i32 = -1;

/// Failure details of one operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationError {
    /// Application-level code (the MySQL error code of the native error)
    pub code: i32,
    /// Human readable message
    pub message: String,
    /// Raw native error, kept for diagnostics
    pub native: NativeError,
}

impl OperationError {
    /// Map a native error to its application error
    pub fn from_native(native: NativeError) -> Self {
        Self {
            code: native.mysql_code,
            message: native.message.clone(),
            native,
        }
    }

    /// Failure to decode the row of an otherwise successful read
    pub fn decode_failure(err: &AdapterError, native: NativeError) -> Self {
        Self {
            code: DECODE_FAILURE_CODE,
            message: err.to_string(),
            native,
        }
    }

    /// Whether retrying the operation may succeed
    pub fn is_temporary(&self) -> bool {
        self.native.status.is_temporary()
    }
}

/// Outcome of an operation
///
/// `value` is only ever set for successful reads; `error` only for failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationResult {
    /// Whether the engine reported success
    pub success: bool,
    /// Decoded row of a successful read
    pub value: Option<Row>,
    /// Failure details
    pub error: Option<OperationError>,
}

impl OperationResult {
    /// Successful result without a value
    pub fn succeeded() -> Self {
        Self {
            success: true,
            value: None,
            error: None,
        }
    }

    /// Failed result
    pub fn failed(error: OperationError) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeStatus;

    #[test]
    fn test_application_code_is_mysql_code() {
        let native = NativeError::new(626, 120, "Tuple did not exist", NativeStatus::PermanentError);
        let err = OperationError::from_native(native.clone());
        assert_eq!(err.code, 120);
        assert_eq!(err.message, "Tuple did not exist");
        assert_eq!(err.native, native);
        assert!(!err.is_temporary());
    }

    #[test]
    fn test_default_result_is_pending_failure() {
        let r = OperationResult::default();
        assert!(!r.success);
        assert!(r.value.is_none());
        assert!(r.error.is_none());
    }

    #[test]
    fn test_constructors() {
        assert!(OperationResult::succeeded().success);
        let failed = OperationResult::failed(OperationError::from_native(NativeError::new(
            266,
            146,
            "Time-out in NDB, probably caused by deadlock",
            NativeStatus::TemporaryError,
        )));
        assert!(!failed.success);
        assert!(failed.error.as_ref().unwrap().is_temporary());
    }

    #[test]
    fn test_decode_failure_code() {
        let err = OperationError::decode_failure(
            &AdapterError::Native("bad".into()),
            NativeError::ok(),
        );
        assert_eq!(err.code, DECODE_FAILURE_CODE);
        assert!(err.message.contains("bad"));
    }
}
