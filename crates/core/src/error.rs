//! Error types for the NDB operation adapter
//!
//! Every failure the adapter raises synchronously goes through [`AdapterError`].
//! Native execution failures are not errors at this level: they are captured
//! per operation as data in the operation's result.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::{NativeTypeId, OperationState};
use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Error types for the adapter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// Caller passed an argument the adapter cannot use
    /// (unknown lock mode, index handler without a table, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No encoder registered for a column's native type
    #[error("No encoder registered for native type {0:?}")]
    UnregisteredType(NativeTypeId),

    /// The requested operation kind is declared but not supported
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Value cannot be represented in the column's native type
    #[error("Cannot encode column {column} ({type_id:?}): {reason}")]
    Encoding {
        /// Field index within the handler's mapping
        column: usize,
        /// Native type of the column
        type_id: NativeTypeId,
        /// What went wrong
        reason: String,
    },

    /// Buffer bytes cannot be read back as the column's native type
    #[error("Cannot decode column {column} ({type_id:?}): {reason}")]
    Decoding {
        /// Field index within the handler's mapping
        column: usize,
        /// Native type of the column
        type_id: NativeTypeId,
        /// What went wrong
        reason: String,
    },

    /// Access outside the span of a record buffer
    #[error("Out of bounds: {len} bytes at offset {offset} in a {size}-byte buffer")]
    OutOfBounds {
        /// Start of the attempted access
        offset: usize,
        /// Length of the attempted access
        len: usize,
        /// Size of the buffer
        size: usize,
    },

    /// Null requested for a column that has no null bit
    #[error("Column {0} is not nullable")]
    NotNullable(usize),

    /// Field index beyond the record's column count
    #[error("Field {field} out of range: record has {count} columns")]
    FieldOutOfRange {
        /// Requested field index
        field: usize,
        /// Number of columns in the record
        count: usize,
    },

    /// Lifecycle step attempted from the wrong state
    #[error("Invalid state: expected {expected:?}, found {actual:?}")]
    InvalidState {
        /// State required by the step
        expected: OperationState,
        /// State the operation was in
        actual: OperationState,
    },

    /// Operations handed to reconciliation without being prepared
    #[error("Operations at positions {positions:?} were not prepared")]
    UnpreparedOperations {
        /// Batch positions of the offending operations
        positions: Vec<usize>,
    },

    /// Native engine refused to define an operation
    #[error("Native engine error: {0}")]
    Native(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AdapterError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AdapterError::InvalidArgument(message.into())
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: impl Into<String>) -> Self {
        AdapterError::Unsupported(operation.into())
    }

    /// Create an encoding error for a column
    pub fn encoding(column: usize, type_id: NativeTypeId, reason: impl Into<String>) -> Self {
        AdapterError::Encoding {
            column,
            type_id,
            reason: reason.into(),
        }
    }

    /// Create a decoding error for a column
    pub fn decoding(column: usize, type_id: NativeTypeId, reason: impl Into<String>) -> Self {
        AdapterError::Decoding {
            column,
            type_id,
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        AdapterError::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_argument() {
        let err = AdapterError::invalid_argument("index has no table");
        let msg = err.to_string();
        assert!(msg.contains("Invalid argument"));
        assert!(msg.contains("index has no table"));
    }

    #[test]
    fn test_error_display_unregistered_type() {
        let err = AdapterError::UnregisteredType(NativeTypeId::Double);
        assert!(err.to_string().contains("Double"));
    }

    #[test]
    fn test_error_display_out_of_bounds() {
        let err = AdapterError::OutOfBounds {
            offset: 18,
            len: 4,
            size: 20,
        };
        let msg = err.to_string();
        assert!(msg.contains("18"));
        assert!(msg.contains("20"));
    }

    #[test]
    fn test_error_display_invalid_state() {
        let err = AdapterError::InvalidState {
            expected: OperationState::Defined,
            actual: OperationState::Completed,
        };
        let msg = err.to_string();
        assert!(msg.contains("Defined"));
        assert!(msg.contains("Completed"));
    }

    #[test]
    fn test_error_display_unprepared() {
        let err = AdapterError::UnpreparedOperations {
            positions: vec![1, 3],
        };
        assert!(err.to_string().contains("[1, 3]"));
    }

    #[test]
    fn test_error_pattern_matching() {
        let err = AdapterError::encoding(2, NativeTypeId::Varchar, "too long");

        match err {
            AdapterError::Encoding {
                column, type_id, ..
            } => {
                assert_eq!(column, 2);
                assert_eq!(type_id, NativeTypeId::Varchar);
            }
            _ => panic!("Wrong error variant"),
        }
    }
}
