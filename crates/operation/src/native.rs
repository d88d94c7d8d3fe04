//! Native engine interface
//!
//! The transaction engine that actually executes operations lives outside
//! this crate. An operation is handed to it in `prepare` as a [`TupleSpec`];
//! the engine answers with an opaque [`NativeOperation`] handle that reports
//! the per-operation status once the batch has executed.
//!
//! Read results are written by the engine into the operation's own row
//! buffer, which is why that buffer exists before execution.

use ndb_adapter_core::{LockMode, OpCode, RecordLayout, Result};
use std::fmt;

/// Outcome class of a native error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NativeStatus {
    /// No error
    #[default]
    Success,
    /// Transient, a retry may succeed
    TemporaryError,
    /// Retrying will fail the same way
    PermanentError,
    /// The engine cannot tell whether the operation took effect
    UnknownResult,
}

impl NativeStatus {
    /// Whether retrying may succeed
    pub fn is_temporary(self) -> bool {
        matches!(self, NativeStatus::TemporaryError)
    }
}

/// Error reported by the engine for one operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NativeError {
    /// Engine error code, 0 on success
    pub code: i32,
    /// Corresponding MySQL handler error code
    pub mysql_code: i32,
    /// Engine message
    pub message: String,
    /// Outcome class
    pub status: NativeStatus,
}

impl NativeError {
    /// Create a native error
    pub fn new(code: i32, mysql_code: i32, message: impl Into<String>, status: NativeStatus) -> Self {
        Self {
            code,
            mysql_code,
            message: message.into(),
            status,
        }
    }

    /// The "no error" status
    pub fn ok() -> Self {
        Self::default()
    }

    /// Whether this reports success
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mysql {}): {}", self.code, self.mysql_code, self.message)
    }
}

/// What the engine needs to define one operation
///
/// Which members are set depends on the opcode:
/// - insert: row record and row buffer
/// - delete: key record, key buffer and row record
/// - read, update: all four; reads also carry the lock mode
pub struct TupleSpec<'a> {
    /// Operation kind
    pub opcode: OpCode,
    /// Layout of the key buffer
    pub key_record: Option<&'a dyn RecordLayout>,
    /// Encoded key
    pub key_buffer: Option<&'a [u8]>,
    /// Layout of the row buffer
    pub row_record: Option<&'a dyn RecordLayout>,
    /// Encoded row (insert/update) or zeroed result space (read)
    pub row_buffer: Option<&'a [u8]>,
    /// Lock requested by a read
    pub lock_mode: Option<LockMode>,
}

impl fmt::Debug for TupleSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleSpec")
            .field("opcode", &self.opcode)
            .field("key_record", &self.key_record.map(|r| r.buffer_size()))
            .field("key_buffer", &self.key_buffer.map(|b| b.len()))
            .field("row_record", &self.row_record.map(|r| r.buffer_size()))
            .field("row_buffer", &self.row_buffer.map(|b| b.len()))
            .field("lock_mode", &self.lock_mode)
            .finish()
    }
}

/// Handle to an operation defined in a native transaction
pub trait NativeOperation {
    /// Status of the operation; meaningful once the batch has executed
    fn ndb_error(&self) -> NativeError;
}

/// Native transaction that operations are defined in
pub trait NativeTransaction {
    /// Define an insert
    fn insert_tuple(&mut self, spec: &TupleSpec<'_>) -> Result<Box<dyn NativeOperation>>;

    /// Define a delete by key
    fn delete_tuple(&mut self, spec: &TupleSpec<'_>) -> Result<Box<dyn NativeOperation>>;

    /// Define a read by key
    fn read_tuple(&mut self, spec: &TupleSpec<'_>) -> Result<Box<dyn NativeOperation>>;

    /// Define an update by key
    fn update_tuple(&mut self, spec: &TupleSpec<'_>) -> Result<Box<dyn NativeOperation>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_error() {
        let ok = NativeError::ok();
        assert!(ok.is_ok());
        assert_eq!(ok.status, NativeStatus::Success);
    }

    #[test]
    fn test_display() {
        let e = NativeError::new(630, 121, "Tuple already existed", NativeStatus::PermanentError);
        assert_eq!(e.to_string(), "630 (mysql 121): Tuple already existed");
        assert!(!e.is_ok());
    }

    #[test]
    fn test_temporary_status() {
        assert!(NativeStatus::TemporaryError.is_temporary());
        assert!(!NativeStatus::UnknownResult.is_temporary());
    }
}
