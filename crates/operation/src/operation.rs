//! Operation data model and lifecycle
//!
//! An [`Operation`] is one pending storage action together with the record
//! buffers it was encoded into. Operations are built by the
//! [`OperationFactory`](crate::factory::OperationFactory), handed to a native
//! transaction by [`Operation::prepare`] and completed by the batch
//! reconciler.
//!
//! State transitions:
//! - `Defined` → `Prepared` (`prepare`, stores the native handle)
//! - `Prepared` → `Completed` (reconciliation, replaces the result)
//!
//! Each transition happens exactly once; no operation is reused across
//! batches.

use crate::native::{NativeError, NativeOperation, NativeTransaction, TupleSpec};
use crate::result::OperationResult;
use ndb_adapter_codec::RecordBuffer;
use ndb_adapter_core::{
    AdapterError, IndexHandler, LockMode, OpCode, OperationState, Result, Row,
    TableHandler, TransactionId,
};
use std::fmt;
use tracing::debug;

/// Encoded buffers of an operation
///
/// Each buffer is allocated once, with exactly its record's size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationBuffers {
    /// Key buffer, laid out by the index record
    pub key: Option<RecordBuffer>,
    /// Row buffer, laid out by the table record
    pub row: Option<RecordBuffer>,
}

enum Lifecycle {
    Defined,
    Prepared(Box<dyn NativeOperation>),
    Completed(Box<dyn NativeOperation>),
}

impl Lifecycle {
    fn state(&self) -> OperationState {
        match self {
            Lifecycle::Defined => OperationState::Defined,
            Lifecycle::Prepared(_) => OperationState::Prepared,
            Lifecycle::Completed(_) => OperationState::Completed,
        }
    }
}

/// One storage action, its buffers and its lifecycle
///
/// Handler metadata is borrowed and must outlive the operation.
pub struct Operation<'m> {
    opcode: OpCode,
    transaction: TransactionId,
    table: &'m dyn TableHandler,
    index: Option<&'m dyn IndexHandler>,
    lock_mode: Option<LockMode>,
    values: Row,
    buffers: OperationBuffers,
    lifecycle: Lifecycle,
    result: OperationResult,
}

impl<'m> Operation<'m> {
    pub(crate) fn new(
        opcode: OpCode,
        transaction: TransactionId,
        table: &'m dyn TableHandler,
        index: Option<&'m dyn IndexHandler>,
        values: Row,
    ) -> Self {
        Self {
            opcode,
            transaction,
            table,
            index,
            lock_mode: None,
            values,
            buffers: OperationBuffers::default(),
            lifecycle: Lifecycle::Defined,
            result: OperationResult::default(),
        }
    }

    pub(crate) fn set_lock_mode(&mut self, lock_mode: LockMode) {
        self.lock_mode = Some(lock_mode);
    }

    pub(crate) fn buffers_mut(&mut self) -> &mut OperationBuffers {
        &mut self.buffers
    }

    /// Operation kind
    pub fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// Transaction that created the operation
    pub fn transaction(&self) -> TransactionId {
        self.transaction
    }

    /// Table the operation acts on
    pub fn table(&self) -> &'m dyn TableHandler {
        self.table
    }

    /// Index addressing the row, for key based operations
    pub fn index(&self) -> Option<&'m dyn IndexHandler> {
        self.index
    }

    /// Lock requested by a read
    pub fn lock_mode(&self) -> Option<LockMode> {
        self.lock_mode
    }

    /// Logical input: the key for reads and deletes, the row otherwise
    pub fn values(&self) -> &Row {
        &self.values
    }

    /// Encoded buffers
    pub fn buffers(&self) -> &OperationBuffers {
        &self.buffers
    }

    /// Row buffer of a prepared read, for the engine to write results into
    ///
    /// `None` for every other opcode and state: encoded key and row buffers
    /// are never rewritten after construction.
    pub fn row_buffer_mut(&mut self) -> Option<&mut RecordBuffer> {
        match (self.opcode, &self.lifecycle) {
            (OpCode::Read, Lifecycle::Prepared(_)) => self.buffers.row.as_mut(),
            _ => None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> OperationState {
        self.lifecycle.state()
    }

    /// Whether the operation has been reconciled
    pub fn is_completed(&self) -> bool {
        self.state() == OperationState::Completed
    }

    /// Result; the default (unsuccessful, empty) result until completed
    pub fn result(&self) -> &OperationResult {
        &self.result
    }

    /// Native handle, once prepared
    pub fn native(&self) -> Option<&dyn NativeOperation> {
        match &self.lifecycle {
            Lifecycle::Defined => None,
            Lifecycle::Prepared(h) | Lifecycle::Completed(h) => Some(&**h),
        }
    }

    /// Status reported by the native handle of a prepared operation
    ///
    /// # Errors
    /// `InvalidState` unless the operation is `Prepared`.
    pub(crate) fn native_status(&self) -> Result<NativeError> {
        match &self.lifecycle {
            Lifecycle::Prepared(handle) => Ok(handle.ndb_error()),
            other => Err(AdapterError::InvalidState {
                expected: OperationState::Prepared,
                actual: other.state(),
            }),
        }
    }

    /// Define the operation in a native transaction
    ///
    /// Builds the tuple spec for the opcode, calls the matching engine entry
    /// point and keeps the returned handle.
    ///
    /// # Errors
    /// - `InvalidState` unless the operation is `Defined`
    /// - whatever the engine returns when it refuses the definition
    ///
    /// # State Transition
    /// `Defined` → `Prepared`
    pub fn prepare(&mut self, transaction: &mut dyn NativeTransaction) -> Result<()> {
        debug!(opcode = %self.opcode, tx = %self.transaction, "prepare");
        self.ensure_state(OperationState::Defined)?;

        let handle = {
            let spec = self.tuple_spec()?;
            match self.opcode {
                OpCode::Insert => transaction.insert_tuple(&spec)?,
                OpCode::Delete => transaction.delete_tuple(&spec)?,
                OpCode::Read => transaction.read_tuple(&spec)?,
                OpCode::Update => transaction.update_tuple(&spec)?,
            }
        };

        self.lifecycle = Lifecycle::Prepared(handle);
        Ok(())
    }

    fn tuple_spec(&self) -> Result<TupleSpec<'_>> {
        let row_record = Some(self.table.record());
        let row_buffer = self.buffers.row.as_deref();
        let (key_record, key_buffer) = match self.opcode {
            OpCode::Insert => (None, None),
            OpCode::Read | OpCode::Update | OpCode::Delete => {
                let index = self.index.ok_or_else(|| {
                    AdapterError::invalid_argument(format!(
                        "{} operation has no index",
                        self.opcode
                    ))
                })?;
                (Some(index.record()), self.buffers.key.as_deref())
            }
        };

        Ok(TupleSpec {
            opcode: self.opcode,
            key_record,
            key_buffer,
            row_record,
            row_buffer: match self.opcode {
                OpCode::Delete => None,
                _ => row_buffer,
            },
            lock_mode: self.lock_mode,
        })
    }

    /// Install the reconciled result
    ///
    /// # State Transition
    /// `Prepared` → `Completed`
    pub(crate) fn complete(&mut self, result: OperationResult) -> Result<()> {
        match std::mem::replace(&mut self.lifecycle, Lifecycle::Defined) {
            Lifecycle::Prepared(handle) => {
                self.lifecycle = Lifecycle::Completed(handle);
                self.result = result;
                Ok(())
            }
            other => {
                let actual = other.state();
                self.lifecycle = other;
                Err(AdapterError::InvalidState {
                    expected: OperationState::Prepared,
                    actual,
                })
            }
        }
    }

    fn ensure_state(&self, expected: OperationState) -> Result<()> {
        let actual = self.state();
        if actual == expected {
            Ok(())
        } else {
            Err(AdapterError::InvalidState { expected, actual })
        }
    }
}

impl fmt::Debug for Operation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("opcode", &self.opcode)
            .field("transaction", &self.transaction)
            .field("table", &self.table.table_name())
            .field("index", &self.index.map(|i| i.index_name()))
            .field("lock_mode", &self.lock_mode)
            .field("state", &self.state())
            .field("buffers", &self.buffers)
            .field("result", &self.result)
            .finish()
    }
}
