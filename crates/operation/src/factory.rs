//! Operation construction
//!
//! The factory validates inputs, encodes the buffers each opcode needs and
//! returns a `Defined` [`Operation`]. It never talks to the engine; that
//! happens in [`Operation::prepare`].
//!
//! | opcode | key buffer        | row buffer              |
//! |--------|-------------------|-------------------------|
//! | read   | encoded from keys | zeroed, filled by engine |
//! | insert | -                 | encoded from row        |
//! | delete | encoded from keys | -                       |
//! | update | encoded from row  | encoded from row        |

use crate::config::AdapterConfig;
use crate::operation::Operation;
use crate::reconcile::{self, BatchSummary};
use ndb_adapter_codec::{BufferCodec, EncoderRegistry, RecordBuffer};
use ndb_adapter_core::{
    AdapterError, IndexHandler, LockMode, OpCode, Result, Row, TableHandler, TransactionId,
};
use tracing::{debug, warn};

/// Builds operations and completes executed batches
#[derive(Debug, Clone, Copy)]
pub struct OperationFactory<'r> {
    codec: BufferCodec<'r>,
    config: AdapterConfig,
}

impl<'r> OperationFactory<'r> {
    /// Factory with the default configuration
    pub fn new(registry: &'r EncoderRegistry) -> Self {
        Self::with_config(registry, AdapterConfig::default())
    }

    /// Factory with an explicit configuration
    pub fn with_config(registry: &'r EncoderRegistry, config: AdapterConfig) -> Self {
        Self {
            codec: BufferCodec::new(registry).with_null_policy(config.null_decode),
            config,
        }
    }

    /// Codec used for every buffer this factory encodes or decodes
    pub fn codec(&self) -> &BufferCodec<'r> {
        &self.codec
    }

    /// Active configuration
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Read one row by key
    ///
    /// The row buffer is allocated zeroed here, since the engine writes the
    /// result into it during execution.
    ///
    /// # Errors
    /// - `InvalidArgument` if the index is not attached to a table
    /// - any key encoding error
    pub fn new_read_operation<'m>(
        &self,
        tx: TransactionId,
        index: &'m dyn IndexHandler,
        keys: Row,
        lock_mode: LockMode,
    ) -> Result<Operation<'m>> {
        debug!(tx = %tx, index = index.index_name(), lock_mode = %lock_mode, "new_read_operation");
        let table = attached_table(index)?;

        let mut op = Operation::new(OpCode::Read, tx, table, Some(index), keys);
        op.set_lock_mode(lock_mode);
        let key = self.codec.encode(index, op.values())?;
        let buffers = op.buffers_mut();
        buffers.key = Some(key);
        buffers.row = Some(RecordBuffer::for_record(table.record()));
        Ok(op)
    }

    /// Insert one row
    ///
    /// # Errors
    /// Any row encoding error.
    pub fn new_insert_operation<'m>(
        &self,
        tx: TransactionId,
        table: &'m dyn TableHandler,
        row: Row,
    ) -> Result<Operation<'m>> {
        debug!(tx = %tx, table = table.table_name(), "new_insert_operation");
        let mut op = Operation::new(OpCode::Insert, tx, table, None, row);
        let encoded = self.codec.encode(table, op.values())?;
        op.buffers_mut().row = Some(encoded);
        Ok(op)
    }

    /// Delete one row by key
    ///
    /// # Errors
    /// - `InvalidArgument` if the index is not attached to a table
    /// - any key encoding error
    pub fn new_delete_operation<'m>(
        &self,
        tx: TransactionId,
        index: &'m dyn IndexHandler,
        keys: Row,
    ) -> Result<Operation<'m>> {
        debug!(tx = %tx, index = index.index_name(), "new_delete_operation");
        let table = attached_table(index)?;

        let mut op = Operation::new(OpCode::Delete, tx, table, Some(index), keys);
        let key = self.codec.encode(index, op.values())?;
        op.buffers_mut().key = Some(key);
        Ok(op)
    }

    /// Update one row, addressed by the key columns of `row`
    ///
    /// # Errors
    /// - `InvalidArgument` if the index is not attached to a table
    /// - any key or row encoding error
    pub fn new_update_operation<'m>(
        &self,
        tx: TransactionId,
        index: &'m dyn IndexHandler,
        row: Row,
    ) -> Result<Operation<'m>> {
        debug!(tx = %tx, index = index.index_name(), "new_update_operation");
        let table = attached_table(index)?;

        let mut op = Operation::new(OpCode::Update, tx, table, Some(index), row);
        let key = self.codec.encode(index, op.values())?;
        let encoded = self.codec.encode(table, op.values())?;
        let buffers = op.buffers_mut();
        buffers.key = Some(key);
        buffers.row = Some(encoded);
        Ok(op)
    }

    /// Write (upsert) one row
    ///
    /// Not supported; always fails.
    pub fn new_write_operation<'m>(
        &self,
        tx: TransactionId,
        index: &'m dyn IndexHandler,
        _row: Row,
    ) -> Result<Operation<'m>> {
        warn!(tx = %tx, index = index.index_name(), "new_write_operation: not supported");
        Err(AdapterError::unsupported("write"))
    }

    /// Complete every prepared operation of an executed batch
    ///
    /// See [`reconcile::complete_executed_ops`]; strictness comes from the
    /// configuration.
    pub fn complete_executed_ops(&self, ops: &mut [Operation<'_>]) -> Result<BatchSummary> {
        reconcile::complete_executed_ops(&self.codec, ops, self.config.strict_reconcile)
    }
}

fn attached_table(index: &dyn IndexHandler) -> Result<&dyn TableHandler> {
    index.table_handler().ok_or_else(|| {
        AdapterError::invalid_argument(format!(
            "index '{}' is not attached to a table",
            index.index_name()
        ))
    })
}
