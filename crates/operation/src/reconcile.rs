//! Batch reconciliation
//!
//! After the engine has executed a batch, [`complete_executed_ops`] walks the
//! operations once, in input order, and turns each native status into an
//! [`OperationResult`]. Failures are recorded per operation; the pass never
//! stops early because of them.

use crate::native::NativeError;
use crate::operation::Operation;
use crate::result::{OperationError, OperationResult};
use ndb_adapter_codec::BufferCodec;
use ndb_adapter_core::{AdapterError, OpCode, OperationState, Result};
use tracing::{debug, warn};

/// Counts from one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Operations moved to `Completed`
    pub completed: usize,
    /// Completed operations whose engine status was success
    pub succeeded: usize,
    /// Completed operations that failed, natively or while decoding
    pub failed: usize,
    /// Operations left untouched because they were not prepared
    pub skipped: usize,
}

/// Complete every prepared operation of an executed batch
///
/// Each prepared operation gets a fresh result:
/// - native code 0: `success`; reads also decode their row buffer into `value`
/// - otherwise: an error carrying the MySQL code, message and native error
///
/// A read whose row cannot be decoded fails on its own with
/// [`DECODE_FAILURE_CODE`](crate::result::DECODE_FAILURE_CODE).
///
/// Operations that are not `Prepared` are logged and left unchanged. With
/// `strict` set, their positions are reported as `UnpreparedOperations`
/// once every prepared operation has been completed.
pub fn complete_executed_ops(
    codec: &BufferCodec<'_>,
    ops: &mut [Operation<'_>],
    strict: bool,
) -> Result<BatchSummary> {
    debug!(count = ops.len(), "complete_executed_ops");
    let mut summary = BatchSummary::default();
    let mut unprepared = Vec::new();

    for (pos, op) in ops.iter_mut().enumerate() {
        if op.state() != OperationState::Prepared {
            warn!(
                position = pos,
                opcode = %op.opcode(),
                state = ?op.state(),
                "complete_executed_ops: operation was not prepared"
            );
            unprepared.push(pos);
            summary.skipped += 1;
            continue;
        }

        let native = op.native_status()?;
        let result = reconcile_one(codec, op, native);
        if result.success {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        op.complete(result)?;
        summary.completed += 1;
    }

    debug!(
        completed = summary.completed,
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "complete_executed_ops: done"
    );

    if strict && !unprepared.is_empty() {
        return Err(AdapterError::UnpreparedOperations {
            positions: unprepared,
        });
    }
    Ok(summary)
}

fn reconcile_one(codec: &BufferCodec<'_>, op: &Operation<'_>, native: NativeError) -> OperationResult {
    if !native.is_ok() {
        debug!(opcode = %op.opcode(), error = %native, "operation failed");
        return OperationResult::failed(OperationError::from_native(native));
    }
    if op.opcode() != OpCode::Read {
        return OperationResult::succeeded();
    }

    let decoded = match op.buffers().row.as_deref() {
        Some(buffer) => codec.decode(op.table(), buffer),
        None => Err(AdapterError::invalid_argument("read operation has no row buffer")),
    };
    match decoded {
        Ok(row) => OperationResult {
            success: true,
            value: Some(row),
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "read result could not be decoded");
            OperationResult::failed(OperationError::decode_failure(&e, native))
        }
    }
}
