//! Operation lifecycle for the NDB adapter
//!
//! This crate drives single-row storage operations through their lifecycle:
//! - OperationFactory: validates inputs and encodes key and row buffers
//! - Operation: `Defined` → `Prepared` → `Completed` state machine
//! - NativeTransaction / NativeOperation: the engine seam used by `prepare`
//! - complete_executed_ops: turns per-operation engine status into results
//! - AdapterConfig: `ndb-adapter.toml` settings
//! - testing: an in-memory engine for exercising whole batches

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod factory;
pub mod native;
pub mod operation;
pub mod reconcile;
pub mod result;
pub mod testing;

pub use config::{AdapterConfig, CONFIG_FILE_NAME};
pub use factory::OperationFactory;
pub use native::{NativeError, NativeOperation, NativeStatus, NativeTransaction, TupleSpec};
pub use operation::{Operation, OperationBuffers};
pub use reconcile::{complete_executed_ops, BatchSummary};
pub use result::{OperationError, OperationResult, DECODE_FAILURE_CODE};
