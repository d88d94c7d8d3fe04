//! ndb-adapter - row operations over NDB fixed-layout record buffers
//!
//! The adapter sits between callers that think in logical rows and a native
//! transaction engine that only understands fixed-layout byte records. It
//! encodes rows and keys into record buffers, hands operations to the engine
//! and turns per-operation engine status back into results.
//!
//! # Quick Start
//!
//! ```ignore
//! use ndb_adapter::{
//!     ColumnMetadata, EncoderRegistry, LockMode, NativeTypeId, OperationFactory, Row,
//!     TableMetadata, TransactionId,
//! };
//!
//! let registry = EncoderRegistry::with_defaults();
//! let table = TableMetadata::new("people", vec![
//!     ColumnMetadata::new("id", NativeTypeId::Int, 0).not_null(),
//!     ColumnMetadata::new("name", NativeTypeId::Varchar, 14),
//! ]);
//! let primary = table.index("PRIMARY", &["id"])?;
//! let factory = OperationFactory::new(&registry);
//!
//! let mut ops = vec![factory.new_read_operation(
//!     TransactionId(1),
//!     &primary,
//!     Row::new().with("id", 7),
//!     LockMode::Shared,
//! )?];
//! for op in ops.iter_mut() {
//!     op.prepare(&mut native_tx)?;
//! }
//! // ... the engine executes the batch ...
//! factory.complete_executed_ops(&mut ops)?;
//! let row = ops[0].result().value.as_ref();
//! ```
//!
//! # Architecture
//!
//! - `ndb-adapter-core`: values, column metadata, errors and handler traits
//! - `ndb-adapter-codec`: record layouts, type encoders and the buffer codec
//! - `ndb-adapter-operation`: operation lifecycle, factory and reconciliation
//!
//! The native engine itself is not part of this crate; it is reached through
//! [`NativeTransaction`] and [`NativeOperation`].

pub use ndb_adapter_core::{
    AdapterError, ColumnMetadata, FieldHandler, IndexHandler, LockMode, NativeTypeId, OpCode,
    OperationState, RecordLayout, Result, Row, TableHandler, TransactionId, Value,
};

pub use ndb_adapter_codec::{
    default_for_type, BufferCodec, CodecError, EncoderRegistry, FixedRecord, IndexMetadata,
    NullBit, NullDecodePolicy, RecordBuffer, RecordColumn, TableMetadata, TypeEncoder,
};

pub use ndb_adapter_operation::{
    complete_executed_ops, testing, AdapterConfig, BatchSummary, NativeError, NativeOperation,
    NativeStatus, NativeTransaction, Operation, OperationBuffers, OperationError,
    OperationFactory, OperationResult, TupleSpec, CONFIG_FILE_NAME, DECODE_FAILURE_CODE,
};
