//! Core types and traits for the NDB operation adapter
//!
//! This crate defines the foundational types used throughout the adapter:
//! - Value / Row: logical values and objects supplied by callers
//! - NativeTypeId / ColumnMetadata: column descriptions from the catalog
//! - LockMode, OpCode, OperationState, TransactionId
//! - AdapterError: error type hierarchy
//! - Traits: collaborator interfaces (RecordLayout, FieldHandler, TableHandler, IndexHandler)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;
pub mod value;

pub use error::{AdapterError, Result};
pub use traits::{FieldHandler, IndexHandler, RecordLayout, TableHandler};
pub use types::{ColumnMetadata, LockMode, NativeTypeId, OpCode, OperationState, TransactionId};
pub use value::{Row, Value};
