//! Testing utilities for the operation lifecycle
//!
//! - **Memory Engine**: an in-memory stand-in for the native engine that
//!   defines operations through [`NativeTransaction`](crate::NativeTransaction),
//!   executes them against a key-ordered row map and reports NDB-style
//!   per-operation errors
//!
//! # Example
//!
//! ```ignore
//! use ndb_adapter_operation::testing::MemoryEngine;
//!
//! let mut engine = MemoryEngine::new(&registry, &table, &["id"])?;
//! let mut tx = engine.begin();
//! op.prepare(&mut tx)?;
//! engine.execute(tx, &mut ops)?;
//! factory.complete_executed_ops(&mut ops)?;
//! ```

mod memory_engine;

pub use memory_engine::{
    batch_abort, duplicate_key, tuple_not_found, MemoryEngine, MemoryTransaction,
};
