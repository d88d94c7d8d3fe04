//! Core types for the adapter
//!
//! This module defines:
//! - NativeTypeId: storage engine column type identifiers
//! - ColumnMetadata: per-column description supplied by the catalog
//! - LockMode: lock requested by a read
//! - OpCode: the supported operation kinds
//! - OperationState: the operation lifecycle
//! - TransactionId: identifier of the owning adapter transaction

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column type identifiers as reported by the storage engine dictionary
///
/// The discriminants follow the engine's column type numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NativeTypeId {
    /// 8-bit signed integer
    Tinyint = 1,
    /// 8-bit unsigned integer
    Tinyunsigned = 2,
    /// 16-bit signed integer
    Smallint = 3,
    /// 16-bit unsigned integer
    Smallunsigned = 4,
    /// 32-bit signed integer
    Int = 7,
    /// 32-bit unsigned integer
    Unsigned = 8,
    /// 64-bit signed integer
    Bigint = 9,
    /// 64-bit unsigned integer
    Bigunsigned = 10,
    /// IEEE-754 single precision
    Float = 11,
    /// IEEE-754 double precision
    Double = 12,
    /// Fixed length text, space padded
    Char = 14,
    /// Text with a 1-byte length prefix
    Varchar = 15,
    /// Fixed length bytes, zero padded
    Binary = 16,
    /// Bytes with a 1-byte length prefix
    Varbinary = 17,
    /// Text with a 2-byte length prefix
    Longvarchar = 22,
    /// Bytes with a 2-byte length prefix
    Longvarbinary = 23,
}

impl NativeTypeId {
    /// Every type id the adapter knows about
    pub const ALL: [NativeTypeId; 16] = [
        NativeTypeId::Tinyint,
        NativeTypeId::Tinyunsigned,
        NativeTypeId::Smallint,
        NativeTypeId::Smallunsigned,
        NativeTypeId::Int,
        NativeTypeId::Unsigned,
        NativeTypeId::Bigint,
        NativeTypeId::Bigunsigned,
        NativeTypeId::Float,
        NativeTypeId::Double,
        NativeTypeId::Char,
        NativeTypeId::Varchar,
        NativeTypeId::Binary,
        NativeTypeId::Varbinary,
        NativeTypeId::Longvarchar,
        NativeTypeId::Longvarbinary,
    ];

    /// Engine type code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Bytes the column occupies in a record for a declared `length`.
    ///
    /// `length` is the character/byte capacity for the sized types and is
    /// ignored for numeric ones.
    pub fn storage_width(self, length: usize) -> usize {
        match self {
            NativeTypeId::Tinyint | NativeTypeId::Tinyunsigned => 1,
            NativeTypeId::Smallint | NativeTypeId::Smallunsigned => 2,
            NativeTypeId::Int | NativeTypeId::Unsigned | NativeTypeId::Float => 4,
            NativeTypeId::Bigint | NativeTypeId::Bigunsigned | NativeTypeId::Double => 8,
            NativeTypeId::Char | NativeTypeId::Binary => length,
            NativeTypeId::Varchar | NativeTypeId::Varbinary => 1 + length,
            NativeTypeId::Longvarchar | NativeTypeId::Longvarbinary => 2 + length,
        }
    }
}

/// Description of one mapped column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Field name in the logical row
    pub name: String,
    /// Native storage type
    pub type_id: NativeTypeId,
    /// Capacity in characters/bytes for sized types, 0 otherwise
    #[serde(default)]
    pub length: usize,
    /// Whether the column accepts null
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnMetadata {
    /// Create a nullable column
    pub fn new(name: impl Into<String>, type_id: NativeTypeId, length: usize) -> Self {
        Self {
            name: name.into(),
            type_id,
            length,
            nullable: true,
        }
    }

    /// Mark the column NOT NULL
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Bytes the column occupies in a record
    pub fn storage_width(&self) -> usize {
        self.type_id.storage_width(self.length)
    }
}

/// Lock requested by a read operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LockMode {
    /// Exclusive row lock
    Exclusive,
    /// Shared row lock
    Shared,
    /// Read latest committed value without locking
    Committed,
}

impl LockMode {
    /// The fixed set of lock modes
    pub const ALL: [LockMode; 3] = [LockMode::Exclusive, LockMode::Shared, LockMode::Committed];

    /// Canonical name
    pub fn as_str(self) -> &'static str {
        match self {
            LockMode::Exclusive => "EXCLUSIVE",
            LockMode::Shared => "SHARED",
            LockMode::Committed => "COMMITTED",
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockMode {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self> {
        LockMode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AdapterError::invalid_argument(format!("Unknown lock mode '{}'", s)))
    }
}

/// Supported operation kinds
///
/// Write (upsert) is deliberately absent; asking for one fails at the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Primary or unique key read
    Read,
    /// Insert a full row
    Insert,
    /// Update a row addressed by key
    Update,
    /// Delete a row addressed by key
    Delete,
}

impl OpCode {
    /// Lowercase name used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            OpCode::Read => "read",
            OpCode::Insert => "insert",
            OpCode::Update => "update",
            OpCode::Delete => "delete",
        }
    }

    /// Whether the operation is addressed through an index key
    pub fn uses_key(self) -> bool {
        !matches!(self, OpCode::Insert)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an operation
///
/// State transitions:
/// - `Defined` → `Prepared` (handed to the native transaction)
/// - `Prepared` → `Completed` (reconciled after batch execution)
///
/// There is no way back; `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationState {
    /// Built and encoded, not yet known to the engine
    Defined,
    /// Registered with the native transaction
    Prepared,
    /// Result reconciled
    Completed,
}

/// Identifier of the adapter transaction an operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}
