//! Collaborator interfaces
//!
//! The adapter does not own table metadata. The catalog hands it handlers
//! that describe how logical rows map onto a record and where each column
//! lives inside a record buffer. These traits are that boundary.

use crate::error::Result;
use crate::types::ColumnMetadata;
use crate::value::{Row, Value};

/// Fixed binary layout of a table or index record
///
/// A record buffer is always exactly [`buffer_size`](RecordLayout::buffer_size)
/// bytes. Each column has a fixed offset and, when nullable, a null bit
/// somewhere in the same buffer.
pub trait RecordLayout {
    /// Size in bytes of a buffer holding one record
    fn buffer_size(&self) -> usize;

    /// Number of columns in the record
    fn column_count(&self) -> usize;

    /// Byte offset of a column's payload
    ///
    /// # Errors
    /// Returns `FieldOutOfRange` for an unknown field.
    fn column_offset(&self, field: usize) -> Result<usize>;

    /// Mark a column null in `buffer`
    ///
    /// # Errors
    /// Returns `NotNullable` if the column has no null bit.
    fn set_null(&self, field: usize, buffer: &mut [u8]) -> Result<()>;

    /// Mark a column not null in `buffer`
    fn set_not_null(&self, field: usize, buffer: &mut [u8]) -> Result<()>;

    /// Whether the column is marked null in `buffer`
    ///
    /// Columns without a null bit are never null.
    fn is_null(&self, field: usize, buffer: &[u8]) -> Result<bool>;
}

/// Mapping between a logical row and the fields of a record
///
/// Field `i` of the handler corresponds to column `i` of its record.
pub trait FieldHandler {
    /// Layout of the record this handler maps onto
    fn record(&self) -> &dyn RecordLayout;

    /// Number of mapped fields
    fn mapped_field_count(&self) -> usize;

    /// Column metadata, one entry per mapped field
    fn column_metadata(&self) -> &[ColumnMetadata];

    /// Read field `field` out of a logical row; missing fields are `Null`
    fn get(&self, row: &Row, field: usize) -> Value;

    /// Store a value as field `field` of a logical row
    fn set(&self, row: &mut Row, field: usize, value: Value);

    /// Fresh logical object for decoded results
    fn new_result_object(&self) -> Row {
        Row::new()
    }
}

/// Handler for a whole table
pub trait TableHandler: FieldHandler {
    /// Table name, for diagnostics
    fn table_name(&self) -> &str;
}

/// Handler for an index of a table
pub trait IndexHandler: FieldHandler {
    /// Index name, for diagnostics
    fn index_name(&self) -> &str;

    /// The table this index belongs to
    ///
    /// `None` means the catalog handed out a detached index, which key
    /// addressed operations reject.
    fn table_handler(&self) -> Option<&dyn TableHandler>;
}
