//! Fixed record layouts and record buffers
//!
//! # Record Layout
//!
//! A record is a fixed-size byte buffer. Each column owns a payload span at
//! a fixed offset; nullable columns also own one bit somewhere in the buffer.
//! [`FixedRecord::packed`] lays columns out back to back and appends the null
//! bitmap:
//!
//! ```text
//! ┌──────────────┬───────────────┬─────┬───────────────────────────┐
//! │ Column 0     │ Column 1      │ ... │ Null bitmap (1 bit/column)│
//! └──────────────┴───────────────┴─────┴───────────────────────────┘
//! ```
//!
//! Layouts that come from an engine dictionary can be described exactly
//! with [`FixedRecord::new`].

use ndb_adapter_core::{AdapterError, ColumnMetadata, RecordLayout, Result};
use std::fmt;
use std::ops::{Deref, DerefMut, Range};

/// Location of a column's null bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullBit {
    /// Byte offset within the record
    pub byte: usize,
    /// Bit within that byte (0 = least significant)
    pub bit: u8,
}

impl NullBit {
    fn mask(&self) -> u8 {
        1 << self.bit
    }
}

/// Placement of one column inside a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordColumn {
    /// Byte offset of the payload
    pub offset: usize,
    /// Payload width in bytes
    pub width: usize,
    /// Null bit, `None` for NOT NULL columns
    pub null_bit: Option<NullBit>,
}

impl RecordColumn {
    fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.width
    }
}

/// Record layout with fixed column offsets and null bits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRecord {
    columns: Vec<RecordColumn>,
    buffer_size: usize,
}

impl FixedRecord {
    /// Describe an explicit layout
    ///
    /// # Errors
    /// Returns `InvalidArgument` if a payload or null bit lies outside the
    /// buffer, two payloads overlap, a null bit sits inside a payload, or two
    /// columns share a null bit.
    pub fn new(columns: Vec<RecordColumn>, buffer_size: usize) -> Result<Self> {
        for (i, col) in columns.iter().enumerate() {
            match col.offset.checked_add(col.width) {
                Some(end) if end <= buffer_size => {}
                _ => {
                    return Err(AdapterError::invalid_argument(format!(
                        "column {} at offset {} with width {} exceeds record size {}",
                        i, col.offset, col.width, buffer_size
                    )))
                }
            }
            if let Some(nb) = col.null_bit {
                if nb.byte >= buffer_size || nb.bit > 7 {
                    return Err(AdapterError::invalid_argument(format!(
                        "column {} null bit {}:{} outside record",
                        i, nb.byte, nb.bit
                    )));
                }
            }
        }

        for (i, a) in columns.iter().enumerate() {
            for (j, b) in columns.iter().enumerate().skip(i + 1) {
                if a.width > 0 && b.width > 0 && overlaps(&a.span(), &b.span()) {
                    return Err(AdapterError::invalid_argument(format!(
                        "columns {} and {} overlap",
                        i, j
                    )));
                }
                if a.null_bit.is_some() && a.null_bit == b.null_bit {
                    return Err(AdapterError::invalid_argument(format!(
                        "columns {} and {} share a null bit",
                        i, j
                    )));
                }
            }
            for (j, other) in columns.iter().enumerate() {
                if let Some(nb) = other.null_bit {
                    if a.span().contains(&nb.byte) {
                        return Err(AdapterError::invalid_argument(format!(
                            "null bit of column {} lies inside column {}",
                            j, i
                        )));
                    }
                }
            }
        }

        Ok(Self {
            columns,
            buffer_size,
        })
    }

    /// Lay out columns back to back, followed by the null bitmap
    ///
    /// Only nullable columns get a null bit.
    pub fn packed(columns: &[ColumnMetadata]) -> Self {
        let mut offset = 0;
        let mut placed = Vec::with_capacity(columns.len());
        for col in columns {
            let width = col.storage_width();
            placed.push(RecordColumn {
                offset,
                width,
                null_bit: None,
            });
            offset += width;
        }

        let bitmap_start = offset;
        let mut nullable = 0usize;
        for (col, meta) in placed.iter_mut().zip(columns) {
            if meta.nullable {
                col.null_bit = Some(NullBit {
                    byte: bitmap_start + nullable / 8,
                    bit: (nullable % 8) as u8,
                });
                nullable += 1;
            }
        }

        Self {
            columns: placed,
            buffer_size: bitmap_start + (nullable + 7) / 8,
        }
    }

    /// Placement of a column
    pub fn column(&self, field: usize) -> Result<&RecordColumn> {
        self.columns.get(field).ok_or(AdapterError::FieldOutOfRange {
            field,
            count: self.columns.len(),
        })
    }

    /// All column placements
    pub fn columns(&self) -> &[RecordColumn] {
        &self.columns
    }

    fn null_bit(&self, field: usize) -> Result<Option<NullBit>> {
        Ok(self.column(field)?.null_bit)
    }

    fn check_buffer(&self, nb: NullBit, buffer_len: usize) -> Result<()> {
        if nb.byte >= buffer_len {
            return Err(AdapterError::OutOfBounds {
                offset: nb.byte,
                len: 1,
                size: buffer_len,
            });
        }
        Ok(())
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

impl RecordLayout for FixedRecord {
    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_offset(&self, field: usize) -> Result<usize> {
        Ok(self.column(field)?.offset)
    }

    fn set_null(&self, field: usize, buffer: &mut [u8]) -> Result<()> {
        let nb = self
            .null_bit(field)?
            .ok_or(AdapterError::NotNullable(field))?;
        self.check_buffer(nb, buffer.len())?;
        buffer[nb.byte] |= nb.mask();
        Ok(())
    }

    fn set_not_null(&self, field: usize, buffer: &mut [u8]) -> Result<()> {
        if let Some(nb) = self.null_bit(field)? {
            self.check_buffer(nb, buffer.len())?;
            buffer[nb.byte] &= !nb.mask();
        }
        Ok(())
    }

    fn is_null(&self, field: usize, buffer: &[u8]) -> Result<bool> {
        match self.null_bit(field)? {
            Some(nb) => {
                self.check_buffer(nb, buffer.len())?;
                Ok(buffer[nb.byte] & nb.mask() != 0)
            }
            None => Ok(false),
        }
    }
}

/// Owned, zero-initialised, fixed-length record buffer
///
/// The length is set at allocation and never changes.
#[derive(Clone, PartialEq, Eq)]
pub struct RecordBuffer(Box<[u8]>);

impl RecordBuffer {
    /// Allocate a zeroed buffer of `size` bytes
    pub fn zeroed(size: usize) -> Self {
        RecordBuffer(vec![0u8; size].into_boxed_slice())
    }

    /// Allocate a zeroed buffer sized for `record`
    pub fn for_record(record: &dyn RecordLayout) -> Self {
        Self::zeroed(record.buffer_size())
    }

    /// Buffer contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Mutable buffer contents
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Overwrite the whole buffer
    ///
    /// # Errors
    /// Returns `OutOfBounds` unless `src` has exactly the buffer's length.
    pub fn fill_from(&mut self, src: &[u8]) -> Result<()> {
        if src.len() != self.0.len() {
            return Err(AdapterError::OutOfBounds {
                offset: 0,
                len: src.len(),
                size: self.0.len(),
            });
        }
        self.0.copy_from_slice(src);
        Ok(())
    }
}

impl Deref for RecordBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl DerefMut for RecordBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl AsRef<[u8]> for RecordBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RecordBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordBuffer[{}](", self.0.len())?;
        for b in self.0.iter() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}
