//! Type encoders
//!
//! One encoder per native column type. An encoder reads and writes a single
//! column payload at a given offset of a record buffer and never touches a
//! byte outside `[offset, offset + column.storage_width())`.
//!
//! Numeric types are little-endian. Text and byte types follow the engine's
//! formats: fixed `Char` is space padded, fixed `Binary` is zero padded, and
//! the variable types carry a 1- or 2-byte little-endian length prefix.

use byteorder::{ByteOrder, LittleEndian};
use ndb_adapter_core::{ColumnMetadata, NativeTypeId, Value};

/// Errors raised by a single encoder call.
///
/// The buffer codec attaches the column position before surfacing these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Value variant does not fit the column type
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        /// What the column accepts
        expected: &'static str,
        /// Variant that was supplied
        actual: &'static str,
    },

    /// Number outside the range of the column type
    #[error("value {0} out of range")]
    OutOfRange(String),

    /// Text or bytes longer than the column capacity
    #[error("length {len} exceeds capacity {capacity}")]
    TooLong {
        /// Supplied length in bytes
        len: usize,
        /// Column capacity in bytes
        capacity: usize,
    },

    /// Stored text is not UTF-8
    #[error("invalid UTF-8 in stored text")]
    InvalidUtf8,

    /// Payload span falls outside the buffer
    #[error("{len} bytes at offset {offset} exceed {size}-byte buffer")]
    OutOfBounds {
        /// Start of the span
        offset: usize,
        /// Length of the span
        len: usize,
        /// Buffer size
        size: usize,
    },
}

/// Read/write capability for one native column type
pub trait TypeEncoder: Send + Sync {
    /// Decode the column payload at `offset`
    fn read(
        &self,
        column: &ColumnMetadata,
        buffer: &[u8],
        offset: usize,
    ) -> Result<Value, CodecError>;

    /// Encode `value` as the column payload at `offset`
    fn write(
        &self,
        column: &ColumnMetadata,
        value: &Value,
        buffer: &mut [u8],
        offset: usize,
    ) -> Result<(), CodecError>;
}

fn span(size: usize, offset: usize, len: usize) -> Result<std::ops::Range<usize>, CodecError> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(offset..end),
        _ => Err(CodecError::OutOfBounds { offset, len, size }),
    }
}

fn slot<'b>(buffer: &'b [u8], offset: usize, len: usize) -> Result<&'b [u8], CodecError> {
    let range = span(buffer.len(), offset, len)?;
    Ok(&buffer[range])
}

fn slot_mut<'b>(
    buffer: &'b mut [u8],
    offset: usize,
    len: usize,
) -> Result<&'b mut [u8], CodecError> {
    let range = span(buffer.len(), offset, len)?;
    Ok(&mut buffer[range])
}

fn mismatch(expected: &'static str, value: &Value) -> CodecError {
    CodecError::TypeMismatch {
        expected,
        actual: value.type_name(),
    }
}

/// Signed integers of 1, 2, 4 or 8 bytes
#[derive(Debug, Clone, Copy)]
pub struct SignedIntEncoder {
    width: usize,
}

impl SignedIntEncoder {
    /// Encoder for a signed integer of `width` bytes
    pub fn new(width: usize) -> Self {
        debug_assert!(matches!(width, 1 | 2 | 4 | 8));
        Self { width }
    }

    fn bounds(&self) -> (i64, i64) {
        match self.width {
            1 => (i8::MIN as i64, i8::MAX as i64),
            2 => (i16::MIN as i64, i16::MAX as i64),
            4 => (i32::MIN as i64, i32::MAX as i64),
            _ => (i64::MIN, i64::MAX),
        }
    }
}

impl TypeEncoder for SignedIntEncoder {
    fn read(&self, _: &ColumnMetadata, buffer: &[u8], offset: usize) -> Result<Value, CodecError> {
        let bytes = slot(buffer, offset, self.width)?;
        let v = match self.width {
            1 => bytes[0] as i8 as i64,
            2 => LittleEndian::read_i16(bytes) as i64,
            4 => LittleEndian::read_i32(bytes) as i64,
            _ => LittleEndian::read_i64(bytes),
        };
        Ok(Value::Int(v))
    }

    fn write(
        &self,
        _: &ColumnMetadata,
        value: &Value,
        buffer: &mut [u8],
        offset: usize,
    ) -> Result<(), CodecError> {
        let v = match value {
            Value::Int(v) => *v,
            Value::UInt(u) => {
                i64::try_from(*u).map_err(|_| CodecError::OutOfRange(u.to_string()))?
            }
            other => return Err(mismatch("Int", other)),
        };
        let (min, max) = self.bounds();
        if v < min || v > max {
            return Err(CodecError::OutOfRange(v.to_string()));
        }
        let bytes = slot_mut(buffer, offset, self.width)?;
        match self.width {
            1 => bytes[0] = v as i8 as u8,
            2 => LittleEndian::write_i16(bytes, v as i16),
            4 => LittleEndian::write_i32(bytes, v as i32),
            _ => LittleEndian::write_i64(bytes, v),
        }
        Ok(())
    }
}

/// Unsigned integers of 1, 2, 4 or 8 bytes
#[derive(Debug, Clone, Copy)]
pub struct UnsignedIntEncoder {
    width: usize,
}

impl UnsignedIntEncoder {
    /// Encoder for an unsigned integer of `width` bytes
    pub fn new(width: usize) -> Self {
        debug_assert!(matches!(width, 1 | 2 | 4 | 8));
        Self { width }
    }

    fn max(&self) -> u64 {
        match self.width {
            1 => u8::MAX as u64,
            2 => u16::MAX as u64,
            4 => u32::MAX as u64,
            _ => u64::MAX,
        }
    }
}

impl TypeEncoder for UnsignedIntEncoder {
    fn read(&self, _: &ColumnMetadata, buffer: &[u8], offset: usize) -> Result<Value, CodecError> {
        let bytes = slot(buffer, offset, self.width)?;
        let v = match self.width {
            1 => bytes[0] as u64,
            2 => LittleEndian::read_u16(bytes) as u64,
            4 => LittleEndian::read_u32(bytes) as u64,
            _ => LittleEndian::read_u64(bytes),
        };
        Ok(Value::UInt(v))
    }

    fn write(
        &self,
        _: &ColumnMetadata,
        value: &Value,
        buffer: &mut [u8],
        offset: usize,
    ) -> Result<(), CodecError> {
        let v = match value {
            Value::UInt(v) => *v,
            Value::Int(i) => u64::try_from(*i).map_err(|_| CodecError::OutOfRange(i.to_string()))?,
            other => return Err(mismatch("UInt", other)),
        };
        if v > self.max() {
            return Err(CodecError::OutOfRange(v.to_string()));
        }
        let bytes = slot_mut(buffer, offset, self.width)?;
        match self.width {
            1 => bytes[0] = v as u8,
            2 => LittleEndian::write_u16(bytes, v as u16),
            4 => LittleEndian::write_u32(bytes, v as u32),
            _ => LittleEndian::write_u64(bytes, v),
        }
        Ok(())
    }
}

/// IEEE-754 single precision
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatEncoder;

impl TypeEncoder for FloatEncoder {
    fn read(&self, _: &ColumnMetadata, buffer: &[u8], offset: usize) -> Result<Value, CodecError> {
        Ok(Value::Float(LittleEndian::read_f32(slot(buffer, offset, 4)?)))
    }

    fn write(
        &self,
        _: &ColumnMetadata,
        value: &Value,
        buffer: &mut [u8],
        offset: usize,
    ) -> Result<(), CodecError> {
        let v = match value {
            Value::Float(v) => *v,
            Value::Double(d) => *d as f32,
            other => return Err(mismatch("Float", other)),
        };
        LittleEndian::write_f32(slot_mut(buffer, offset, 4)?, v);
        Ok(())
    }
}

/// IEEE-754 double precision
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleEncoder;

impl TypeEncoder for DoubleEncoder {
    fn read(&self, _: &ColumnMetadata, buffer: &[u8], offset: usize) -> Result<Value, CodecError> {
        Ok(Value::Double(LittleEndian::read_f64(slot(buffer, offset, 8)?)))
    }

    fn write(
        &self,
        _: &ColumnMetadata,
        value: &Value,
        buffer: &mut [u8],
        offset: usize,
    ) -> Result<(), CodecError> {
        let v = match value {
            Value::Double(v) => *v,
            Value::Float(f) => *f as f64,
            other => return Err(mismatch("Double", other)),
        };
        LittleEndian::write_f64(slot_mut(buffer, offset, 8)?, v);
        Ok(())
    }
}

/// Fixed width payload: `Char` (text, space padded) or `Binary` (bytes, zero padded)
#[derive(Debug, Clone, Copy)]
pub struct FixedEncoder {
    text: bool,
}

impl FixedEncoder {
    /// Space padded text
    pub fn text() -> Self {
        Self { text: true }
    }

    /// Zero padded bytes
    pub fn binary() -> Self {
        Self { text: false }
    }

    fn pad(&self) -> u8 {
        if self.text {
            b' '
        } else {
            0
        }
    }
}

impl TypeEncoder for FixedEncoder {
    fn read(
        &self,
        column: &ColumnMetadata,
        buffer: &[u8],
        offset: usize,
    ) -> Result<Value, CodecError> {
        let bytes = slot(buffer, offset, column.length)?;
        if self.text {
            let end = bytes
                .iter()
                .rposition(|&b| b != b' ')
                .map_or(0, |p| p + 1);
            let s = std::str::from_utf8(&bytes[..end]).map_err(|_| CodecError::InvalidUtf8)?;
            Ok(Value::String(s.to_string()))
        } else {
            Ok(Value::Bytes(bytes.to_vec()))
        }
    }

    fn write(
        &self,
        column: &ColumnMetadata,
        value: &Value,
        buffer: &mut [u8],
        offset: usize,
    ) -> Result<(), CodecError> {
        let data: &[u8] = match (self.text, value) {
            (true, Value::String(s)) => s.as_bytes(),
            (false, Value::Bytes(b)) => b,
            (true, other) => return Err(mismatch("String", other)),
            (false, other) => return Err(mismatch("Bytes", other)),
        };
        if data.len() > column.length {
            return Err(CodecError::TooLong {
                len: data.len(),
                capacity: column.length,
            });
        }
        let bytes = slot_mut(buffer, offset, column.length)?;
        bytes[..data.len()].copy_from_slice(data);
        bytes[data.len()..].fill(self.pad());
        Ok(())
    }
}

/// Length prefixed payload: Varchar/Varbinary (1 byte) and the long variants (2 bytes)
#[derive(Debug, Clone, Copy)]
pub struct VarEncoder {
    prefix: usize,
    text: bool,
}

impl VarEncoder {
    /// Encoder with a `prefix`-byte length (1 or 2)
    pub fn new(prefix: usize, text: bool) -> Self {
        debug_assert!(matches!(prefix, 1 | 2));
        Self { prefix, text }
    }

    fn max_len(&self) -> usize {
        if self.prefix == 1 {
            u8::MAX as usize
        } else {
            u16::MAX as usize
        }
    }
}

impl TypeEncoder for VarEncoder {
    fn read(
        &self,
        column: &ColumnMetadata,
        buffer: &[u8],
        offset: usize,
    ) -> Result<Value, CodecError> {
        let head = slot(buffer, offset, self.prefix)?;
        let len = if self.prefix == 1 {
            head[0] as usize
        } else {
            LittleEndian::read_u16(head) as usize
        };
        if len > column.length {
            return Err(CodecError::TooLong {
                len,
                capacity: column.length,
            });
        }
        let data = slot(buffer, offset + self.prefix, len)?;
        if self.text {
            let s = std::str::from_utf8(data).map_err(|_| CodecError::InvalidUtf8)?;
            Ok(Value::String(s.to_string()))
        } else {
            Ok(Value::Bytes(data.to_vec()))
        }
    }

    fn write(
        &self,
        column: &ColumnMetadata,
        value: &Value,
        buffer: &mut [u8],
        offset: usize,
    ) -> Result<(), CodecError> {
        let data: &[u8] = match (self.text, value) {
            (true, Value::String(s)) => s.as_bytes(),
            (false, Value::Bytes(b)) => b,
            (true, other) => return Err(mismatch("String", other)),
            (false, other) => return Err(mismatch("Bytes", other)),
        };
        let capacity = column.length.min(self.max_len());
        if data.len() > capacity {
            return Err(CodecError::TooLong {
                len: data.len(),
                capacity,
            });
        }
        let bytes = slot_mut(buffer, offset, self.prefix + data.len())?;
        if self.prefix == 1 {
            bytes[0] = data.len() as u8;
        } else {
            LittleEndian::write_u16(&mut bytes[..2], data.len() as u16);
        }
        bytes[self.prefix..].copy_from_slice(data);
        Ok(())
    }
}

/// Built-in encoder for a native type
pub fn default_for_type(type_id: NativeTypeId) -> Box<dyn TypeEncoder> {
    match type_id {
        NativeTypeId::Tinyint => Box::new(SignedIntEncoder::new(1)),
        NativeTypeId::Smallint => Box::new(SignedIntEncoder::new(2)),
        NativeTypeId::Int => Box::new(SignedIntEncoder::new(4)),
        NativeTypeId::Bigint => Box::new(SignedIntEncoder::new(8)),
        NativeTypeId::Tinyunsigned => Box::new(UnsignedIntEncoder::new(1)),
        NativeTypeId::Smallunsigned => Box::new(UnsignedIntEncoder::new(2)),
        NativeTypeId::Unsigned => Box::new(UnsignedIntEncoder::new(4)),
        NativeTypeId::Bigunsigned => Box::new(UnsignedIntEncoder::new(8)),
        NativeTypeId::Float => Box::new(FloatEncoder),
        NativeTypeId::Double => Box::new(DoubleEncoder),
        NativeTypeId::Char => Box::new(FixedEncoder::text()),
        NativeTypeId::Binary => Box::new(FixedEncoder::binary()),
        NativeTypeId::Varchar => Box::new(VarEncoder::new(1, true)),
        NativeTypeId::Varbinary => Box::new(VarEncoder::new(1, false)),
        NativeTypeId::Longvarchar => Box::new(VarEncoder::new(2, true)),
        NativeTypeId::Longvarbinary => Box::new(VarEncoder::new(2, false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(type_id: NativeTypeId, length: usize) -> ColumnMetadata {
        ColumnMetadata::new("c", type_id, length)
    }

    #[test]
    fn test_int_little_endian_layout() {
        let c = col(NativeTypeId::Int, 0);
        let mut buf = [0u8; 8];
        default_for_type(NativeTypeId::Int)
            .write(&c, &Value::Int(7), &mut buf, 2)
            .unwrap();
        assert_eq!(buf, [0, 0, 7, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_negative_smallint() {
        let c = col(NativeTypeId::Smallint, 0);
        let enc = default_for_type(NativeTypeId::Smallint);
        let mut buf = [0u8; 2];
        enc.write(&c, &Value::Int(-2), &mut buf, 0).unwrap();
        assert_eq!(buf, [0xFE, 0xFF]);
        assert_eq!(enc.read(&c, &buf, 0).unwrap(), Value::Int(-2));
    }

    #[test]
    fn test_tinyint_out_of_range() {
        let c = col(NativeTypeId::Tinyint, 0);
        let mut buf = [0u8; 1];
        let err = default_for_type(NativeTypeId::Tinyint)
            .write(&c, &Value::Int(200), &mut buf, 0)
            .unwrap_err();
        assert!(matches!(err, CodecError::OutOfRange(_)));
        assert_eq!(buf, [0]);
    }

    #[test]
    fn test_unsigned_rejects_negative() {
        let c = col(NativeTypeId::Unsigned, 0);
        let mut buf = [0u8; 4];
        let err = default_for_type(NativeTypeId::Unsigned)
            .write(&c, &Value::Int(-1), &mut buf, 0)
            .unwrap_err();
        assert!(matches!(err, CodecError::OutOfRange(_)));
    }

    #[test]
    fn test_unsigned_accepts_non_negative_int() {
        let c = col(NativeTypeId::Bigunsigned, 0);
        let enc = default_for_type(NativeTypeId::Bigunsigned);
        let mut buf = [0u8; 8];
        enc.write(&c, &Value::Int(5), &mut buf, 0).unwrap();
        assert_eq!(enc.read(&c, &buf, 0).unwrap(), Value::UInt(5));
    }

    #[test]
    fn test_type_mismatch() {
        let c = col(NativeTypeId::Double, 0);
        let mut buf = [0u8; 8];
        let err = default_for_type(NativeTypeId::Double)
            .write(&c, &Value::String("x".into()), &mut buf, 0)
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                expected: "Double",
                actual: "String"
            }
        );
    }

    #[test]
    fn test_char_space_padded() {
        let c = col(NativeTypeId::Char, 5);
        let enc = default_for_type(NativeTypeId::Char);
        let mut buf = [0u8; 5];
        enc.write(&c, &Value::String("ab".into()), &mut buf, 0).unwrap();
        assert_eq!(&buf, b"ab   ");
        assert_eq!(enc.read(&c, &buf, 0).unwrap(), Value::String("ab".into()));
    }

    #[test]
    fn test_binary_zero_padded() {
        let c = col(NativeTypeId::Binary, 4);
        let enc = default_for_type(NativeTypeId::Binary);
        let mut buf = [0xAAu8; 4];
        enc.write(&c, &Value::Bytes(vec![1, 2]), &mut buf, 0).unwrap();
        assert_eq!(buf, [1, 2, 0, 0]);
    }

    #[test]
    fn test_varchar_prefix_and_payload() {
        let c = col(NativeTypeId::Varchar, 14);
        let enc = default_for_type(NativeTypeId::Varchar);
        let mut buf = [0u8; 15];
        enc.write(&c, &Value::String("ann".into()), &mut buf, 0).unwrap();
        assert_eq!(&buf[..4], &[3, b'a', b'n', b'n']);
        assert_eq!(enc.read(&c, &buf, 0).unwrap(), Value::String("ann".into()));
    }

    #[test]
    fn test_varchar_too_long() {
        let c = col(NativeTypeId::Varchar, 2);
        let mut buf = [0u8; 3];
        let err = default_for_type(NativeTypeId::Varchar)
            .write(&c, &Value::String("abc".into()), &mut buf, 0)
            .unwrap_err();
        assert_eq!(err, CodecError::TooLong { len: 3, capacity: 2 });
    }

    #[test]
    fn test_longvarbinary_two_byte_prefix() {
        let c = col(NativeTypeId::Longvarbinary, 300);
        let enc = default_for_type(NativeTypeId::Longvarbinary);
        let data = vec![9u8; 260];
        let mut buf = vec![0u8; 302];
        enc.write(&c, &Value::Bytes(data.clone()), &mut buf, 0).unwrap();
        assert_eq!(&buf[..2], &[4, 1]);
        assert_eq!(enc.read(&c, &buf, 0).unwrap(), Value::Bytes(data));
    }

    #[test]
    fn test_corrupt_length_prefix() {
        let c = col(NativeTypeId::Varbinary, 4);
        let buf = [200u8, 0, 0, 0, 0];
        let err = default_for_type(NativeTypeId::Varbinary)
            .read(&c, &buf, 0)
            .unwrap_err();
        assert!(matches!(err, CodecError::TooLong { len: 200, .. }));
    }

    #[test]
    fn test_write_past_end_is_rejected() {
        let c = col(NativeTypeId::Bigint, 0);
        let mut buf = [0u8; 10];
        let err = default_for_type(NativeTypeId::Bigint)
            .write(&c, &Value::Int(1), &mut buf, 4)
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::OutOfBounds {
                offset: 4,
                len: 8,
                size: 10
            }
        );
        assert_eq!(buf, [0u8; 10]);
    }

    #[test]
    fn test_invalid_utf8() {
        let c = col(NativeTypeId::Varchar, 4);
        let buf = [2u8, 0xFF, 0xFE, 0, 0];
        let err = default_for_type(NativeTypeId::Varchar)
            .read(&c, &buf, 0)
            .unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8);
    }
}
