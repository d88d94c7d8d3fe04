//! Buffer codec
//!
//! Moves logical rows in and out of fixed-layout record buffers. The codec
//! is handler driven: the handler says which fields are mapped, what type
//! each has and which record they live in; the registry supplies the
//! encoder for each type.
//!
//! Encoding leaves every mapped column either null (null bit set, payload
//! untouched) or not null (payload written, null bit cleared). Any value
//! other than `Value::Null` is present, including zero and the empty string.

use crate::encoder::{CodecError, TypeEncoder};
use crate::record::RecordBuffer;
use crate::registry::EncoderRegistry;
use ndb_adapter_core::{
    AdapterError, ColumnMetadata, FieldHandler, NativeTypeId, Result, Row, Value,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What decode does with a column whose null bit is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullDecodePolicy {
    /// Consult the null bit and yield `Value::Null`
    #[default]
    Explicit,
    /// Decode payload bytes regardless of the null bit
    Raw,
}

/// Encoder/decoder between logical rows and record buffers
#[derive(Debug, Clone, Copy)]
pub struct BufferCodec<'r> {
    registry: &'r EncoderRegistry,
    null_policy: NullDecodePolicy,
}

impl<'r> BufferCodec<'r> {
    /// Codec over a registry, with explicit null decoding
    pub fn new(registry: &'r EncoderRegistry) -> Self {
        Self {
            registry,
            null_policy: NullDecodePolicy::default(),
        }
    }

    /// Change the null decode policy
    pub fn with_null_policy(mut self, policy: NullDecodePolicy) -> Self {
        self.null_policy = policy;
        self
    }

    /// Current null decode policy
    pub fn null_policy(&self) -> NullDecodePolicy {
        self.null_policy
    }

    /// The registry this codec reads encoders from
    pub fn registry(&self) -> &'r EncoderRegistry {
        self.registry
    }

    /// Allocate a buffer for the handler's record and encode `source` into it
    pub fn encode<H: FieldHandler + ?Sized>(&self, handler: &H, source: &Row) -> Result<RecordBuffer> {
        let mut buffer = RecordBuffer::for_record(handler.record());
        self.encode_into(handler, source, &mut buffer)?;
        Ok(buffer)
    }

    /// Encode `source` into an existing buffer
    ///
    /// # Errors
    /// - `OutOfBounds` if the buffer is not exactly the record size
    /// - `UnregisteredType` if any mapped column lacks an encoder
    /// - `Encoding` if a value does not fit its column
    /// - `NotNullable` if a NOT NULL column is absent
    pub fn encode_into<H: FieldHandler + ?Sized>(
        &self,
        handler: &H,
        source: &Row,
        destination: &mut [u8],
    ) -> Result<()> {
        let record = handler.record();
        check_size(record.buffer_size(), destination.len())?;
        let columns = mapped_columns(handler)?;
        let encoders = self.registry.resolve(columns)?;

        for (i, (column, encoder)) in columns.iter().zip(encoders).enumerate() {
            let value = handler.get(source, i);
            if value.is_present() {
                let offset = record.column_offset(i)?;
                encoder
                    .write(column, &value, destination, offset)
                    .map_err(|e| encode_error(i, column.type_id, e))?;
                record.set_not_null(i, destination)?;
            } else {
                debug!(field = i, column = %column.name, "encode: null");
                record.set_null(i, destination)?;
            }
        }
        Ok(())
    }

    /// Decode a buffer into a fresh logical row
    ///
    /// # Errors
    /// - `OutOfBounds` if the buffer is not exactly the record size
    /// - `UnregisteredType` if any mapped column lacks an encoder
    /// - `Decoding` if stored bytes are not valid for the column type
    pub fn decode<H: FieldHandler + ?Sized>(&self, handler: &H, source: &[u8]) -> Result<Row> {
        let record = handler.record();
        check_size(record.buffer_size(), source.len())?;
        let columns = mapped_columns(handler)?;
        let encoders = self.registry.resolve(columns)?;
        let mut row = handler.new_result_object();

        for (i, (column, encoder)) in columns.iter().zip(encoders).enumerate() {
            let value = if self.null_policy == NullDecodePolicy::Explicit
                && record.is_null(i, source)?
            {
                Value::Null
            } else {
                read_column(encoder, column, source, record.column_offset(i)?, i)?
            };
            handler.set(&mut row, i, value);
        }
        Ok(row)
    }
}

fn read_column(
    encoder: &dyn TypeEncoder,
    column: &ColumnMetadata,
    source: &[u8],
    offset: usize,
    field: usize,
) -> Result<Value> {
    encoder
        .read(column, source, offset)
        .map_err(|e| decode_error(field, column.type_id, e))
}

fn mapped_columns<H: FieldHandler + ?Sized>(handler: &H) -> Result<&[ColumnMetadata]> {
    let count = handler.mapped_field_count();
    let columns = handler.column_metadata();
    let record_columns = handler.record().column_count();
    if columns.len() < count || record_columns < count {
        return Err(AdapterError::invalid_argument(format!(
            "handler maps {} fields but has {} column descriptions and {} record columns",
            count,
            columns.len(),
            record_columns
        )));
    }
    Ok(&columns[..count])
}

fn check_size(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(AdapterError::OutOfBounds {
            offset: 0,
            len: expected,
            size: actual,
        });
    }
    Ok(())
}

fn encode_error(field: usize, type_id: NativeTypeId, err: CodecError) -> AdapterError {
    match err {
        CodecError::OutOfBounds { offset, len, size } => {
            AdapterError::OutOfBounds { offset, len, size }
        }
        other => AdapterError::encoding(field, type_id, other.to_string()),
    }
}

fn decode_error(field: usize, type_id: NativeTypeId, err: CodecError) -> AdapterError {
    match err {
        CodecError::OutOfBounds { offset, len, size } => {
            AdapterError::OutOfBounds { offset, len, size }
        }
        other => AdapterError::decoding(field, type_id, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableMetadata;
    use ndb_adapter_core::RecordLayout;

    fn people() -> TableMetadata {
        TableMetadata::new(
            "people",
            vec![
                ColumnMetadata::new("id", NativeTypeId::Int, 0),
                ColumnMetadata::new("name", NativeTypeId::Varchar, 14),
            ],
        )
    }

    #[test]
    fn test_encode_two_column_row() {
        let registry = EncoderRegistry::with_defaults();
        let codec = BufferCodec::new(&registry);
        let table = people();

        let row = Row::new().with("id", 7).with("name", "ann");
        let buf = codec.encode(&table, &row).unwrap();

        assert_eq!(buf.len(), 20);
        assert_eq!(&buf[0..4], &[7, 0, 0, 0]);
        assert_eq!(&buf[4..8], &[3, b'a', b'n', b'n']);
        assert_eq!(codec.decode(&table, &buf).unwrap(), row);
    }

    #[test]
    fn test_absent_value_sets_null_bit_only() {
        let registry = EncoderRegistry::with_defaults();
        let codec = BufferCodec::new(&registry);
        let table = people();

        let buf = codec.encode(&table, &Row::new().with("id", 7)).unwrap();
        assert!(table.record().is_null(1, &buf).unwrap());
        assert!(!table.record().is_null(0, &buf).unwrap());
        assert!(buf[4..19].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_explicit_null_value_is_absent() {
        let registry = EncoderRegistry::with_defaults();
        let codec = BufferCodec::new(&registry);
        let table = people();

        let row = Row::new().with("id", 1).with("name", Value::Null);
        let buf = codec.encode(&table, &row).unwrap();
        assert!(table.record().is_null(1, &buf).unwrap());
    }

    #[test]
    fn test_zero_and_empty_are_present() {
        let registry = EncoderRegistry::with_defaults();
        let codec = BufferCodec::new(&registry);
        let table = people();

        let row = Row::new().with("id", 0).with("name", "");
        let buf = codec.encode(&table, &row).unwrap();
        assert!(!table.record().is_null(0, &buf).unwrap());
        assert!(!table.record().is_null(1, &buf).unwrap());
        assert_eq!(codec.decode(&table, &buf).unwrap(), row);
    }

    #[test]
    fn test_reencode_clears_null_bit() {
        let registry = EncoderRegistry::with_defaults();
        let codec = BufferCodec::new(&registry);
        let table = people();

        let mut buf = codec.encode(&table, &Row::new()).unwrap();
        assert!(table.record().is_null(0, &buf).unwrap());
        codec
            .encode_into(&table, &Row::new().with("id", 3), &mut buf)
            .unwrap();
        assert!(!table.record().is_null(0, &buf).unwrap());
    }

    #[test]
    fn test_unregistered_type_fails_even_for_null_value() {
        let mut registry = EncoderRegistry::with_defaults();
        registry.unregister(NativeTypeId::Varchar);
        let codec = BufferCodec::new(&registry);

        let err = codec.encode(&people(), &Row::new().with("id", 1)).unwrap_err();
        assert_eq!(err, AdapterError::UnregisteredType(NativeTypeId::Varchar));
    }

    #[test]
    fn test_not_null_column_rejects_absent_value() {
        let registry = EncoderRegistry::with_defaults();
        let codec = BufferCodec::new(&registry);
        let table = TableMetadata::new(
            "t",
            vec![ColumnMetadata::new("id", NativeTypeId::Int, 0).not_null()],
        );
        assert_eq!(
            codec.encode(&table, &Row::new()).unwrap_err(),
            AdapterError::NotNullable(0)
        );
    }

    #[test]
    fn test_encoding_error_names_column() {
        let registry = EncoderRegistry::with_defaults();
        let codec = BufferCodec::new(&registry);
        let row = Row::new().with("id", 1).with("name", "a name far too long");
        match codec.encode(&people(), &row).unwrap_err() {
            AdapterError::Encoding {
                column, type_id, ..
            } => {
                assert_eq!(column, 1);
                assert_eq!(type_id, NativeTypeId::Varchar);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_wrong_buffer_size() {
        let registry = EncoderRegistry::with_defaults();
        let codec = BufferCodec::new(&registry);
        let mut small = vec![0u8; 10];
        assert!(matches!(
            codec.encode_into(&people(), &Row::new(), &mut small),
            Err(AdapterError::OutOfBounds { .. })
        ));
        assert!(matches!(
            codec.decode(&people(), &small),
            Err(AdapterError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_decode_null_policies() {
        let registry = EncoderRegistry::with_defaults();
        let table = people();
        let buf = BufferCodec::new(&registry)
            .encode(&table, &Row::new().with("id", 5))
            .unwrap();

        let explicit = BufferCodec::new(&registry).decode(&table, &buf).unwrap();
        assert_eq!(explicit.get("name"), Some(&Value::Null));

        let raw = BufferCodec::new(&registry)
            .with_null_policy(NullDecodePolicy::Raw)
            .decode(&table, &buf)
            .unwrap();
        // Payload bytes of a null column were never written: zero length prefix.
        assert_eq!(raw.get("name"), Some(&Value::String(String::new())));
    }
}
