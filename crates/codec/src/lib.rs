//! Record buffer codec for the NDB operation adapter
//!
//! This crate turns logical rows into the engine's fixed record layout and
//! back:
//! - FixedRecord / RecordBuffer: record layouts and owned buffers
//! - TypeEncoder: per-type payload encoders (little-endian, engine formats)
//! - EncoderRegistry: injected native type -> encoder lookup
//! - BufferCodec: handler-driven encode/decode of whole records
//! - TableMetadata / IndexMetadata: metadata-backed table and index handlers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod codec;
pub mod encoder;
pub mod record;
pub mod registry;

pub use catalog::{IndexMetadata, TableMetadata};
pub use codec::{BufferCodec, NullDecodePolicy};
pub use encoder::{default_for_type, CodecError, TypeEncoder};
pub use record::{FixedRecord, NullBit, RecordBuffer, RecordColumn};
pub use registry::EncoderRegistry;
