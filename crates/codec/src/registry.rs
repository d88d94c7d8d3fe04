//! Encoder registry
//!
//! Maps native column types to the encoder that reads and writes them.
//! The registry is built once at startup and handed to the buffer codec by
//! reference; there is no process-wide encoder table.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut registry = EncoderRegistry::with_defaults();
//!
//! // Override one type with a custom encoder
//! registry.register(NativeTypeId::Char, Arc::new(MyCharEncoder));
//!
//! // Look up by type ID
//! let encoder = registry.get(NativeTypeId::Int)?;
//! ```

use crate::encoder::{default_for_type, TypeEncoder};
use ndb_adapter_core::{AdapterError, ColumnMetadata, NativeTypeId, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of type encoders keyed by native type id
#[derive(Clone, Default)]
pub struct EncoderRegistry {
    encoders: HashMap<NativeTypeId, Arc<dyn TypeEncoder>>,
}

impl EncoderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in encoder for every native type
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for type_id in NativeTypeId::ALL {
            registry.register(type_id, Arc::from(default_for_type(type_id)));
        }
        registry
    }

    /// Register an encoder, returning the one it replaces
    pub fn register(
        &mut self,
        type_id: NativeTypeId,
        encoder: Arc<dyn TypeEncoder>,
    ) -> Option<Arc<dyn TypeEncoder>> {
        self.encoders.insert(type_id, encoder)
    }

    /// Unregister the encoder for a type
    pub fn unregister(&mut self, type_id: NativeTypeId) -> Option<Arc<dyn TypeEncoder>> {
        self.encoders.remove(&type_id)
    }

    /// Get the encoder for a type
    ///
    /// # Errors
    /// Returns `UnregisteredType` if no encoder is registered.
    pub fn get(&self, type_id: NativeTypeId) -> Result<&dyn TypeEncoder> {
        self.encoders
            .get(&type_id)
            .map(|e| &**e)
            .ok_or(AdapterError::UnregisteredType(type_id))
    }

    /// Resolve the encoder of every column, in column order
    ///
    /// Fails on the first column whose type has no encoder, whether or not a
    /// value is ever written to that column.
    pub fn resolve(&self, columns: &[ColumnMetadata]) -> Result<Vec<&dyn TypeEncoder>> {
        columns.iter().map(|c| self.get(c.type_id)).collect()
    }

    /// Check if a type has an encoder
    pub fn is_registered(&self, type_id: NativeTypeId) -> bool {
        self.encoders.contains_key(&type_id)
    }

    /// Get all registered type IDs, sorted by engine code
    pub fn type_ids(&self) -> Vec<NativeTypeId> {
        let mut ids: Vec<NativeTypeId> = self.encoders.keys().copied().collect();
        ids.sort_by_key(|t| t.code());
        ids
    }

    /// Number of registered encoders
    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

impl std::fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderRegistry")
            .field("types", &self.type_ids())
            .finish()
    }
}
