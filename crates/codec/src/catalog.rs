//! Table and index handlers backed by column metadata
//!
//! These are the handlers the catalog hands to the adapter. A table maps
//! every column of a row; an index maps the key columns, in key order, onto
//! its own key record.

use crate::record::FixedRecord;
use ndb_adapter_core::{
    AdapterError, ColumnMetadata, FieldHandler, IndexHandler, RecordLayout, Result, Row,
    TableHandler, Value,
};

/// Table handler with a fixed row record
#[derive(Debug, Clone)]
pub struct TableMetadata {
    name: String,
    columns: Vec<ColumnMetadata>,
    record: FixedRecord,
}

impl TableMetadata {
    /// Table whose row record is the packed layout of `columns`
    pub fn new(name: impl Into<String>, columns: Vec<ColumnMetadata>) -> Self {
        let record = FixedRecord::packed(&columns);
        Self {
            name: name.into(),
            columns,
            record,
        }
    }

    /// Table with an explicit row record
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the record does not have one column per
    /// metadata entry or a column slot is narrower than its type needs.
    pub fn with_record(
        name: impl Into<String>,
        columns: Vec<ColumnMetadata>,
        record: FixedRecord,
    ) -> Result<Self> {
        check_record(&columns, &record)?;
        Ok(Self {
            name: name.into(),
            columns,
            record,
        })
    }

    /// Column metadata
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// Position of a named column
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Build an index over the named key columns
    ///
    /// The key record is the packed layout of the key columns.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty key or an unknown column.
    pub fn index(&self, name: impl Into<String>, key_columns: &[&str]) -> Result<IndexMetadata<'_>> {
        if key_columns.is_empty() {
            return Err(AdapterError::invalid_argument("index needs at least one key column"));
        }
        let columns = key_columns
            .iter()
            .map(|k| {
                self.field_index(k)
                    .map(|i| self.columns[i].clone())
                    .ok_or_else(|| {
                        AdapterError::invalid_argument(format!(
                            "table {} has no column {}",
                            self.name, k
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        let record = FixedRecord::packed(&columns);
        Ok(IndexMetadata {
            name: name.into(),
            columns,
            record,
            table: Some(self),
        })
    }
}

fn check_record(columns: &[ColumnMetadata], record: &FixedRecord) -> Result<()> {
    if record.column_count() != columns.len() {
        return Err(AdapterError::invalid_argument(format!(
            "record has {} columns, metadata has {}",
            record.column_count(),
            columns.len()
        )));
    }
    for (i, (meta, placed)) in columns.iter().zip(record.columns()).enumerate() {
        if placed.width < meta.storage_width() {
            return Err(AdapterError::invalid_argument(format!(
                "column {} needs {} bytes, record gives {}",
                i,
                meta.storage_width(),
                placed.width
            )));
        }
    }
    Ok(())
}

fn get_named(columns: &[ColumnMetadata], row: &Row, field: usize) -> Value {
    columns
        .get(field)
        .and_then(|c| row.get(&c.name))
        .cloned()
        .unwrap_or(Value::Null)
}

fn set_named(columns: &[ColumnMetadata], row: &mut Row, field: usize, value: Value) {
    if let Some(c) = columns.get(field) {
        row.set(c.name.clone(), value);
    }
}

impl FieldHandler for TableMetadata {
    fn record(&self) -> &dyn RecordLayout {
        &self.record
    }

    fn mapped_field_count(&self) -> usize {
        self.columns.len()
    }

    fn column_metadata(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    fn get(&self, row: &Row, field: usize) -> Value {
        get_named(&self.columns, row, field)
    }

    fn set(&self, row: &mut Row, field: usize, value: Value) {
        set_named(&self.columns, row, field, value)
    }
}

impl TableHandler for TableMetadata {
    fn table_name(&self) -> &str {
        &self.name
    }
}

/// Index handler with its own key record
#[derive(Debug, Clone)]
pub struct IndexMetadata<'t> {
    name: String,
    columns: Vec<ColumnMetadata>,
    record: FixedRecord,
    table: Option<&'t TableMetadata>,
}

impl<'t> IndexMetadata<'t> {
    /// Index not linked to any table
    ///
    /// Key addressed operations refuse such an index.
    pub fn detached(name: impl Into<String>, columns: Vec<ColumnMetadata>) -> Self {
        let record = FixedRecord::packed(&columns);
        Self {
            name: name.into(),
            columns,
            record,
            table: None,
        }
    }

    /// Key column metadata
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }
}

impl FieldHandler for IndexMetadata<'_> {
    fn record(&self) -> &dyn RecordLayout {
        &self.record
    }

    fn mapped_field_count(&self) -> usize {
        self.columns.len()
    }

    fn column_metadata(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    fn get(&self, row: &Row, field: usize) -> Value {
        get_named(&self.columns, row, field)
    }

    fn set(&self, row: &mut Row, field: usize, value: Value) {
        set_named(&self.columns, row, field, value)
    }
}

impl IndexHandler for IndexMetadata<'_> {
    fn index_name(&self) -> &str {
        &self.name
    }

    fn table_handler(&self) -> Option<&dyn TableHandler> {
        self.table.map(|t| t as &dyn TableHandler)
    }
}
