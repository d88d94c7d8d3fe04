//! Logical values and rows
//!
//! This module defines:
//! - Value: a single logical column value as seen by callers
//! - Row: a logical object, a set of named fields
//!
//! ## Presence
//!
//! Only [`Value::Null`] (or a field missing from the row) marks a column as
//! absent. Zero, the empty string and empty bytes are present values and are
//! encoded like any other.

use std::collections::BTreeMap;

/// Logical column value
///
/// Different variants are never equal, even if they hold the "same" number:
/// `Int(1) != UInt(1)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Signed integer (Tinyint, Smallint, Int, Bigint)
    Int(i64),
    /// Unsigned integer (the unsigned integer types)
    UInt(u64),
    /// Single precision float
    Float(f32),
    /// Double precision float
    Double(f64),
    /// UTF-8 text (Char, Varchar, Longvarchar)
    String(String),
    /// Raw bytes (Binary, Varbinary, Longvarbinary)
    Bytes(Vec<u8>),
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Int(_) => "Int",
            Value::UInt(_) => "UInt",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the value should be encoded as a payload
    pub fn is_present(&self) -> bool {
        !self.is_null()
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A logical object: named fields holding values
///
/// Rows are what callers hand to the adapter (keys and rows alike) and what
/// successful reads hand back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: BTreeMap<String, Value>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Get a field, `None` if it was never set
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Remove a field
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Number of fields set
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falsy_values_are_present() {
        assert!(Value::Int(0).is_present());
        assert!(Value::String(String::new()).is_present());
        assert!(Value::Bytes(vec![]).is_present());
        assert!(Value::Double(0.0).is_present());
        assert!(!Value::Null.is_present());
    }

    #[test]
    fn test_different_variants_never_equal() {
        assert_ne!(Value::Int(1), Value::UInt(1));
        assert_ne!(Value::Float(1.0), Value::Double(1.0));
        assert_ne!(Value::String("a".into()), Value::Bytes(b"a".to_vec()));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7i64)), Value::Int(7));
    }

    #[test]
    fn test_row_builder_and_lookup() {
        let row = Row::new().with("id", 7).with("name", "ann");
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("id"), Some(&Value::Int(7)));
        assert_eq!(row.get("name"), Some(&Value::String("ann".into())));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_row_set_replaces() {
        let mut row = Row::new().with("id", 1);
        row.set("id", 2);
        assert_eq!(row.get("id"), Some(&Value::Int(2)));
        assert_eq!(row.remove("id"), Some(Value::Int(2)));
        assert!(row.is_empty());
    }

    #[test]
    fn test_row_from_iter() {
        let row: Row = vec![("b", Value::Int(2)), ("a", Value::Int(1))]
            .into_iter()
            .collect();
        let names: Vec<&str> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
