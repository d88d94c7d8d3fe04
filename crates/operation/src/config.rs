//! Adapter configuration via `ndb-adapter.toml`
//!
//! Every setting has a default, so an empty file (or no file at all) gives
//! the standard behavior.

use ndb_adapter_codec::NullDecodePolicy;
use ndb_adapter_core::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "ndb-adapter.toml";

/// Adapter configuration.
///
/// # Example
///
/// ```toml
/// # How decoded rows report null columns: "explicit" (default) or "raw"
/// null_decode = "explicit"
///
/// # Fail reconciliation when a batch contains unprepared operations
/// strict_reconcile = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Null handling when decoding rows.
    #[serde(default)]
    pub null_decode: NullDecodePolicy,
    /// Reject batches that contain operations that were never prepared.
    #[serde(default)]
    pub strict_reconcile: bool,
}

impl AdapterConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# NDB adapter configuration
#
# Null handling when decoding rows: "explicit" (default) or "raw"
#   "explicit" = a column whose null bit is set decodes as null
#   "raw"      = payload bytes are decoded regardless of the null bit
null_decode = "explicit"

# Fail reconciliation when a batch contains operations that were never
# prepared (default: false, such operations are logged and skipped)
strict_reconcile = false
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Config` if the text is not valid config.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AdapterError::config(format!("Failed to parse config: {}", e)))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            AdapterError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AdapterError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            AdapterError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
