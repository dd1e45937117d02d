//! Schema error types.

use loam_protocol::{DataType, Value};
use thiserror::Error;

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while coercing rows or merging table updates.
///
/// The first five are data errors the orchestration layer decides on (abort
/// the batch or skip the record). None of them are retried here.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A value (or a whole proposed column) does not fit a committed column type.
    #[error(
        "Cannot coerce column '{column}' in table '{table}' from {from_type} to {to_type}{}",
        .value.as_ref().map(|v| format!(" (value: {:?})", v)).unwrap_or_default()
    )]
    CannotCoerceColumn {
        table: String,
        column: String,
        from_type: DataType,
        to_type: DataType,
        /// The offending value; `None` when a whole column definition conflicts.
        value: Option<Value>,
    },

    /// Null supplied for a non-nullable column.
    #[error("Cannot coerce null into non-nullable column '{column}' in table '{table}'")]
    CannotCoerceNull { table: String, column: String },

    /// An update references a parent table that is not in the schema.
    #[error("Parent table '{parent}' of table '{table}' not found")]
    ParentTableNotFound { table: String, parent: String },

    /// Two table definitions disagree on a scalar property.
    #[error(
        "Table '{table}' property '{prop_name}' conflict: {} != {}",
        .val1.as_deref().unwrap_or("<unset>"),
        .val2.as_deref().unwrap_or("<unset>")
    )]
    TablePropertiesConflict {
        table: String,
        prop_name: String,
        val1: Option<String>,
        val2: Option<String>,
    },

    /// A variant-capable value named a type its column name cannot carry.
    #[error("Invalid variant type '{type_name}' for column '{column}' in table '{table}'")]
    InvalidVariantType {
        table: String,
        column: String,
        type_name: String,
    },

    /// A preferred type or hint pattern failed to compile.
    #[error("Invalid column name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A stored schema was written by a newer engine.
    #[error("Stored schema engine version {found} is newer than supported version {supported}")]
    UnsupportedEngineVersion { found: u32, supported: u32 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
