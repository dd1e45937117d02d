//! Canonical storage types.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Data Types (Canonical Definition)
// ============================================================================

/// Canonical data type enum - the SINGLE SOURCE OF TRUTH for storage types.
///
/// Every field of every extracted record ends up in exactly one of these.
/// Destinations map them onto their own column types; the engine never
/// looks further than this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// UTF-8 string
    Text,

    /// 64-bit signed integer
    Bigint,

    /// 64-bit floating point
    Double,

    /// Fixed-point decimal (96-bit mantissa)
    Decimal,

    /// Boolean
    Bool,

    /// Timestamp in UTC
    Timestamp,

    /// Calendar date (no time component)
    Date,

    /// Raw bytes
    Binary,

    /// Nested lists and mappings, stored as JSON
    Complex,

    /// 256-bit integer with a decimal scale
    Wei,
}

impl DataType {
    /// Returns all canonical data types.
    pub fn all() -> Vec<DataType> {
        vec![
            DataType::Text,
            DataType::Bigint,
            DataType::Double,
            DataType::Decimal,
            DataType::Bool,
            DataType::Timestamp,
            DataType::Date,
            DataType::Binary,
            DataType::Complex,
            DataType::Wei,
        ]
    }

    /// Lowercase name used in stored schemas and variant column names.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Bigint => "bigint",
            DataType::Double => "double",
            DataType::Decimal => "decimal",
            DataType::Bool => "bool",
            DataType::Timestamp => "timestamp",
            DataType::Date => "date",
            DataType::Binary => "binary",
            DataType::Complex => "complex",
            DataType::Wei => "wei",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(DataType::Text),
            "bigint" => Ok(DataType::Bigint),
            "double" => Ok(DataType::Double),
            "decimal" => Ok(DataType::Decimal),
            "bool" => Ok(DataType::Bool),
            "timestamp" => Ok(DataType::Timestamp),
            "date" => Ok(DataType::Date),
            "binary" => Ok(DataType::Binary),
            "complex" => Ok(DataType::Complex),
            "wei" => Ok(DataType::Wei),
            other => Err(format!("Invalid data type: '{}'", other)),
        }
    }
}
