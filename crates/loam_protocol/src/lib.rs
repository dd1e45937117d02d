//! Canonical storage types and runtime values
//!
//! This crate defines the vocabulary shared by everything that touches
//! extracted records:
//!
//! - [`DataType`]: the fixed set of canonical storage types
//! - [`Value`]: a loosely typed runtime value as produced by extractors
//! - [`Wei`]: 256-bit integers carried as decimals
//! - [`VariantSource`] / [`VariantResolution`]: the variant capability
//! - [`coerce_value`]: the coercion matrix between canonical types
//! - [`naming`]: deterministic variant column names

pub mod coerce;
pub mod naming;
pub mod types;
pub mod value;
pub mod variant;
pub mod wei;

// Re-export types for convenience
pub use coerce::{coerce_value, parse_iso_datetime, parse_iso_timestamp, CoercionError};
pub use naming::{
    is_valid_variant_type, shorten_identifier, variant_column_name, variant_column_name_with_limit,
};
pub use types::DataType;
pub use value::Value;
pub use variant::{VariantResolution, VariantSource, VariantValue};
pub use wei::Wei;

/// Canonical classification of a runtime value. `None` for null.
pub fn classify(value: &Value) -> Option<DataType> {
    value.data_type()
}
