//! Column inference for first-seen values.

use loam_protocol::{classify, coerce_value, DataType, Value};

use crate::columns::{ColumnHint, ColumnSchema};
use crate::detections::autodetect_type;
use crate::settings::CompiledSettings;

/// Infer the storage type for a value seen in a column without a committed type.
///
/// Resolution order:
/// 1. Preferred type for `column_name`, when the value can be coerced to it.
///    A preferred type that rejects the value falls back to plain
///    classification, so detectors are skipped in that case.
/// 2. Detectors, in configured order.
/// 3. Plain classification.
///
/// `skip_preferred` bypasses step 1 only. Returns `None` for null values.
pub fn infer_column_type(
    settings: &CompiledSettings,
    value: &Value,
    column_name: &str,
    skip_preferred: bool,
) -> Option<DataType> {
    let from = classify(value)?;

    if !skip_preferred {
        if let Some(preferred) = settings.preferred_type(column_name) {
            return match coerce_value(preferred, from, value) {
                Ok(_) => Some(preferred),
                Err(_) => Some(from),
            };
        }
    }

    autodetect_type(settings.detections(), value, settings.reference_ts()).or(Some(from))
}

/// Build a new nullable column and apply naming-convention hints to it.
pub fn infer_column(
    settings: &CompiledSettings,
    column_name: &str,
    data_type: DataType,
    is_variant: bool,
) -> ColumnSchema {
    let mut column = ColumnSchema::new(column_name, data_type);
    for hint in settings.hints_for(column_name) {
        column.set_hint(hint, true);
    }
    if is_variant {
        column.set_hint(ColumnHint::Variant, true);
    }
    column
}
