//! Variant expansion.
//!
//! A value that cannot be stored in its column without loss is rerouted to a
//! sibling column named after a type (`<column>__v_<type>`) instead of being
//! dropped. Two things trigger a reroute:
//!
//! - the value itself asks for it through [`VariantResolution::Typed`]
//! - the value does not coerce into the committed column type (auto variant,
//!   named after the value's canonical type)
//!
//! A rerouted value is "final": when it still does not fit the sibling column
//! the row fails with [`SchemaError::CannotCoerceColumn`] naming the sibling.
//! Typed payloads may keep rerouting; the loop ends when a producer answers
//! [`VariantResolution::Identity`] or stops being variant-capable.

use loam_protocol::{
    classify, coerce_value, is_valid_variant_type, variant_column_name_with_limit, Value,
    VariantResolution,
};

use crate::columns::{ColumnSchema, TableColumns, TableSchema};
use crate::error::{SchemaError, SchemaResult};
use crate::inference::{infer_column, infer_column_type};
use crate::settings::CompiledSettings;

/// A value placed into its final column.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedValue {
    /// Column the value ends up in
    pub column: String,
    /// Value coerced to the column type
    pub value: Value,
    /// Column definition, when the column does not exist yet
    pub new_column: Option<ColumnSchema>,
}

/// Columns visible while coercing one row: the committed table plus columns
/// already proposed earlier in the same row.
#[derive(Debug, Clone, Copy)]
pub struct ColumnLookup<'a> {
    pub table_name: &'a str,
    pub table: Option<&'a TableSchema>,
    pub proposed: &'a TableColumns,
}

impl<'a> ColumnLookup<'a> {
    pub fn get(&self, column: &str) -> Option<&'a ColumnSchema> {
        self.table
            .and_then(|t| t.columns.get(column))
            .or_else(|| self.proposed.get(column))
    }
}

/// Coerce one field value, deriving variant columns as needed.
///
/// Returns `Ok(None)` when the value (or a variant payload) is null and the
/// target column accepts nulls, so the field is dropped from the row.
pub fn coerce_field(
    settings: &CompiledSettings,
    lookup: ColumnLookup<'_>,
    column: &str,
    value: Value,
) -> SchemaResult<Option<CoercedValue>> {
    let mut column = column.to_string();
    let mut value = value;
    let mut is_final = false;

    loop {
        let existing = lookup.get(&column);

        let Some(from) = classify(&value) else {
            if existing.is_some_and(|c| !c.nullable) {
                return Err(SchemaError::CannotCoerceNull {
                    table: lookup.table_name.to_string(),
                    column,
                });
            }
            return Ok(None);
        };

        let col_type = match existing {
            Some(c) => c.data_type,
            None => match infer_column_type(settings, &value, &column, is_final) {
                Some(t) => t,
                None => return Ok(None),
            },
        };

        match coerce_value(col_type, from, &value) {
            Ok(coerced) => {
                if from == col_type {
                    if let Some(VariantResolution::Typed { type_name, value: payload }) =
                        value.resolve_variant()
                    {
                        column = derive_typed(settings, lookup, &column, &type_name)?;
                        value = payload;
                        is_final = true;
                        continue;
                    }
                }

                let new_column = existing
                    .is_none()
                    .then(|| infer_column(settings, &column, col_type, is_final));
                return Ok(Some(CoercedValue {
                    column,
                    value: coerced,
                    new_column,
                }));
            }
            Err(_) => {
                if let Some(VariantResolution::Typed { type_name, value: payload }) =
                    value.resolve_variant()
                {
                    column = derive_typed(settings, lookup, &column, &type_name)?;
                    value = payload;
                    is_final = true;
                    continue;
                }

                if is_final {
                    return Err(SchemaError::CannotCoerceColumn {
                        table: lookup.table_name.to_string(),
                        column,
                        from_type: from,
                        to_type: col_type,
                        value: Some(value),
                    });
                }

                column = derive(settings, lookup, &column, from.as_str());
                is_final = true;
            }
        }
    }
}

/// Variant column for a type named by the value itself.
fn derive_typed(
    settings: &CompiledSettings,
    lookup: ColumnLookup<'_>,
    column: &str,
    type_name: &str,
) -> SchemaResult<String> {
    if !is_valid_variant_type(type_name) {
        return Err(SchemaError::InvalidVariantType {
            table: lookup.table_name.to_string(),
            column: column.to_string(),
            type_name: type_name.to_string(),
        });
    }
    Ok(derive(settings, lookup, column, type_name))
}

fn derive(
    settings: &CompiledSettings,
    lookup: ColumnLookup<'_>,
    column: &str,
    type_name: &str,
) -> String {
    let derived =
        variant_column_name_with_limit(column, type_name, settings.max_identifier_length());
    tracing::debug!(
        table = lookup.table_name,
        column,
        variant = %derived,
        "Routing value to variant column"
    );
    derived
}
