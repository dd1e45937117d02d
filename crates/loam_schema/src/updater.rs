//! Row coercion and table merging.
//!
//! Both operations validate everything before anything is committed: a row
//! either coerces completely or fails, and a table update either merges
//! completely or leaves the tables untouched.

use std::fmt::Display;

use indexmap::IndexMap;
use loam_protocol::Value;

use crate::columns::{ColumnHint, TableColumns, TableSchema};
use crate::error::{SchemaError, SchemaResult};
use crate::expansion::{coerce_field, ColumnLookup};
use crate::settings::CompiledSettings;

/// A single record; field order is significant.
pub type Row = IndexMap<String, Value>;

/// Tables keyed by name, in creation order.
pub type Tables = IndexMap<String, TableSchema>;

/// Changes applied by an update: changed table name -> partial table holding
/// only what changed.
pub type SchemaDiff = IndexMap<String, TableSchema>;

/// Coerce a row into `table_name`.
///
/// Returns the coerced row and, when the row introduced columns, a partial
/// table with exactly those columns in first-seen order.
pub fn coerce_row(
    settings: &CompiledSettings,
    tables: &Tables,
    table_name: &str,
    parent_table: Option<&str>,
    row: Row,
) -> SchemaResult<(Row, Option<TableSchema>)> {
    let table = tables.get(table_name);
    let mut proposed = TableColumns::new();
    let mut coerced_row = Row::with_capacity(row.len());

    for (column, value) in row {
        let lookup = ColumnLookup {
            table_name,
            table,
            proposed: &proposed,
        };
        let Some(coerced) = coerce_field(settings, lookup, &column, value)? else {
            continue;
        };
        if let Some(new_column) = coerced.new_column {
            proposed.insert(coerced.column.clone(), new_column);
        }
        coerced_row.insert(coerced.column, coerced.value);
    }

    if proposed.is_empty() {
        return Ok((coerced_row, None));
    }

    tracing::debug!(
        table = table_name,
        columns = ?proposed.keys().collect::<Vec<_>>(),
        "Row proposes new columns"
    );
    let mut partial = TableSchema::new(table_name);
    partial.parent = parent_table.map(str::to_string);
    partial.columns = proposed;
    Ok((coerced_row, Some(partial)))
}

/// Merge a partial table into `tables`.
///
/// Returns the diff (empty when nothing changed). On error `tables` is not
/// modified.
pub fn update_tables(tables: &mut Tables, partial: &TableSchema) -> SchemaResult<SchemaDiff> {
    let mut diff = SchemaDiff::new();
    let table_name = &partial.name;

    if let Some(parent) = &partial.parent {
        if !tables.contains_key(parent) {
            return Err(SchemaError::ParentTableNotFound {
                table: table_name.clone(),
                parent: parent.clone(),
            });
        }
    }

    let Some(existing) = tables.get(table_name) else {
        tracing::info!(
            table = %table_name,
            columns = partial.columns.len(),
            "Adding table"
        );
        tables.insert(table_name.clone(), partial.clone());
        diff.insert(table_name.clone(), partial.clone());
        return Ok(diff);
    };

    let (merged, changes) = merge_table(existing, partial)?;
    if let Some(changes) = changes {
        if !changes.columns.is_empty() {
            tracing::info!(
                table = %table_name,
                columns = ?changes.columns.keys().collect::<Vec<_>>(),
                "Updating table columns"
            );
        }
        tables.insert(table_name.clone(), merged);
        diff.insert(table_name.clone(), changes);
    }
    Ok(diff)
}

/// Merge `partial` into a copy of `existing`.
///
/// Returns the merged table and the changes, `None` when nothing changed.
pub fn merge_table(
    existing: &TableSchema,
    partial: &TableSchema,
) -> SchemaResult<(TableSchema, Option<TableSchema>)> {
    let table_name = &existing.name;
    let mut merged = existing.clone();
    let mut changes = TableSchema::new(table_name.clone());

    changes.parent = merge_property(table_name, "parent", &mut merged.parent, &partial.parent)?;
    changes.write_disposition = merge_property(
        table_name,
        "write_disposition",
        &mut merged.write_disposition,
        &partial.write_disposition,
    )?;

    for (name, proposed) in &partial.columns {
        let Some(current) = merged.columns.get_mut(name) else {
            merged.columns.insert(name.clone(), proposed.clone());
            changes.columns.insert(name.clone(), proposed.clone());
            continue;
        };

        if current.data_type != proposed.data_type {
            return Err(SchemaError::CannotCoerceColumn {
                table: table_name.clone(),
                column: name.clone(),
                from_type: proposed.data_type,
                to_type: current.data_type,
                value: None,
            });
        }

        let mut changed = false;
        // nullability only tightens
        if current.nullable && !proposed.nullable {
            current.nullable = false;
            changed = true;
        }
        for hint in ColumnHint::FLAGS {
            if proposed.has_hint(hint) && !current.has_hint(hint) {
                current.set_hint(hint, true);
                changed = true;
            }
        }
        if changed {
            changes.columns.insert(name.clone(), current.clone());
        }
    }

    let changed = changes.parent.is_some()
        || changes.write_disposition.is_some()
        || !changes.columns.is_empty();
    Ok((merged, changed.then_some(changes)))
}

/// Returns the newly adopted value, if any.
fn merge_property<T: Clone + PartialEq + Display>(
    table_name: &str,
    prop_name: &str,
    current: &mut Option<T>,
    proposed: &Option<T>,
) -> SchemaResult<Option<T>> {
    match (current.as_ref(), proposed) {
        (Some(a), Some(b)) if a != b => Err(SchemaError::TablePropertiesConflict {
            table: table_name.to_string(),
            prop_name: prop_name.to_string(),
            val1: Some(a.to_string()),
            val2: Some(b.to_string()),
        }),
        (None, Some(b)) => {
            *current = Some(b.clone());
            Ok(Some(b.clone()))
        }
        _ => Ok(None),
    }
}
