//! Canonical default values for schema settings.

use indexmap::IndexMap;

use crate::columns::ColumnHint;
use crate::detections::Detection;

/// Engine version written into stored schemas.
pub const ENGINE_VERSION: u32 = 1;

/// Prefix that marks a column name pattern as a regular expression.
pub const REGEX_PATTERN_PREFIX: &str = "re:";

/// Numbers within this many seconds of "now" are detected as timestamps.
pub const TIMESTAMP_DETECTION_RANGE_SECS: f64 = 31_536_000.0;

/// Row identifier column
pub const ROW_ID_COLUMN: &str = "_loam_id";
/// Identifier of the root row a nested row belongs to
pub const ROOT_ID_COLUMN: &str = "_loam_root_id";
/// Identifier of the direct parent row
pub const PARENT_ID_COLUMN: &str = "_loam_parent_id";
/// Position of a nested row within its parent list
pub const LIST_IDX_COLUMN: &str = "_loam_list_idx";
/// Identifier of the load package
pub const LOAD_ID_COLUMN: &str = "_loam_load_id";

/// Detections enabled on a fresh schema.
pub fn default_detections() -> Vec<Detection> {
    vec![Detection::Timestamp, Detection::IsoTimestamp]
}

/// Naming-convention hints applied to newly inferred columns.
pub fn default_hints() -> IndexMap<ColumnHint, Vec<String>> {
    let mut hints = IndexMap::new();
    hints.insert(
        ColumnHint::NotNull,
        [
            ROW_ID_COLUMN,
            ROOT_ID_COLUMN,
            PARENT_ID_COLUMN,
            LIST_IDX_COLUMN,
            LOAD_ID_COLUMN,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    );
    hints.insert(ColumnHint::Unique, vec![ROW_ID_COLUMN.to_string()]);
    hints.insert(ColumnHint::RootKey, vec![ROOT_ID_COLUMN.to_string()]);
    hints
}
