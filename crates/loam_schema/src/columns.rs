//! Table and column definitions.
//!
//! A column's `data_type` never changes once committed. Conflicting values
//! go to variant columns instead, see [`crate::expansion`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Canonical data type used for columns (shared across crates).
pub use loam_protocol::DataType;

/// Ordered column map; insertion order is significant.
pub type TableColumns = IndexMap<String, ColumnSchema>;

fn is_false(b: &bool) -> bool {
    !*b
}

fn default_true() -> bool {
    true
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,

    /// Committed storage type
    pub data_type: DataType,

    /// Whether null values are allowed. May only tighten once committed.
    #[serde(default = "default_true")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub sort: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub cluster: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub partition: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub merge_key: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub root_key: bool,

    /// Set on columns created through variant expansion
    #[serde(default, skip_serializing_if = "is_false")]
    pub variant: bool,
}

impl ColumnSchema {
    /// Create a new nullable column
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            unique: false,
            sort: false,
            cluster: false,
            partition: false,
            primary_key: false,
            merge_key: false,
            root_key: false,
            variant: false,
        }
    }

    /// Create a new required (non-nullable) column
    pub fn required(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            nullable: false,
            ..Self::new(name, data_type)
        }
    }

    /// Set a hint flag
    pub fn with_hint(mut self, hint: ColumnHint) -> Self {
        self.set_hint(hint, true);
        self
    }

    pub fn set_hint(&mut self, hint: ColumnHint, on: bool) {
        match hint {
            ColumnHint::NotNull => self.nullable = !on,
            ColumnHint::Unique => self.unique = on,
            ColumnHint::Sort => self.sort = on,
            ColumnHint::Cluster => self.cluster = on,
            ColumnHint::Partition => self.partition = on,
            ColumnHint::PrimaryKey => self.primary_key = on,
            ColumnHint::MergeKey => self.merge_key = on,
            ColumnHint::RootKey => self.root_key = on,
            ColumnHint::Variant => self.variant = on,
        }
    }

    pub fn has_hint(&self, hint: ColumnHint) -> bool {
        match hint {
            ColumnHint::NotNull => !self.nullable,
            ColumnHint::Unique => self.unique,
            ColumnHint::Sort => self.sort,
            ColumnHint::Cluster => self.cluster,
            ColumnHint::Partition => self.partition,
            ColumnHint::PrimaryKey => self.primary_key,
            ColumnHint::MergeKey => self.merge_key,
            ColumnHint::RootKey => self.root_key,
            ColumnHint::Variant => self.variant,
        }
    }
}

/// Boolean column hints. `NotNull` maps onto `nullable = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnHint {
    NotNull,
    Unique,
    Sort,
    Cluster,
    Partition,
    PrimaryKey,
    MergeKey,
    RootKey,
    Variant,
}

impl ColumnHint {
    /// Flags that may be switched on by a later update.
    pub const FLAGS: [ColumnHint; 8] = [
        ColumnHint::Unique,
        ColumnHint::Sort,
        ColumnHint::Cluster,
        ColumnHint::Partition,
        ColumnHint::PrimaryKey,
        ColumnHint::MergeKey,
        ColumnHint::RootKey,
        ColumnHint::Variant,
    ];
}

/// How a destination writes rows of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDisposition {
    Append,
    Replace,
    Merge,
    Skip,
}

impl WriteDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteDisposition::Append => "append",
            WriteDisposition::Replace => "replace",
            WriteDisposition::Merge => "merge",
            WriteDisposition::Skip => "skip",
        }
    }
}

impl std::fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A table definition, also used for partial tables (updates).
///
/// The parent is a name; it is looked up in the owning schema every time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_disposition: Option<WriteDisposition>,

    #[serde(default)]
    pub columns: TableColumns,
}

impl TableSchema {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            write_disposition: None,
            columns: TableColumns::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_write_disposition(mut self, disposition: WriteDisposition) -> Self {
        self.write_disposition = Some(disposition);
        self
    }

    /// Append columns, keeping their order
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnSchema>) -> Self {
        for column in columns {
            self.columns.insert(column.name.clone(), column);
        }
        self
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.get(name)
    }

    /// Names of columns in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }
}
