//! The schema aggregate.
//!
//! [`Schema`] owns settings, tables and version bookkeeping. Rows are coerced
//! against it through `&self`; only [`Schema::update_schema`], the settings
//! mutators and [`Schema::bump_version`] change it.
//!
//! # Versioning
//!
//! `version_hash` is base64(sha256) of the canonical JSON of settings and
//! tables (object keys sorted at every level). Preferred type rules are also
//! hashed in declaration order, since the first matching rule wins. [`Schema::bump_version`]
//! increments `version` only when that hash changed, so replaying identical
//! updates converges on the same version.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use indexmap::IndexMap;
use loam_protocol::DataType;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::columns::{ColumnHint, TableColumns, TableSchema};
use crate::defaults::ENGINE_VERSION;
use crate::detections::Detection;
use crate::error::{SchemaError, SchemaResult};
use crate::settings::{CompiledSettings, SchemaSettings};
use crate::updater::{self, Row, SchemaDiff, Tables};

/// Authoritative, versioned schema.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    version: u64,
    version_hash: String,
    engine_version: u32,
    settings: SchemaSettings,
    compiled: CompiledSettings,
    tables: Tables,
}

/// Serializable form of a [`Schema`], as handed to a schema store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSchema {
    pub name: String,
    pub version: u64,
    pub version_hash: String,
    pub engine_version: u32,
    #[serde(default)]
    pub settings: SchemaSettings,
    #[serde(default)]
    pub tables: Tables,
}

#[derive(Serialize)]
struct HashedContent<'a> {
    settings: &'a SchemaSettings,
    tables: &'a Tables,
    /// Rule order decides which preferred type wins, so it is hashed as a list
    preferred_type_order: Vec<(&'a str, DataType)>,
}

impl Schema {
    /// Create an empty schema with default settings.
    pub fn new(name: impl Into<String>) -> SchemaResult<Self> {
        Self::with_settings(name, SchemaSettings::default())
    }

    /// Create an empty schema with the given settings.
    pub fn with_settings(name: impl Into<String>, settings: SchemaSettings) -> SchemaResult<Self> {
        let compiled = CompiledSettings::compile(&settings)?;
        let tables = Tables::new();
        let version_hash = content_hash(&settings, &tables)?;
        Ok(Self {
            name: name.into(),
            version: 0,
            version_hash,
            engine_version: ENGINE_VERSION,
            settings,
            compiled,
            tables,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn version_hash(&self) -> &str {
        &self.version_hash
    }

    pub fn engine_version(&self) -> u32 {
        self.engine_version
    }

    pub fn settings(&self) -> &SchemaSettings {
        &self.settings
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn get_table(&self, table_name: &str) -> Option<&TableSchema> {
        self.tables.get(table_name)
    }

    pub fn get_table_columns(&self, table_name: &str) -> Option<&TableColumns> {
        self.tables.get(table_name).map(|t| &t.columns)
    }

    /// Preferred type for a column name, first matching rule wins.
    pub fn get_preferred_type(&self, column_name: &str) -> Option<DataType> {
        self.compiled.preferred_type(column_name)
    }

    /// Replace the preferred type rules.
    pub fn set_preferred_types(
        &mut self,
        preferred_types: IndexMap<String, DataType>,
    ) -> SchemaResult<()> {
        let settings = SchemaSettings {
            preferred_types,
            ..self.settings.clone()
        };
        self.apply_settings(settings)
    }

    /// Replace the enabled detections.
    pub fn set_detections(&mut self, detections: Vec<Detection>) -> SchemaResult<()> {
        let settings = SchemaSettings {
            detections,
            ..self.settings.clone()
        };
        self.apply_settings(settings)
    }

    /// Add hint patterns, keeping existing ones.
    pub fn merge_hints(&mut self, hints: IndexMap<ColumnHint, Vec<String>>) -> SchemaResult<()> {
        let mut settings = self.settings.clone();
        for (hint, patterns) in hints {
            let existing = settings.default_hints.entry(hint).or_default();
            for pattern in patterns {
                if !existing.contains(&pattern) {
                    existing.push(pattern);
                }
            }
        }
        self.apply_settings(settings)
    }

    fn apply_settings(&mut self, settings: SchemaSettings) -> SchemaResult<()> {
        self.compiled = CompiledSettings::compile(&settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Coerce a row into `table_name`, see [`updater::coerce_row`].
    pub fn coerce_row(
        &self,
        table_name: &str,
        parent_table: Option<&str>,
        row: Row,
    ) -> SchemaResult<(Row, Option<TableSchema>)> {
        updater::coerce_row(&self.compiled, &self.tables, table_name, parent_table, row)
    }

    /// Merge a partial table, see [`updater::update_tables`].
    pub fn update_schema(&mut self, partial: &TableSchema) -> SchemaResult<SchemaDiff> {
        updater::update_tables(&mut self.tables, partial)
    }

    /// Hash of the current settings and tables.
    pub fn content_hash(&self) -> SchemaResult<String> {
        content_hash(&self.settings, &self.tables)
    }

    /// Returns true if content changed since the last version bump.
    pub fn is_modified(&self) -> SchemaResult<bool> {
        Ok(self.content_hash()? != self.version_hash)
    }

    /// Increment the version if content changed. Returns the current
    /// `(version, version_hash)`.
    pub fn bump_version(&mut self) -> SchemaResult<(u64, String)> {
        let hash = self.content_hash()?;
        if hash != self.version_hash {
            self.version += 1;
            self.version_hash = hash;
            tracing::debug!(
                schema = %self.name,
                version = self.version,
                hash = %self.version_hash,
                "Schema version bumped"
            );
        }
        Ok((self.version, self.version_hash.clone()))
    }

    pub fn to_stored(&self) -> StoredSchema {
        StoredSchema {
            name: self.name.clone(),
            version: self.version,
            version_hash: self.version_hash.clone(),
            engine_version: self.engine_version,
            settings: self.settings.clone(),
            tables: self.tables.clone(),
        }
    }

    /// Restore a schema. Fails for schemas written by a newer engine.
    pub fn from_stored(stored: StoredSchema) -> SchemaResult<Self> {
        if stored.engine_version > ENGINE_VERSION {
            return Err(SchemaError::UnsupportedEngineVersion {
                found: stored.engine_version,
                supported: ENGINE_VERSION,
            });
        }
        let compiled = CompiledSettings::compile(&stored.settings)?;
        Ok(Self {
            name: stored.name,
            version: stored.version,
            version_hash: stored.version_hash,
            engine_version: stored.engine_version,
            settings: stored.settings,
            compiled,
            tables: stored.tables,
        })
    }

    pub fn to_json(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_stored())?)
    }

    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let stored: StoredSchema = serde_json::from_str(json)?;
        Self::from_stored(stored)
    }
}

fn content_hash(settings: &SchemaSettings, tables: &Tables) -> SchemaResult<String> {
    let content = serde_json::to_value(HashedContent {
        settings,
        tables,
        preferred_type_order: settings
            .preferred_types
            .iter()
            .map(|(pattern, data_type)| (pattern.as_str(), *data_type))
            .collect(),
    })?;
    let canonical = serde_json::to_string(&sort_keys(content))?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(STANDARD.encode(hasher.finalize()))
}

fn sort_keys(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            JsonValue::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
