//! Schema settings and their compiled form.
//!
//! Settings are plain data (serde) so the configuration collaborator can load
//! them from anywhere. The engine compiles them once per schema instance:
//! exact names and `re:` regexes become [`NameMatcher`]s, evaluated in
//! declaration order, first match wins.

use chrono::Utc;
use indexmap::IndexMap;
use loam_protocol::DataType;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::columns::ColumnHint;
use crate::defaults::{default_detections, default_hints, REGEX_PATTERN_PREFIX};
use crate::detections::Detection;
use crate::error::{SchemaError, SchemaResult};

/// User-facing schema settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSettings {
    /// Column name pattern -> preferred type, in declaration order
    #[serde(default)]
    pub preferred_types: IndexMap<String, DataType>,

    /// Detectors consulted when no preferred type matches
    #[serde(default = "default_detections")]
    pub detections: Vec<Detection>,

    /// Hint -> column name patterns, applied to newly inferred columns
    #[serde(default = "default_hints")]
    pub default_hints: IndexMap<ColumnHint, Vec<String>>,

    /// Derived variant names longer than this are shortened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_identifier_length: Option<usize>,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            preferred_types: IndexMap::new(),
            detections: default_detections(),
            default_hints: default_hints(),
            max_identifier_length: None,
        }
    }
}

impl SchemaSettings {
    /// Add a preferred type rule (appended, so it has the lowest priority)
    pub fn with_preferred_type(mut self, pattern: impl Into<String>, data_type: DataType) -> Self {
        self.preferred_types.insert(pattern.into(), data_type);
        self
    }

    pub fn with_detections(mut self, detections: Vec<Detection>) -> Self {
        self.detections = detections;
        self
    }
}

/// Exact name or regex matcher compiled from a settings pattern.
#[derive(Debug, Clone)]
pub enum NameMatcher {
    Exact(String),
    Regex(Regex),
}

impl NameMatcher {
    /// Compile `re:<regex>` as an unanchored regex, anything else as an exact name.
    pub fn compile(pattern: &str) -> SchemaResult<Self> {
        match pattern.strip_prefix(REGEX_PATTERN_PREFIX) {
            Some(expr) => Regex::new(expr)
                .map(NameMatcher::Regex)
                .map_err(|source| SchemaError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                }),
            None => Ok(NameMatcher::Exact(pattern.to_string())),
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        match self {
            NameMatcher::Exact(exact) => exact == name,
            NameMatcher::Regex(re) => re.is_match(name),
        }
    }
}

/// Settings compiled for fast lookups.
#[derive(Debug, Clone)]
pub struct CompiledSettings {
    preferred_types: Vec<(NameMatcher, DataType)>,
    hints: Vec<(ColumnHint, Vec<NameMatcher>)>,
    detections: Vec<Detection>,
    max_identifier_length: Option<usize>,
    reference_ts: f64,
}

impl CompiledSettings {
    /// Compile settings, capturing the current time for timestamp detection.
    pub fn compile(settings: &SchemaSettings) -> SchemaResult<Self> {
        Self::compile_at(settings, Utc::now().timestamp() as f64)
    }

    /// Compile settings against an explicit reference time (epoch seconds).
    pub fn compile_at(settings: &SchemaSettings, reference_ts: f64) -> SchemaResult<Self> {
        let preferred_types = settings
            .preferred_types
            .iter()
            .map(|(pattern, data_type)| Ok((NameMatcher::compile(pattern)?, *data_type)))
            .collect::<SchemaResult<Vec<_>>>()?;

        let hints = settings
            .default_hints
            .iter()
            .map(|(hint, patterns)| {
                let matchers = patterns
                    .iter()
                    .map(|p| NameMatcher::compile(p))
                    .collect::<SchemaResult<Vec<_>>>()?;
                Ok((*hint, matchers))
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        Ok(Self {
            preferred_types,
            hints,
            detections: settings.detections.clone(),
            max_identifier_length: settings.max_identifier_length,
            reference_ts,
        })
    }

    /// First preferred type whose pattern matches `column_name`.
    pub fn preferred_type(&self, column_name: &str) -> Option<DataType> {
        self.preferred_types
            .iter()
            .find(|(matcher, _)| matcher.is_match(column_name))
            .map(|(_, data_type)| *data_type)
    }

    /// Hints whose patterns match `column_name`.
    pub fn hints_for<'a>(&'a self, column_name: &'a str) -> impl Iterator<Item = ColumnHint> + 'a {
        self.hints
            .iter()
            .filter(move |(_, matchers)| matchers.iter().any(|m| m.is_match(column_name)))
            .map(|(hint, _)| *hint)
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn max_identifier_length(&self) -> Option<usize> {
        self.max_identifier_length
    }

    pub fn reference_ts(&self) -> f64 {
        self.reference_ts
    }
}
