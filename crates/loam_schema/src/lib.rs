//! Schema Inference Engine
//!
//! # Philosophy: Never Drop, Never Mutate
//!
//! Records arrive loosely typed. The engine turns them into typed rows against
//! an authoritative schema:
//!
//! 1. **Infer**: a first-seen field gets a column type from preferred type
//!    rules, detectors, or plain classification
//! 2. **Coerce**: later values are coerced into the committed type
//! 3. **Fork**: values that do not fit go to a sibling variant column
//!    (`<column>__v_<type>`); the committed type never changes
//! 4. **Merge**: proposed columns are merged into the schema as a diff
//! 5. **Version**: content hashing decides whether the version moves
//!
//! # Modules
//!
//! - [`columns`]: table and column definitions
//! - [`settings`]: preferred types, detections and hints, plus their compiled form
//! - [`detections`]: type detection heuristics
//! - [`inference`]: column type inference
//! - [`expansion`]: variant expansion for a single field
//! - [`updater`]: row coercion and table merging
//! - [`schema`]: the [`Schema`] aggregate and its stored form
//!
//! # Example
//!
//! ```
//! use loam_schema::{Row, Schema, Value};
//!
//! let mut schema = Schema::new("events").unwrap();
//! let row: Row = [("name".to_string(), Value::from("transfer"))].into_iter().collect();
//!
//! let (row, partial) = schema.coerce_row("event", None, row).unwrap();
//! assert_eq!(row["name"], Value::from("transfer"));
//!
//! let diff = schema.update_schema(&partial.unwrap()).unwrap();
//! assert!(diff.contains_key("event"));
//! assert_eq!(schema.bump_version().unwrap().0, 1);
//! ```

pub mod columns;
pub mod defaults;
pub mod detections;
pub mod error;
pub mod expansion;
pub mod inference;
pub mod schema;
pub mod settings;
pub mod updater;

pub use columns::*;
pub use detections::Detection;
pub use error::{SchemaError, SchemaResult};
pub use schema::{Schema, StoredSchema};
pub use settings::{CompiledSettings, SchemaSettings};
pub use updater::{Row, SchemaDiff, Tables};

// Re-export value types so callers need only this crate
pub use loam_protocol::{Value, VariantResolution, VariantSource, VariantValue, Wei};
