//! Variant capability.
//!
//! A value "supports variants" when it can tell the engine that it belongs in a
//! sibling column instead of the one it was addressed to. The engine asks via
//! [`VariantSource::resolve`] and receives a tagged outcome:
//!
//! - [`VariantResolution::Identity`]: no special handling, coerce normally
//! - [`VariantResolution::Typed`]: store `value` in the sibling column
//!   `<column>__v_<type_name>`
//!
//! A typed payload may itself support variants; the engine keeps resolving
//! until a producer answers `Identity` or stops being variant-capable.
//! Producers that never terminate are a caller bug.

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Outcome of asking a value where it belongs.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantResolution {
    /// Coerce the value into the addressed column as is.
    Identity,

    /// Reroute `value` into the sibling column derived from `type_name`.
    Typed { type_name: String, value: Value },
}

impl VariantResolution {
    /// Shorthand for building a typed resolution.
    pub fn typed(type_name: impl Into<String>, value: impl Into<Value>) -> Self {
        VariantResolution::Typed {
            type_name: type_name.into(),
            value: value.into(),
        }
    }
}

/// A value that can request variant handling.
///
/// `base_value` is the plain value used for classification and for direct
/// coercion into an existing column. It must never be a [`Value::Null`].
pub trait VariantSource: fmt::Debug + Send + Sync {
    /// The plain value this source stands for.
    fn base_value(&self) -> Value;

    /// Where this value belongs.
    fn resolve(&self) -> VariantResolution;
}

/// Shared handle to a [`VariantSource`], stored inside [`Value::Variant`].
#[derive(Clone)]
pub struct VariantValue {
    inner: Arc<dyn VariantSource>,
}

impl VariantValue {
    pub fn new(source: impl VariantSource + 'static) -> Self {
        Self {
            inner: Arc::new(source),
        }
    }

    pub fn base_value(&self) -> Value {
        self.inner.base_value()
    }

    pub fn resolve(&self) -> VariantResolution {
        self.inner.resolve()
    }
}

impl fmt::Debug for VariantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variant({:?})", self.inner)
    }
}

/// Two variant handles are equal when their base values and resolutions agree.
impl PartialEq for VariantValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.base_value() == other.base_value() && self.resolve() == other.resolve())
    }
}

impl From<VariantValue> for Value {
    fn from(v: VariantValue) -> Self {
        Value::Variant(v)
    }
}
