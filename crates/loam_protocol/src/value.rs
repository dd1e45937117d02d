//! Runtime values as handed over by extractors.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::types::DataType;
use crate::variant::{VariantResolution, VariantValue};
use crate::wei::Wei;

/// A loosely typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Bigint(i64),
    Double(f64),
    Decimal(Decimal),
    Wei(Wei),
    Text(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    /// A value that may ask to be stored in a sibling column.
    Variant(VariantValue),
}

impl Value {
    /// Classify this value into its canonical type. `None` for null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DataType::Bool),
            Value::Bigint(_) => Some(DataType::Bigint),
            Value::Double(_) => Some(DataType::Double),
            Value::Decimal(_) => Some(DataType::Decimal),
            Value::Wei(_) => Some(DataType::Wei),
            Value::Text(_) => Some(DataType::Text),
            Value::Binary(_) => Some(DataType::Binary),
            Value::Date(_) => Some(DataType::Date),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::List(_) | Value::Map(_) => Some(DataType::Complex),
            Value::Variant(v) => v.base_value().data_type(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if the value can request variant handling.
    pub fn supports_variant(&self) -> bool {
        matches!(self, Value::Wei(_) | Value::Variant(_))
    }

    /// Ask a variant-capable value where it belongs. `None` for plain values.
    pub fn resolve_variant(&self) -> Option<VariantResolution> {
        match self {
            Value::Wei(w) => Some(w.resolve()),
            Value::Variant(v) => Some(v.resolve()),
            _ => None,
        }
    }

    /// The plain value, unwrapping variant handles.
    pub fn plain(&self) -> Value {
        match self {
            Value::Variant(v) => v.base_value().plain(),
            other => other.clone(),
        }
    }

    /// Render as JSON, the encoding used when complex values land in text columns.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Bigint(i) => JsonValue::from(*i),
            Value::Double(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Decimal(d) => JsonValue::String(d.to_string()),
            Value::Wei(w) => JsonValue::String(w.to_string()),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Binary(b) => JsonValue::String(format!("0x{}", hex::encode(b))),
            Value::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            Value::Timestamp(ts) => {
                JsonValue::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Variant(v) => v.base_value().to_json(),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Bigint(i)
                } else if n.is_u64() {
                    // above i64::MAX, keep every digit
                    Wei::parse(&n.to_string())
                        .map(Value::Wei)
                        .unwrap_or_else(|| Value::Double(n.as_f64().unwrap_or(f64::NAN)))
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::Text(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Bigint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<Wei> for Value {
    fn from(v: Wei) -> Self {
        Value::Wei(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}
