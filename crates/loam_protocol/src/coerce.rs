//! The coercion matrix.
//!
//! `coerce_value(to, from, value)` converts a value classified as `from` into
//! the canonical type `to`, or fails. It never guesses:
//!
//! - numbers only widen (`bigint -> double -> decimal`), nothing narrows back
//!   into `bigint`
//! - `bool` only comes from `bool` or a boolean literal in text
//! - text parses into the other scalar types when syntactically valid
//! - every type except `bool` renders into text: complex values as JSON,
//!   scalars as their plain string form
//! - timestamps and dates accept ISO-8601 strings and epoch seconds

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::str::FromStr;
use thiserror::Error;

use crate::types::DataType;
use crate::value::Value;
use crate::wei::Wei;

/// A value could not be represented in the target type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Cannot coerce {from} to {to}: {reason}")]
pub struct CoercionError {
    pub from: DataType,
    pub to: DataType,
    pub reason: String,
}

impl CoercionError {
    fn new(from: DataType, to: DataType, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
        }
    }
}

/// Naive date-time layouts accepted in addition to RFC 3339. Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset date-time layouts RFC 3339 parsing rejects (compact offsets).
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Coerce `value` (classified as `from`) into `to`.
///
/// Variant handles are coerced through their base value; the result is always
/// a plain value.
pub fn coerce_value(to: DataType, from: DataType, value: &Value) -> Result<Value, CoercionError> {
    let value = value.plain();
    if to == from {
        return Ok(value);
    }

    let fail = |reason: &str| CoercionError::new(from, to, reason);

    match (to, &value) {
        // ---- text ----------------------------------------------------------
        (DataType::Text, Value::List(_) | Value::Map(_)) => serde_json::to_string(&value.to_json())
            .map(Value::Text)
            .map_err(|e| fail(&e.to_string())),
        (DataType::Text, Value::Binary(bytes)) => Ok(Value::Text(format!("0x{}", hex::encode(bytes)))),
        (
            DataType::Text,
            Value::Bigint(_)
            | Value::Double(_)
            | Value::Decimal(_)
            | Value::Wei(_)
            | Value::Date(_)
            | Value::Timestamp(_),
        ) => match value.to_json() {
            JsonValue::String(s) => Ok(Value::Text(s)),
            JsonValue::Number(n) => Ok(Value::Text(n.to_string())),
            _ => Err(fail("not representable as text")),
        },

        // ---- bigint --------------------------------------------------------
        (DataType::Bigint, Value::Text(s)) => parse_bigint(s)
            .map(Value::Bigint)
            .ok_or_else(|| fail("not an integer literal")),

        // ---- double --------------------------------------------------------
        (DataType::Double, Value::Bigint(i)) => Ok(Value::Double(*i as f64)),
        (DataType::Double, Value::Decimal(d)) => d
            .to_f64()
            .map(Value::Double)
            .ok_or_else(|| fail("decimal out of range")),
        (DataType::Double, Value::Wei(w)) => {
            let f = w.to_f64();
            if f.is_finite() {
                Ok(Value::Double(f))
            } else {
                Err(fail("wei out of range"))
            }
        }
        (DataType::Double, Value::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Double)
            .ok_or_else(|| fail("not a float literal")),

        // ---- decimal -------------------------------------------------------
        (DataType::Decimal, Value::Bigint(i)) => Ok(Value::Decimal(Decimal::from(*i))),
        (DataType::Decimal, Value::Double(f)) => Decimal::from_f64(*f)
            .map(Value::Decimal)
            .ok_or_else(|| fail("float not representable as decimal")),
        (DataType::Decimal, Value::Wei(w)) => w
            .to_decimal()
            .map(Value::Decimal)
            .ok_or_else(|| fail("wei does not fit a 96-bit decimal")),
        (DataType::Decimal, Value::Text(s)) => parse_decimal(s)
            .map(Value::Decimal)
            .ok_or_else(|| fail("not a decimal literal")),

        // ---- wei -----------------------------------------------------------
        (DataType::Wei, Value::Bigint(i)) => Ok(Value::Wei(Wei::from_i64(*i))),
        (DataType::Wei, Value::Decimal(d)) => Wei::from_decimal(d)
            .map(Value::Wei)
            .ok_or_else(|| fail("decimal not representable as wei")),
        (DataType::Wei, Value::Text(s)) => Wei::parse(s)
            .map(Value::Wei)
            .ok_or_else(|| fail("not a decimal or hex literal")),

        // ---- bool ----------------------------------------------------------
        (DataType::Bool, Value::Text(s)) => parse_bool(s)
            .map(Value::Bool)
            .ok_or_else(|| fail("not a boolean literal")),

        // ---- timestamp -----------------------------------------------------
        (DataType::Timestamp, Value::Text(s)) => parse_iso_timestamp(s)
            .or_else(|| s.trim().parse::<f64>().ok().and_then(timestamp_from_epoch))
            .map(Value::Timestamp)
            .ok_or_else(|| fail("not an ISO-8601 timestamp or epoch")),
        (DataType::Timestamp, Value::Bigint(i)) => DateTime::from_timestamp(*i, 0)
            .map(Value::Timestamp)
            .ok_or_else(|| fail("epoch out of range")),
        (DataType::Timestamp, Value::Double(f)) => timestamp_from_epoch(*f)
            .map(Value::Timestamp)
            .ok_or_else(|| fail("epoch out of range")),
        (DataType::Timestamp, Value::Decimal(d)) => d
            .to_f64()
            .and_then(timestamp_from_epoch)
            .map(Value::Timestamp)
            .ok_or_else(|| fail("epoch out of range")),

        // ---- date ----------------------------------------------------------
        (DataType::Date, Value::Text(s)) => parse_iso_date(s)
            .or_else(|| parse_iso_datetime(s).map(|ts| ts.date_naive()))
            .or_else(|| {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(timestamp_from_epoch)
                    .map(|ts| ts.date_naive())
            })
            .map(Value::Date)
            .ok_or_else(|| fail("not an ISO-8601 date or epoch")),
        (DataType::Date, Value::Bigint(i)) => DateTime::from_timestamp(*i, 0)
            .map(|ts| Value::Date(ts.date_naive()))
            .ok_or_else(|| fail("epoch out of range")),
        (DataType::Date, Value::Double(f)) => timestamp_from_epoch(*f)
            .map(|ts| Value::Date(ts.date_naive()))
            .ok_or_else(|| fail("epoch out of range")),

        // ---- binary --------------------------------------------------------
        (DataType::Binary, Value::Text(s)) => parse_binary(s)
            .map(Value::Binary)
            .ok_or_else(|| fail("not hex or base64 encoded")),

        // ---- complex -------------------------------------------------------
        (DataType::Complex, Value::Text(s)) => match serde_json::from_str::<JsonValue>(s) {
            Ok(json @ (JsonValue::Array(_) | JsonValue::Object(_))) => Ok(Value::from(json)),
            Ok(_) => Err(fail("JSON is not an array or object")),
            Err(e) => Err(fail(&e.to_string())),
        },

        _ => Err(fail("unsupported conversion")),
    }
}

/// Parse an RFC 3339 / ISO-8601 date-time (time component required).
///
/// Naive date-times are taken as UTC.
pub fn parse_iso_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(value, format) {
            return Some(ts.with_timezone(&Utc));
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Parse an ISO-8601 timestamp; plain dates map to midnight UTC.
pub fn parse_iso_timestamp(value: &str) -> Option<DateTime<Utc>> {
    parse_iso_datetime(value).or_else(|| {
        parse_iso_date(value)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// Epoch seconds (fractional, microsecond precision) to a UTC timestamp.
pub fn timestamp_from_epoch(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let micros = (seconds * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64)
}

fn parse_bigint(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Some(hex_digits) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return i64::from_str_radix(hex_digits, 16).ok();
    }
    trimmed.parse::<i64>().ok()
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .ok()
        .or_else(|| Decimal::from_scientific(trimmed).ok())
}

fn parse_bool(value: &str) -> Option<bool> {
    let trimmed = value.trim();
    if ["true", "t", "yes", "1"]
        .iter()
        .any(|lit| trimmed.eq_ignore_ascii_case(lit))
    {
        Some(true)
    } else if ["false", "f", "no", "0"]
        .iter()
        .any(|lit| trimmed.eq_ignore_ascii_case(lit))
    {
        Some(false)
    } else {
        None
    }
}

fn parse_binary(value: &str) -> Option<Vec<u8>> {
    let trimmed = value.trim();
    if let Some(hex_digits) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return hex::decode(hex_digits).ok();
    }
    STANDARD.decode(trimmed).ok()
}
