//! Type detectors.
//!
//! Detectors are ordered heuristics that may pick a different canonical type
//! than plain classification. They only run for new columns without a
//! matching preferred type.

use loam_protocol::{coerce_value, parse_iso_datetime, DataType, Value};
use serde::{Deserialize, Serialize};

use crate::defaults::TIMESTAMP_DETECTION_RANGE_SECS;

/// A single detection heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    /// Integers and floats close to the reference time are epoch timestamps
    Timestamp,

    /// ISO-8601 date-time strings are timestamps
    IsoTimestamp,

    /// Binary values are stored as hex text
    HexbytesToText,

    /// Wei values are stored as doubles
    WeiToDouble,
}

impl Detection {
    /// Type this detector proposes for `value`, if any.
    ///
    /// `reference_ts` is "now" in epoch seconds, fixed when settings compile.
    pub fn detect(&self, value: &Value, reference_ts: f64) -> Option<DataType> {
        match (self, value.plain()) {
            (Detection::Timestamp, Value::Bigint(i)) => {
                is_near(i as f64, reference_ts).then_some(DataType::Timestamp)
            }
            (Detection::Timestamp, Value::Double(f)) => {
                is_near(f, reference_ts).then_some(DataType::Timestamp)
            }
            (Detection::IsoTimestamp, Value::Text(s)) => {
                parse_iso_datetime(&s).map(|_| DataType::Timestamp)
            }
            (Detection::HexbytesToText, Value::Binary(_)) => Some(DataType::Text),
            (Detection::WeiToDouble, Value::Wei(_)) => Some(DataType::Double),
            _ => None,
        }
    }
}

fn is_near(epoch: f64, reference_ts: f64) -> bool {
    epoch.is_finite() && (epoch - reference_ts).abs() <= TIMESTAMP_DETECTION_RANGE_SECS
}

/// First detected type the value can actually be coerced to.
pub fn autodetect_type(
    detections: &[Detection],
    value: &Value,
    reference_ts: f64,
) -> Option<DataType> {
    let from = value.data_type()?;
    detections.iter().find_map(|detection| {
        let detected = detection.detect(value, reference_ts)?;
        match coerce_value(detected, from, value) {
            Ok(_) => {
                tracing::trace!(?detection, data_type = %detected, "Type detected");
                Some(detected)
            }
            Err(_) => None,
        }
    })
}
