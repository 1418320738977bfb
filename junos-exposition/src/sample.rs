//! Samples and raw value coercion.

use crate::error::{ExpositionError, Result};
use crate::labels::LabelSet;
use crate::metric_type::MetricType;

/// One observation belonging to a declared series.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Name of the series this sample belongs to.
    pub series_name: String,
    /// Declared type of that series.
    pub metric_type: MetricType,
    /// The parsed value.
    pub value: f64,
    /// Labels, in the order the caller supplied them.
    pub labels: LabelSet,
}

/// A value as handed to the registry, before coercion to `f64`.
///
/// Device documents carry numbers as text, so `Text` is the common case.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Number(v as f64)
    }
}

impl From<u64> for RawValue {
    fn from(v: u64) -> Self {
        RawValue::Number(v as f64)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Number(f64::from(v))
    }
}

impl From<u32> for RawValue {
    fn from(v: u32) -> Self {
        RawValue::Number(f64::from(v))
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Number(if v { 1.0 } else { 0.0 })
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl From<&String> for RawValue {
    fn from(v: &String) -> Self {
        RawValue::Text(v.clone())
    }
}

/// Coerce a raw value into a float for the given series.
///
/// Text is trimmed before parsing. A token that is still not a number is an
/// error; it is never reported as zero.
pub fn parse_value(series: &str, raw: &RawValue) -> Result<f64> {
    match raw {
        RawValue::Number(v) => Ok(*v),
        RawValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ExpositionError::ValueParse {
                series: series.to_string(),
                raw: s.clone(),
            }),
    }
}
