use thiserror::Error;

/// Errors raised while building a metric registry.
///
/// Every variant except [`ExpositionError::ValueParse`] signals a bug in
/// the code feeding the registry. `ValueParse` signals garbled device data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpositionError {
    #[error("Metric named {name} is already registered")]
    DuplicateSeries { name: String },

    #[error("Metric named {name} is not registered")]
    UnknownSeries { name: String },

    #[error("Invalid value {raw:?} for metric {series}")]
    ValueParse { series: String, raw: String },

    #[error("Invalid metric name {name:?}")]
    InvalidSeriesName { name: String },

    #[error("Invalid label name {label:?} for metric {series}")]
    InvalidLabelName { series: String, label: String },
}

/// Result type alias using [`ExpositionError`].
pub type Result<T> = std::result::Result<T, ExpositionError>;
