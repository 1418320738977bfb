//! The per-scrape metric registry.

use std::collections::HashMap;
use std::fmt::Write;

use crate::error::{ExpositionError, Result};
use crate::labels::LabelSet;
use crate::metric_type::MetricType;
use crate::sample::{RawValue, Sample, parse_value};
use crate::text::{format_value, is_valid_label_name, is_valid_metric_name, write_labels};

/// A declared series and the samples recorded against it.
#[derive(Debug, Clone)]
struct Series {
    name: String,
    metric_type: MetricType,
    samples: Vec<Sample>,
}

/// Declared series and their samples for one scrape.
///
/// Series render in declaration order, samples in insertion order. Samples
/// are never merged: adding the same label set twice yields two lines.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    series: Vec<Series>,
    /// Series name to position in `series`.
    index: HashMap<String, usize>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a series.
    ///
    /// Fails with [`ExpositionError::DuplicateSeries`] if the name was
    /// already declared, and with [`ExpositionError::InvalidSeriesName`] if
    /// it is not a valid metric name.
    pub fn register(&mut self, name: &str, metric_type: MetricType) -> Result<()> {
        if self.index.contains_key(name) {
            return Err(ExpositionError::DuplicateSeries {
                name: name.to_string(),
            });
        }
        if !is_valid_metric_name(name) {
            return Err(ExpositionError::InvalidSeriesName {
                name: name.to_string(),
            });
        }

        self.index.insert(name.to_string(), self.series.len());
        self.series.push(Series {
            name: name.to_string(),
            metric_type,
            samples: Vec::new(),
        });
        Ok(())
    }

    /// Append a sample to a declared series.
    ///
    /// The registry is left untouched when this returns an error.
    pub fn add_sample(
        &mut self,
        name: &str,
        value: impl Into<RawValue>,
        labels: LabelSet,
    ) -> Result<()> {
        let position = *self
            .index
            .get(name)
            .ok_or_else(|| ExpositionError::UnknownSeries {
                name: name.to_string(),
            })?;

        if let Some((label, _)) = labels.iter().find(|(k, _)| !is_valid_label_name(k)) {
            return Err(ExpositionError::InvalidLabelName {
                series: name.to_string(),
                label: label.to_string(),
            });
        }

        let value = parse_value(name, &value.into())?;

        let series = &mut self.series[position];
        series.samples.push(Sample {
            series_name: series.name.clone(),
            metric_type: series.metric_type,
            value,
            labels,
        });
        Ok(())
    }

    /// Whether a series with this name has been declared.
    pub fn is_registered(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Declared type of a series.
    pub fn metric_type(&self, name: &str) -> Option<MetricType> {
        self.index.get(name).map(|&i| self.series[i].metric_type)
    }

    /// Samples recorded against a series, in insertion order.
    pub fn samples(&self, name: &str) -> Option<&[Sample]> {
        self.index
            .get(name)
            .map(|&i| self.series[i].samples.as_slice())
    }

    /// Number of declared series.
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Total number of samples across all series.
    pub fn sample_count(&self) -> usize {
        self.series.iter().map(|s| s.samples.len()).sum()
    }

    /// Render the registry in text exposition format.
    ///
    /// Each series emits its `# TYPE` line followed by its samples. The
    /// document always ends with exactly one newline; an empty registry
    /// renders as `"\n"`.
    pub fn render(&self) -> String {
        let mut output = String::with_capacity(self.sample_count() * 64 + self.series.len() * 32);

        for series in &self.series {
            writeln!(output, "# TYPE {} {}", series.name, series.metric_type).ok();

            for sample in &series.samples {
                output.push_str(&series.name);
                write_labels(&mut output, &sample.labels);
                output.push(' ');
                output.push_str(&format_value(sample.value));
                output.push('\n');
            }
        }

        if output.is_empty() {
            output.push('\n');
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_duplicate_fails() {
        for ty in [MetricType::Gauge, MetricType::Counter, MetricType::Summary] {
            let mut registry = Registry::new();
            registry.register("upTime", ty).unwrap();

            let err = registry.register("upTime", MetricType::Gauge).unwrap_err();
            assert_eq!(
                err,
                ExpositionError::DuplicateSeries {
                    name: "upTime".to_string()
                }
            );
            assert_eq!(registry.series_count(), 1);
            assert_eq!(registry.metric_type("upTime"), Some(ty));
        }
    }

    #[test]
    fn test_register_invalid_name_fails() {
        let mut registry = Registry::new();
        let err = registry
            .register("iface-up", MetricType::Gauge)
            .unwrap_err();
        assert!(matches!(err, ExpositionError::InvalidSeriesName { .. }));
        assert!(!registry.is_registered("iface-up"));
    }

    #[test]
    fn test_add_sample_unknown_series() {
        let mut registry = Registry::new();
        registry.register("ifaceUp", MetricType::Gauge).unwrap();
        registry
            .add_sample("ifaceUp", 1.0, LabelSet::new().with("ifName", "ge-0/0/0"))
            .unwrap();

        let err = registry
            .add_sample("ifaceDown", 1.0, LabelSet::new())
            .unwrap_err();
        assert_eq!(
            err,
            ExpositionError::UnknownSeries {
                name: "ifaceDown".to_string()
            }
        );
        assert_eq!(registry.sample_count(), 1);
        assert!(!registry.is_registered("ifaceDown"));
    }

    #[test]
    fn test_add_sample_malformed_value() {
        let mut registry = Registry::new();
        registry.register("ifaceInputBps", MetricType::Gauge).unwrap();

        let err = registry
            .add_sample("ifaceInputBps", "N/A", LabelSet::new())
            .unwrap_err();
        assert!(matches!(err, ExpositionError::ValueParse { .. }));
        assert_eq!(registry.samples("ifaceInputBps").unwrap().len(), 0);
    }

    #[test]
    fn test_add_sample_invalid_label_name() {
        let mut registry = Registry::new();
        registry.register("vcPort", MetricType::Gauge).unwrap();

        let err = registry
            .add_sample("vcPort", 1.0, LabelSet::new().with("neighbor-id", "1"))
            .unwrap_err();
        assert_eq!(
            err,
            ExpositionError::InvalidLabelName {
                series: "vcPort".to_string(),
                label: "neighbor-id".to_string(),
            }
        );
        assert_eq!(registry.sample_count(), 0);
    }

    #[test]
    fn test_samples_keep_insertion_order_and_duplicates() {
        let mut registry = Registry::new();
        registry.register("cpuUsage", MetricType::Gauge).unwrap();

        let labels = LabelSet::new().with("fpc", "0");
        registry.add_sample("cpuUsage", "5", labels.clone()).unwrap();
        registry.add_sample("cpuUsage", "7", labels.clone()).unwrap();
        registry.add_sample("cpuUsage", "3", labels).unwrap();

        let values: Vec<f64> = registry
            .samples("cpuUsage")
            .unwrap()
            .iter()
            .map(|s| s.value)
            .collect();
        assert_eq!(values, vec![5.0, 7.0, 3.0]);

        let sample = &registry.samples("cpuUsage").unwrap()[0];
        assert_eq!(sample.series_name, "cpuUsage");
        assert_eq!(sample.metric_type, MetricType::Gauge);
    }

    #[test]
    fn test_render_empty_registry() {
        assert_eq!(Registry::new().render(), "\n");
    }

    #[test]
    fn test_render_series_without_samples() {
        let mut registry = Registry::new();
        registry.register("environmentItem", MetricType::Gauge).unwrap();
        assert_eq!(registry.render(), "# TYPE environmentItem gauge\n");
    }

    #[test]
    fn test_render_no_labels_omits_braces() {
        let mut registry = Registry::new();
        registry.register("upTime", MetricType::Gauge).unwrap();
        registry.add_sample("upTime", 12345.0, LabelSet::new()).unwrap();

        assert_eq!(registry.render(), "# TYPE upTime gauge\nupTime 12345.0\n");
    }

    #[test]
    fn test_render_escapes_label_values() {
        let mut registry = Registry::new();
        registry.register("environmentItem", MetricType::Gauge).unwrap();
        registry
            .add_sample(
                "environmentItem",
                1.0,
                LabelSet::new().with("name", "PSU \"0\"\\A\nB"),
            )
            .unwrap();

        assert_eq!(
            registry.render(),
            "# TYPE environmentItem gauge\nenvironmentItem{name=\"PSU \\\"0\\\"\\\\A\\nB\"} 1.0\n"
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut registry = Registry::new();
        registry.register("a", MetricType::Gauge).unwrap();
        registry.register("b", MetricType::Counter).unwrap();
        registry.add_sample("b", 2i64, LabelSet::new().with("x", "y")).unwrap();
        registry.add_sample("a", 1i64, LabelSet::new()).unwrap();

        let first = registry.render();
        let second = registry.render();
        assert_eq!(first, second);
        assert_eq!(first, "# TYPE a gauge\na 1.0\n# TYPE b counter\nb{x=\"y\"} 2.0\n");
    }
}
