//! Metric registry and text exposition for the Junos exporter.
//!
//! A [`Registry`] is built fresh for every scrape. Extractors declare the
//! series they produce, add labeled samples against them, and the registry
//! is rendered once into the text exposition format:
//!
//! ```text
//! # TYPE ifaceUp gauge
//! ifaceUp{ifName="xe-0/0/0"} 1.0
//! ifaceUp{ifName="xe-0/0/1"} 0.0
//! ```
//!
//! # Example
//!
//! ```
//! use junos_exposition::{LabelSet, MetricType, Registry};
//!
//! let mut registry = Registry::new();
//! registry.register("ifaceUp", MetricType::Gauge)?;
//! registry.add_sample("ifaceUp", 1.0, LabelSet::new().with("ifName", "xe-0/0/0"))?;
//!
//! assert_eq!(
//!     registry.render(),
//!     "# TYPE ifaceUp gauge\nifaceUp{ifName=\"xe-0/0/0\"} 1.0\n"
//! );
//! # Ok::<(), junos_exposition::ExpositionError>(())
//! ```

pub mod error;
pub mod labels;
pub mod metric_type;
pub mod registry;
pub mod sample;
mod text;

pub use error::{ExpositionError, Result};
pub use labels::LabelSet;
pub use metric_type::MetricType;
pub use registry::Registry;
pub use sample::{RawValue, Sample, parse_value};
