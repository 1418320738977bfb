//! Routing engine health from `get-route-engine-information`.
//!
//! Field policy:
//! - `slot`: default `0`. Single-RE platforms omit it.
//! - `temperature`, `cpu-temperature`: optional, some platforms have no
//!   sensor. When present the `celsius` attribute is required and the
//!   Fahrenheit reading from the text becomes the `fahrenheit` label
//!   (`unknown` when the text cannot be read).
//! - `cpu-user`, `cpu-background`, `cpu-system`, `cpu-interrupt`,
//!   `cpu-idle`, `memory-buffer-utilization`: required.
//! - `start-time`, `up-time`: required, with their `seconds` attribute.

use junos_exposition::{LabelSet, MetricType, RawValue, Registry, parse_value};

use super::{
    ExtractError, Extractor, engine_sections, extract_or_default, required_attribute,
    required_text,
};
use crate::document::Element;
use crate::session::Rpc;

/// CPU fields and their `type` label. All but idle count towards `total`.
const CPU_FIELDS: [(&str, &str); 5] = [
    ("user", "cpu-user"),
    ("background", "cpu-background"),
    ("system", "cpu-system"),
    ("interrupt", "cpu-interrupt"),
    ("idle", "cpu-idle"),
];

/// CPU, memory, temperature and uptime per routing engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingEngineExtractor;

impl Extractor for RoutingEngineExtractor {
    fn name(&self) -> &'static str {
        "routing_engine"
    }

    fn rpc(&self) -> Rpc {
        Rpc::RouteEngineInformation
    }

    fn root(&self) -> &'static str {
        "route-engine-information"
    }

    fn series(&self) -> &'static [(&'static str, MetricType)] {
        &[
            ("cpuUsage", MetricType::Gauge),
            ("memoryUsage", MetricType::Gauge),
            ("cpuTemp", MetricType::Gauge),
            ("chassisTemp", MetricType::Gauge),
            ("startTime", MetricType::Gauge),
            ("upTime", MetricType::Gauge),
        ]
    }

    fn extract(&self, document: &Element, registry: &mut Registry) -> Result<(), ExtractError> {
        let sections = engine_sections(document, self.root())?;
        for engine in sections
            .iter()
            .flat_map(|(_, section)| section.find_all("route-engine"))
        {
            let fpc = extract_or_default(engine, "slot", "0");

            add_temperature(registry, "chassisTemp", engine, "temperature", fpc)?;
            add_temperature(registry, "cpuTemp", engine, "cpu-temperature", fpc)?;

            let mut total = 0.0;
            for (kind, path) in CPU_FIELDS {
                let raw = RawValue::from(required_text(engine, path)?);
                let labels = LabelSet::new().with("fpc", fpc).with("type", kind);
                registry.add_sample("cpuUsage", raw.clone(), labels)?;

                if kind != "idle" {
                    total += parse_value("cpuUsage", &raw)?;
                }
            }
            registry.add_sample(
                "cpuUsage",
                total,
                LabelSet::new().with("fpc", fpc).with("type", "total"),
            )?;

            let fpc_only = LabelSet::new().with("fpc", fpc);
            registry.add_sample(
                "memoryUsage",
                required_text(engine, "memory-buffer-utilization")?,
                fpc_only.clone(),
            )?;
            registry.add_sample(
                "startTime",
                required_attribute(engine, "start-time", "seconds")?,
                fpc_only.clone(),
            )?;
            registry.add_sample(
                "upTime",
                required_attribute(engine, "up-time", "seconds")?,
                fpc_only,
            )?;
        }

        Ok(())
    }
}

/// Add a temperature sample when the sensor element is present.
fn add_temperature(
    registry: &mut Registry,
    series: &str,
    engine: &Element,
    path: &str,
    fpc: &str,
) -> Result<(), ExtractError> {
    let Some(sensor) = engine.find(path) else {
        return Ok(());
    };

    let celsius = required_attribute(engine, path, "celsius")?;
    let fahrenheit = sensor.text().and_then(fahrenheit).unwrap_or("unknown");

    registry.add_sample(
        series,
        celsius,
        LabelSet::new().with("fpc", fpc).with("fahrenheit", fahrenheit),
    )?;
    Ok(())
}

/// The Fahrenheit figure of a reading like `40 degrees C / 104 degrees F`.
fn fahrenheit(reading: &str) -> Option<&str> {
    reading
        .split_once('/')
        .and_then(|(_, f)| f.split_whitespace().next())
}
