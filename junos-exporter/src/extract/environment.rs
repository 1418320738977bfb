//! Chassis sensors from `get-environment-information`.
//!
//! Field policy:
//! - `name`, `status`: required.
//! - `class`: Junos reports it only on the first item of each class group,
//!   so an item without one inherits the previous item's class, or
//!   `unknown` before any class has been seen.
//! - `temperature`: optional. When present its `celsius` attribute is
//!   required.

use junos_exposition::{LabelSet, MetricType, Registry};

use super::{
    ExtractError, Extractor, engine_sections, required_attribute, required_text, status_value,
};
use crate::document::Element;
use crate::session::Rpc;

/// Sensor status and temperature per environment item.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentExtractor;

impl Extractor for EnvironmentExtractor {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn rpc(&self) -> Rpc {
        Rpc::EnvironmentInformation
    }

    fn root(&self) -> &'static str {
        "environment-information"
    }

    fn series(&self) -> &'static [(&'static str, MetricType)] {
        &[
            ("environmentItem", MetricType::Gauge),
            ("environmentTemp", MetricType::Gauge),
        ]
    }

    fn extract(&self, document: &Element, registry: &mut Registry) -> Result<(), ExtractError> {
        let mut class = "unknown";

        let sections = engine_sections(document, self.root())?;
        for item in sections
            .iter()
            .flat_map(|(_, section)| section.find_all("environment-item"))
        {
            let name = required_text(item, "name")?;
            if let Some(item_class) = item.find_text("class") {
                class = item_class;
            }
            let labels = LabelSet::new().with("name", name).with("class", class);

            let status = required_text(item, "status")?;
            registry.add_sample("environmentItem", status_value(status, "OK"), labels.clone())?;

            if item.find("temperature").is_some() {
                let celsius = required_attribute(item, "temperature", "celsius")?;
                registry.add_sample("environmentTemp", celsius, labels)?;
            }
        }

        Ok(())
    }
}
