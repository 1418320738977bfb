//! Virtual chassis membership and VC port state.
//!
//! Member field policy:
//! - `member-id`, `member-status`: required.
//! - `member-serial-number`, `member-model`, `member-role`: default
//!   `unknown`. Slots configured but not present carry none of them.
//!
//! Port field policy:
//! - `re-name` (per member on multi-member replies), `port-name`,
//!   `port-status`: required.

use junos_exposition::{LabelSet, MetricType, Registry};

use super::{
    ExtractError, Extractor, engine_sections, extract_or_default, required_text, status_value,
};
use crate::document::Element;
use crate::session::Rpc;

/// Presence of each virtual chassis member.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualChassisExtractor;

impl Extractor for VirtualChassisExtractor {
    fn name(&self) -> &'static str {
        "virtual_chassis"
    }

    fn rpc(&self) -> Rpc {
        Rpc::VirtualChassisInformation
    }

    fn root(&self) -> &'static str {
        "virtual-chassis-information"
    }

    fn series(&self) -> &'static [(&'static str, MetricType)] {
        &[("virtualChassisMemberStatus", MetricType::Gauge)]
    }

    fn extract(&self, document: &Element, registry: &mut Registry) -> Result<(), ExtractError> {
        let sections = engine_sections(document, self.root())?;
        for member in sections
            .iter()
            .flat_map(|(_, section)| section.find_all("member-list/member"))
        {
            let status = required_text(member, "member-status")?;
            let labels = LabelSet::new()
                .with("status", status)
                .with("serial", extract_or_default(member, "member-serial-number", "unknown"))
                .with("model", extract_or_default(member, "member-model", "unknown"))
                .with("id", required_text(member, "member-id")?)
                .with("role", extract_or_default(member, "member-role", "unknown"));

            registry.add_sample(
                "virtualChassisMemberStatus",
                status_value(status, "Prsnt"),
                labels,
            )?;
        }

        Ok(())
    }
}

/// Link state of the virtual chassis ports on every member.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualChassisPortExtractor;

impl Extractor for VirtualChassisPortExtractor {
    fn name(&self) -> &'static str {
        "virtual_chassis_port"
    }

    fn rpc(&self) -> Rpc {
        Rpc::VirtualChassisPortInformation
    }

    fn root(&self) -> &'static str {
        "virtual-chassis-port-information"
    }

    fn series(&self) -> &'static [(&'static str, MetricType)] {
        &[("virtualChassisPortStatus", MetricType::Gauge)]
    }

    fn extract(&self, document: &Element, registry: &mut Registry) -> Result<(), ExtractError> {
        for (fpc, section) in engine_sections(document, self.root())? {
            for port in section.find_all("port-list/port-information") {
                let status = required_text(port, "port-status")?;
                let labels = LabelSet::new()
                    .with("fpc", fpc)
                    .with("status", status)
                    .with("portName", required_text(port, "port-name")?);

                registry.add_sample("virtualChassisPortStatus", status_value(status, "Up"), labels)?;
            }
        }

        Ok(())
    }
}
