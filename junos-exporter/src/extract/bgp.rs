//! BGP peering from `get-bgp-summary-information`.
//!
//! Field policy:
//! - `peer-address`, `peer-state`: required. A `+port` suffix on the
//!   address is dropped.
//! - `peer-as`: default `unknown`.
//! - `flap-count`, `input-messages`, `output-messages`: default `0`.
//! - `elapsed-time`: its `seconds` attribute, default `0`.
//! - per RIB: `name` default `unknown`, prefix counts default `0`. Peers
//!   that are not established report no RIBs.

use junos_exposition::{LabelSet, MetricType, Registry};

use super::{
    ExtractError, Extractor, engine_sections, extract_or_default, required_text, status_value,
};
use crate::document::Element;
use crate::session::Rpc;

const PEER_COUNTERS: [(&str, &str); 3] = [
    ("bgpPeerFlaps", "flap-count"),
    ("bgpPeerInputMessages", "input-messages"),
    ("bgpPeerOutputMessages", "output-messages"),
];

const RIB_COUNTERS: [(&str, &str); 3] = [
    ("bgpPeerReceivedPrefixes", "received-prefix-count"),
    ("bgpPeerAcceptedPrefixes", "accepted-prefix-count"),
    ("bgpPeerActivePrefixes", "active-prefix-count"),
];

/// Session state, message counts and prefix counts per BGP peer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BgpExtractor;

impl Extractor for BgpExtractor {
    fn name(&self) -> &'static str {
        "bgp"
    }

    fn rpc(&self) -> Rpc {
        Rpc::BgpSummaryInformation
    }

    fn root(&self) -> &'static str {
        "bgp-information"
    }

    fn series(&self) -> &'static [(&'static str, MetricType)] {
        &[
            ("bgpPeerUp", MetricType::Gauge),
            ("bgpPeerFlaps", MetricType::Gauge),
            ("bgpPeerInputMessages", MetricType::Gauge),
            ("bgpPeerOutputMessages", MetricType::Gauge),
            ("bgpPeerElapsedSeconds", MetricType::Gauge),
            ("bgpPeerReceivedPrefixes", MetricType::Gauge),
            ("bgpPeerAcceptedPrefixes", MetricType::Gauge),
            ("bgpPeerActivePrefixes", MetricType::Gauge),
        ]
    }

    fn extract(&self, document: &Element, registry: &mut Registry) -> Result<(), ExtractError> {
        let sections = engine_sections(document, self.root())?;
        for peer in sections
            .iter()
            .flat_map(|(_, section)| section.find_all("bgp-peer"))
        {
            let address = strip_port(required_text(peer, "peer-address")?);
            let labels = LabelSet::new()
                .with("peerAddress", address)
                .with("peerAs", extract_or_default(peer, "peer-as", "unknown"));

            let state = required_text(peer, "peer-state")?;
            registry.add_sample("bgpPeerUp", status_value(state, "Established"), labels.clone())?;

            for (series, path) in PEER_COUNTERS {
                registry.add_sample(series, extract_or_default(peer, path, "0"), labels.clone())?;
            }

            let elapsed = peer
                .find("elapsed-time")
                .and_then(|e| e.attribute("seconds"))
                .unwrap_or("0");
            registry.add_sample("bgpPeerElapsedSeconds", elapsed, labels.clone())?;

            for rib in peer.find_all("bgp-rib") {
                let mut rib_labels = labels.clone();
                rib_labels.insert("table", extract_or_default(rib, "name", "unknown"));

                for (series, path) in RIB_COUNTERS {
                    registry.add_sample(
                        series,
                        extract_or_default(rib, path, "0"),
                        rib_labels.clone(),
                    )?;
                }
            }
        }

        Ok(())
    }
}

/// `10.0.0.1+179` → `10.0.0.1`. IPv6 addresses contain no `+`.
fn strip_port(address: &str) -> &str {
    address.split_once('+').map_or(address, |(host, _)| host)
}
