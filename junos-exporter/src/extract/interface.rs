//! Interface counters from `get-interface-information extensive`.
//!
//! Field policy:
//! - `name`, `oper-status`: required.
//! - traffic, error and drop counters: default `0`. Junos omits them on
//!   interfaces that have never passed traffic or do not support them.
//! - logical interfaces: `name` required, transit counters default `0`.

use junos_exposition::{LabelSet, MetricType, Registry};

use super::{
    ExtractError, Extractor, engine_sections, extract_or_default, required_text, status_value,
};
use crate::document::Element;
use crate::session::Rpc;

/// Series name and the path of its counter under an interface element.
const PHYSICAL_COUNTERS: [(&str, &str); 8] = [
    ("ifaceInputBps", "traffic-statistics/input-bps"),
    ("ifaceOutputBps", "traffic-statistics/output-bps"),
    ("ifaceInputBytes", "traffic-statistics/input-bytes"),
    ("ifaceOutputBytes", "traffic-statistics/output-bytes"),
    ("ifaceInputErrors", "input-error-list/input-errors"),
    ("ifaceOutputErrors", "output-error-list/output-errors"),
    ("ifaceInputDrops", "input-error-list/input-drops"),
    ("ifaceOutputDrops", "output-error-list/output-drops"),
];

const TRANSIT_COUNTERS: [(&str, &str); 4] = [
    ("ifaceInputBps", "transit-traffic-statistics/input-bps"),
    ("ifaceOutputBps", "transit-traffic-statistics/output-bps"),
    ("ifaceInputBytes", "transit-traffic-statistics/input-bytes"),
    ("ifaceOutputBytes", "transit-traffic-statistics/output-bytes"),
];

/// Physical and logical interface traffic, errors and state.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterfaceExtractor;

impl Extractor for InterfaceExtractor {
    fn name(&self) -> &'static str {
        "interface"
    }

    fn rpc(&self) -> Rpc {
        Rpc::InterfaceInformation
    }

    fn root(&self) -> &'static str {
        "interface-information"
    }

    fn series(&self) -> &'static [(&'static str, MetricType)] {
        &[
            ("ifaceInputBps", MetricType::Gauge),
            ("ifaceOutputBps", MetricType::Gauge),
            ("ifaceInputBytes", MetricType::Gauge),
            ("ifaceOutputBytes", MetricType::Gauge),
            ("ifaceInputErrors", MetricType::Gauge),
            ("ifaceOutputErrors", MetricType::Gauge),
            ("ifaceInputDrops", MetricType::Gauge),
            ("ifaceOutputDrops", MetricType::Gauge),
            ("ifaceUp", MetricType::Gauge),
        ]
    }

    fn extract(&self, document: &Element, registry: &mut Registry) -> Result<(), ExtractError> {
        let sections = engine_sections(document, self.root())?;
        for interface in sections
            .iter()
            .flat_map(|(_, section)| section.find_all("physical-interface"))
        {
            let if_name = required_text(interface, "name")?;
            let labels = LabelSet::new().with("ifName", if_name);

            for (series, path) in &PHYSICAL_COUNTERS[..4] {
                registry.add_sample(
                    series,
                    extract_or_default(interface, path, "0"),
                    labels.clone(),
                )?;
            }

            let oper_status = required_text(interface, "oper-status")?;
            registry.add_sample("ifaceUp", status_value(oper_status, "up"), labels.clone())?;

            for (series, path) in &PHYSICAL_COUNTERS[4..] {
                registry.add_sample(
                    series,
                    extract_or_default(interface, path, "0"),
                    labels.clone(),
                )?;
            }

            for logical in interface.find_all("logical-interface") {
                let logical_name = required_text(logical, "name")?;
                let labels = LabelSet::new()
                    .with("ifName", logical_name)
                    .with("transit", 1);

                for (series, path) in &TRANSIT_COUNTERS {
                    registry.add_sample(
                        series,
                        extract_or_default(logical, path, "0"),
                        labels.clone(),
                    )?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::register_series;
    use crate::extract::test_support::doc;

    const REPLY: &str = r#"{
        "interface-information": [{
            "physical-interface": [
                {
                    "name": [{"data": "\nge-0/0/0\n"}],
                    "oper-status": [{"data": "up"}],
                    "traffic-statistics": [{
                        "input-bps": [{"data": "81920"}],
                        "output-bps": [{"data": "4096"}],
                        "input-bytes": [{"data": "123456789"}],
                        "output-bytes": [{"data": "987654321"}]
                    }],
                    "input-error-list": [{
                        "input-errors": [{"data": "3"}],
                        "input-drops": [{"data": "1"}]
                    }],
                    "output-error-list": [{
                        "output-errors": [{"data": "0"}],
                        "output-drops": [{"data": "2"}]
                    }],
                    "logical-interface": [{
                        "name": [{"data": "ge-0/0/0.0"}],
                        "transit-traffic-statistics": [{
                            "input-bps": [{"data": "800"}],
                            "output-bytes": [{"data": "555"}]
                        }]
                    }]
                },
                {
                    "name": [{"data": "ge-0/0/1"}],
                    "oper-status": [{"data": "down"}]
                }
            ]
        }]
    }"#;

    fn run(json: &str) -> Result<Registry, ExtractError> {
        let mut registry = Registry::new();
        register_series(&InterfaceExtractor, &mut registry)?;
        InterfaceExtractor.extract(&doc(json), &mut registry)?;
        Ok(registry)
    }

    #[test]
    fn test_physical_interface_metrics() {
        let output = run(REPLY).unwrap().render();

        assert!(output.contains("ifaceInputBps{ifName=\"ge-0/0/0\"} 81920.0\n"));
        assert!(output.contains("ifaceOutputBytes{ifName=\"ge-0/0/0\"} 987654321.0\n"));
        assert!(output.contains("ifaceUp{ifName=\"ge-0/0/0\"} 1.0\n"));
        assert!(output.contains("ifaceInputErrors{ifName=\"ge-0/0/0\"} 3.0\n"));
        assert!(output.contains("ifaceOutputDrops{ifName=\"ge-0/0/0\"} 2.0\n"));
    }

    #[test]
    fn test_absent_counters_default_to_zero() {
        let output = run(REPLY).unwrap().render();

        assert!(output.contains("ifaceUp{ifName=\"ge-0/0/1\"} 0.0\n"));
        assert!(output.contains("ifaceInputBps{ifName=\"ge-0/0/1\"} 0.0\n"));
        assert!(output.contains("ifaceInputDrops{ifName=\"ge-0/0/1\"} 0.0\n"));
    }

    #[test]
    fn test_logical_interfaces_use_transit_counters() {
        let registry = run(REPLY).unwrap();
        let output = registry.render();

        assert!(output.contains("ifaceInputBps{ifName=\"ge-0/0/0.0\",transit=\"1\"} 800.0\n"));
        assert!(output.contains("ifaceOutputBps{ifName=\"ge-0/0/0.0\",transit=\"1\"} 0.0\n"));
        assert!(output.contains("ifaceOutputBytes{ifName=\"ge-0/0/0.0\",transit=\"1\"} 555.0\n"));
        // Error counters are physical only
        assert!(!output.contains("ifaceInputErrors{ifName=\"ge-0/0/0.0\""));

        // Two physical interfaces plus one logical
        assert_eq!(registry.samples("ifaceInputBps").unwrap().len(), 3);
        assert_eq!(registry.samples("ifaceUp").unwrap().len(), 2);
    }

    #[test]
    fn test_samples_follow_document_order() {
        let registry = run(REPLY).unwrap();
        let names: Vec<_> = registry
            .samples("ifaceInputBps")
            .unwrap()
            .iter()
            .map(|s| s.labels.get("ifName").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["ge-0/0/0", "ge-0/0/0.0", "ge-0/0/1"]);
    }

    #[test]
    fn test_missing_oper_status_is_fatal() {
        let json = r#"{"interface-information": [{"physical-interface": [{"name": [{"data": "xe-0/0/0"}]}]}]}"#;
        assert!(matches!(run(json), Err(ExtractError::MissingField { .. })));
    }

    #[test]
    fn test_garbled_counter_is_fatal() {
        let json = r#"{"interface-information": [{"physical-interface": [{
            "name": [{"data": "xe-0/0/0"}],
            "oper-status": [{"data": "up"}],
            "traffic-statistics": [{"input-bps": [{"data": "N/A"}]}]
        }]}]}"#;
        assert!(matches!(run(json), Err(ExtractError::Exposition(_))));
    }

    #[test]
    fn test_empty_reply() {
        let registry = run(r#"{"interface-information": [{}]}"#).unwrap();
        assert_eq!(registry.sample_count(), 0);
        assert_eq!(registry.series_count(), 9);
    }

    #[test]
    fn test_error_reply_is_fatal() {
        let json = r#"{"rpc-error": [{"error-message": [{"data": "syntax error, expecting <command>"}]}]}"#;
        assert!(matches!(
            run(json),
            Err(ExtractError::UnexpectedRoot { expected: "interface-information", .. })
        ));
    }

    #[test]
    fn test_cluster_reply() {
        let json = r#"{"multi-routing-engine-results": [{"multi-routing-engine-item": [
            {
                "re-name": [{"data": "node0"}],
                "interface-information": [{"physical-interface": [
                    {"name": [{"data": "ge-0/0/0"}], "oper-status": [{"data": "up"}]}
                ]}]
            },
            {
                "re-name": [{"data": "node1"}],
                "interface-information": [{"physical-interface": [
                    {"name": [{"data": "ge-7/0/0"}], "oper-status": [{"data": "down"}]}
                ]}]
            }
        ]}]}"#;
        let output = run(json).unwrap().render();

        assert!(output.contains("ifaceUp{ifName=\"ge-0/0/0\"} 1.0\n"));
        assert!(output.contains("ifaceUp{ifName=\"ge-7/0/0\"} 0.0\n"));
    }
}
