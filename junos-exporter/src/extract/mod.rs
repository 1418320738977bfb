//! Per-domain extraction of metrics from RPC replies.
//!
//! Each extractor owns a fixed set of series. The collector registers
//! [`Extractor::series`] before calling [`Extractor::extract`], so an
//! extractor only ever adds samples to series that already exist.
//!
//! Absent fields follow one of two policies, chosen per field and noted
//! in each extractor:
//! - default-safe: [`extract_or_default`] substitutes a value (usually `"0"`
//!   for counters the device omits on idle or down ports);
//! - required: [`required_text`] fails the scrape, because the reply is
//!   missing structure every healthy device reports.

mod bgp;
mod environment;
mod interface;
mod routing_engine;
mod storage;
mod virtual_chassis;

use junos_exposition::{ExpositionError, MetricType, Registry};
use thiserror::Error;

use crate::config::MetricKind;
use crate::document::Element;
use crate::session::Rpc;

pub use bgp::BgpExtractor;
pub use environment::EnvironmentExtractor;
pub use interface::InterfaceExtractor;
pub use routing_engine::RoutingEngineExtractor;
pub use storage::StorageExtractor;
pub use virtual_chassis::{VirtualChassisExtractor, VirtualChassisPortExtractor};

/// Errors raised while walking a reply.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("<{element}> has no <{path}>")]
    MissingField { element: String, path: String },

    #[error("<{path}> has no '{attribute}' attribute")]
    MissingAttribute { path: String, attribute: String },

    #[error("Expected a <{expected}> reply, found <{found}>")]
    UnexpectedRoot { expected: &'static str, found: String },

    #[error(transparent)]
    Exposition(#[from] ExpositionError),
}

/// Maps one RPC reply onto a set of series.
pub trait Extractor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// The RPC whose reply this extractor reads.
    fn rpc(&self) -> Rpc;

    /// Root element of a well-formed reply to [`Extractor::rpc`].
    fn root(&self) -> &'static str;

    /// Series this extractor declares, in declaration order.
    fn series(&self) -> &'static [(&'static str, MetricType)];

    /// Walk the reply and add samples.
    fn extract(&self, document: &Element, registry: &mut Registry) -> Result<(), ExtractError>;
}

/// Extractors for a metric kind, in collection order.
pub fn extractors_for(kind: MetricKind) -> Vec<Box<dyn Extractor>> {
    match kind {
        MetricKind::Interface => vec![Box::new(InterfaceExtractor)],
        MetricKind::Environment => vec![Box::new(EnvironmentExtractor)],
        MetricKind::VirtualChassis => vec![
            Box::new(VirtualChassisExtractor),
            Box::new(VirtualChassisPortExtractor),
        ],
        MetricKind::RoutingEngine => vec![Box::new(RoutingEngineExtractor)],
        MetricKind::Storage => vec![Box::new(StorageExtractor)],
        MetricKind::Bgp => vec![Box::new(BgpExtractor)],
    }
}

/// Declare every series an extractor produces.
pub fn register_series(
    extractor: &dyn Extractor,
    registry: &mut Registry,
) -> Result<(), ExpositionError> {
    for (name, metric_type) in extractor.series() {
        registry.register(name, *metric_type)?;
    }
    Ok(())
}

/// Text at `path` under `node`, or `default` when the field is absent or blank.
pub fn extract_or_default<'a>(node: &'a Element, path: &str, default: &'a str) -> &'a str {
    node.find_text(path).unwrap_or(default)
}

/// Text at `path` under `node`; absence fails the scrape.
pub fn required_text<'a>(node: &'a Element, path: &str) -> Result<&'a str, ExtractError> {
    node.find_text(path)
        .ok_or_else(|| ExtractError::MissingField {
            element: node.name().to_string(),
            path: path.to_string(),
        })
}

/// Attribute of the element at `path` under `node`; absence of either fails the scrape.
pub fn required_attribute<'a>(
    node: &'a Element,
    path: &str,
    attribute: &str,
) -> Result<&'a str, ExtractError> {
    let element = node.find(path).ok_or_else(|| ExtractError::MissingField {
        element: node.name().to_string(),
        path: path.to_string(),
    })?;

    element
        .attribute(attribute)
        .ok_or_else(|| ExtractError::MissingAttribute {
            path: path.to_string(),
            attribute: attribute.to_string(),
        })
}

/// Label used for the routing engine of a reply that is not split per member.
pub(crate) const LOCAL_ENGINE: &str = "local";

/// Per-member sections of a reply, with the member name.
///
/// On virtual chassis and multi-RE systems the reply root is
/// `multi-routing-engine-results` and each `multi-routing-engine-item`
/// carries its `re-name` and one `root` element. Otherwise the reply root
/// must be `root` itself and is reported under [`LOCAL_ENGINE`]. Any other
/// root, such as an `rpc-error`, fails.
pub(crate) fn engine_sections<'a>(
    document: &'a Element,
    root: &'static str,
) -> Result<Vec<(&'a str, &'a Element)>, ExtractError> {
    if document.name() == root {
        return Ok(vec![(LOCAL_ENGINE, document)]);
    }
    if document.name() != "multi-routing-engine-results" {
        return Err(ExtractError::UnexpectedRoot {
            expected: root,
            found: document.name().to_string(),
        });
    }

    let mut sections = Vec::new();
    for item in document.find_all("multi-routing-engine-item") {
        let re_name = required_text(item, "re-name")?;
        let inner = item.find_all(root);
        if inner.is_empty() {
            return Err(ExtractError::MissingField {
                element: item.name().to_string(),
                path: root.to_string(),
            });
        }
        sections.extend(inner.into_iter().map(|section| (re_name, section)));
    }
    Ok(sections)
}

/// `1` when the field equals `expected`, `0` otherwise.
pub(crate) fn status_value(actual: &str, expected: &str) -> f64 {
    if actual == expected { 1.0 } else { 0.0 }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn node() -> Element {
        Element::new("physical-interface")
            .with_child(Element::new("name").with_text(" ge-0/0/0 "))
            .with_child(
                Element::new("traffic-statistics")
                    .with_child(Element::new("input-bps").with_text("1200")),
            )
            .with_child(
                Element::new("up-time")
                    .with_text("1 day")
                    .with_attribute("junos:seconds", "86400"),
            )
    }

    #[test]
    fn test_extract_or_default() {
        let node = node();
        assert_eq!(
            extract_or_default(&node, "traffic-statistics/input-bps", "0"),
            "1200"
        );
        assert_eq!(
            extract_or_default(&node, "traffic-statistics/output-bps", "0"),
            "0"
        );
        assert_eq!(extract_or_default(&node, "name", "unknown"), "ge-0/0/0");
    }

    #[test]
    fn test_required_text() {
        let node = node();
        assert_eq!(required_text(&node, "name").unwrap(), "ge-0/0/0");

        let err = required_text(&node, "oper-status").unwrap_err();
        assert!(matches!(err, ExtractError::MissingField { .. }));
        assert_eq!(err.to_string(), "<physical-interface> has no <oper-status>");
    }

    #[test]
    fn test_required_attribute() {
        let node = node();
        assert_eq!(required_attribute(&node, "up-time", "seconds").unwrap(), "86400");
        assert!(matches!(
            required_attribute(&node, "up-time", "celsius"),
            Err(ExtractError::MissingAttribute { .. })
        ));
        assert!(matches!(
            required_attribute(&node, "start-time", "seconds"),
            Err(ExtractError::MissingField { .. })
        ));
    }

    #[test]
    fn test_series_names_are_globally_unique() {
        let mut seen = HashSet::new();
        for kind in MetricKind::ALL {
            for extractor in extractors_for(kind) {
                for (name, _) in extractor.series() {
                    assert!(seen.insert(*name), "series {} declared twice", name);
                }
            }
        }
    }

    #[test]
    fn test_all_extractors_register_together() {
        let mut registry = Registry::new();
        for kind in MetricKind::ALL {
            for extractor in extractors_for(kind) {
                register_series(extractor.as_ref(), &mut registry).unwrap();
            }
        }
        assert_eq!(registry.sample_count(), 0);
        assert!(registry.is_registered("ifaceUp"));
        assert!(registry.is_registered("bgpPeerUp"));
    }

    #[test]
    fn test_engine_sections_single() {
        let root = Element::new("system-storage-information")
            .with_child(Element::new("filesystem"));
        let sections = engine_sections(&root, "system-storage-information").unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].0, LOCAL_ENGINE);
        assert_eq!(sections[0].1.name(), "system-storage-information");
    }

    #[test]
    fn test_engine_sections_multi() {
        let item = |name: &str| {
            Element::new("multi-routing-engine-item")
                .with_child(Element::new("re-name").with_text(name))
                .with_child(Element::new("system-storage-information"))
        };
        let root = Element::new("multi-routing-engine-results")
            .with_child(item("fpc0"))
            .with_child(item("fpc1"));

        let names: Vec<_> = engine_sections(&root, "system-storage-information")
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["fpc0", "fpc1"]);

        let broken = Element::new("multi-routing-engine-results")
            .with_child(Element::new("multi-routing-engine-item"));
        assert!(engine_sections(&broken, "system-storage-information").is_err());
    }

    #[test]
    fn test_engine_sections_item_without_section() {
        let root = Element::new("multi-routing-engine-results").with_child(
            Element::new("multi-routing-engine-item")
                .with_child(Element::new("re-name").with_text("node0"))
                .with_child(Element::new("rpc-error")),
        );
        assert!(matches!(
            engine_sections(&root, "interface-information"),
            Err(ExtractError::MissingField { .. })
        ));
    }

    #[test]
    fn test_engine_sections_foreign_root() {
        let root = Element::new("rpc-error")
            .with_child(Element::new("error-message").with_text("syntax error"));
        let err = engine_sections(&root, "bgp-information").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::UnexpectedRoot { expected: "bgp-information", ref found } if found == "rpc-error"
        ));
        assert_eq!(err.to_string(), "Expected a <bgp-information> reply, found <rpc-error>");
    }

    #[test]
    fn test_every_extractor_rejects_error_reply() {
        let error = test_support::doc(
            r#"{"rpc-error": [{"error-message": [{"data": "syntax error"}]}]}"#,
        );
        for kind in MetricKind::ALL {
            for extractor in extractors_for(kind) {
                let mut registry = Registry::new();
                register_series(extractor.as_ref(), &mut registry).unwrap();
                assert!(
                    matches!(
                        extractor.extract(&error, &mut registry),
                        Err(ExtractError::UnexpectedRoot { .. })
                    ),
                    "{} accepted an error reply",
                    extractor.name()
                );
                assert_eq!(registry.sample_count(), 0);
            }
        }
    }

    #[test]
    fn test_status_value() {
        assert_eq!(status_value("up", "up"), 1.0);
        assert_eq!(status_value("down", "up"), 0.0);
    }
}
