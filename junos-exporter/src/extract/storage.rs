//! Filesystem usage from `get-system-storage`.
//!
//! Field policy:
//! - `re-name` (multi-member replies), `filesystem-name`: required.
//! - `mounted-on`: default `unknown`.
//! - block counts and `used-percent`: default `0`.

use junos_exposition::{LabelSet, MetricType, Registry};

use super::{ExtractError, Extractor, engine_sections, extract_or_default, required_text};
use crate::document::Element;
use crate::session::Rpc;

const FILESYSTEM_FIELDS: [(&str, &str); 4] = [
    ("storageTotalBlocks", "total-blocks"),
    ("storageUsedBlocks", "used-blocks"),
    ("storageAvailableBlocks", "available-blocks"),
    ("storageUsedPercent", "used-percent"),
];

/// Block usage per filesystem and routing engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageExtractor;

impl Extractor for StorageExtractor {
    fn name(&self) -> &'static str {
        "storage"
    }

    fn rpc(&self) -> Rpc {
        Rpc::SystemStorage
    }

    fn root(&self) -> &'static str {
        "system-storage-information"
    }

    fn series(&self) -> &'static [(&'static str, MetricType)] {
        &[
            ("storageTotalBlocks", MetricType::Gauge),
            ("storageUsedBlocks", MetricType::Gauge),
            ("storageAvailableBlocks", MetricType::Gauge),
            ("storageUsedPercent", MetricType::Gauge),
        ]
    }

    fn extract(&self, document: &Element, registry: &mut Registry) -> Result<(), ExtractError> {
        for (fpc, section) in engine_sections(document, self.root())? {
            for filesystem in section.find_all("filesystem") {
                let labels = LabelSet::new()
                    .with("fpc", fpc)
                    .with("filesystem", required_text(filesystem, "filesystem-name")?)
                    .with("mountedOn", extract_or_default(filesystem, "mounted-on", "unknown"));

                for (series, path) in FILESYSTEM_FIELDS {
                    registry.add_sample(
                        series,
                        extract_or_default(filesystem, path, "0"),
                        labels.clone(),
                    )?;
                }
            }
        }

        Ok(())
    }
}
