//! Per-scrape collection: one device session, one fresh registry.

use std::sync::Arc;
use std::time::Instant;

use junos_exposition::{ExpositionError, Registry};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigHandle, MetricKind};
use crate::extract::{ExtractError, extractors_for, register_series};
use crate::session::{Connector, DeviceSession, SessionError};

/// Why a scrape produced no exposition.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Missing required parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("Unknown module '{0}'")]
    UnknownModule(String),
    #[error("Device session failed: {0}")]
    Session(#[from] SessionError),
    #[error("Failed to extract {rpc}: {source}")]
    Extract {
        rpc: &'static str,
        #[source]
        source: ExtractError,
    },
    #[error(transparent)]
    Exposition(#[from] ExpositionError),
}

/// Shared scraper handle.
pub type SharedScraper<C> = Arc<Scraper<C>>;

/// Runs scrapes against devices using the live configuration.
#[derive(Debug)]
pub struct Scraper<C> {
    config: Arc<ConfigHandle>,
    connector: C,
}

impl<C: Connector> Scraper<C> {
    /// Create a scraper over a configuration handle and a connector.
    pub fn new(config: Arc<ConfigHandle>, connector: C) -> Self {
        Self { config, connector }
    }

    /// The configuration handle scrapes read from.
    pub fn config(&self) -> &Arc<ConfigHandle> {
        &self.config
    }

    /// Collect every metric the module selects from `target` and render it.
    ///
    /// Any failure aborts the scrape; no partial exposition is returned.
    pub async fn scrape(&self, module: &str, target: &str) -> Result<String, ScrapeError> {
        let start = Instant::now();

        match self.try_scrape(module, target).await {
            Ok(registry) => {
                info!(
                    device = %target,
                    module = %module,
                    series = registry.series_count(),
                    samples = registry.sample_count(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Scrape completed"
                );
                Ok(registry.render())
            }
            Err(e) => {
                warn!(
                    device = %target,
                    module = %module,
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Scrape failed"
                );
                Err(e)
            }
        }
    }

    async fn try_scrape(&self, module: &str, target: &str) -> Result<Registry, ScrapeError> {
        if target.is_empty() {
            return Err(ScrapeError::MissingParameter("target"));
        }

        // Snapshot; a reload during the scrape does not affect it
        let config = self.config.current();
        let module_config = config
            .module(module)
            .ok_or_else(|| ScrapeError::UnknownModule(module.to_string()))?;

        let mut session = self.connector.open(target, module_config).await?;
        let result = collect(&mut session, &module_config.metric_kinds()).await;
        session.close().await;

        result
    }
}

/// Run the extractors of every kind, in order, over one session.
async fn collect<S: DeviceSession>(
    session: &mut S,
    kinds: &[MetricKind],
) -> Result<Registry, ScrapeError> {
    let mut registry = Registry::new();

    for kind in kinds {
        for extractor in extractors_for(*kind) {
            let rpc = extractor.rpc();
            let document = session.rpc(rpc).await?;

            register_series(extractor.as_ref(), &mut registry)?;
            extractor
                .extract(&document, &mut registry)
                .map_err(|source| ScrapeError::Extract {
                    rpc: rpc.name(),
                    source,
                })?;

            debug!(
                extractor = extractor.name(),
                rpc = rpc.name(),
                samples = registry.sample_count(),
                "Extractor finished"
            );
        }
    }

    Ok(registry)
}
