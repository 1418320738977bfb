//! Prometheus exporter for Juniper Junos devices.
//!
//! Every scrape opens a session to the requested device over the Junos REST
//! API, issues the RPCs its module selects, maps the replies onto a fresh
//! [`junos_exposition::Registry`] and returns the rendered exposition.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   HTTP Server   │────>│     Scraper     │────>│  Junos device   │
//! │ (/metrics?...)  │<────│   (extractors)  │<────│   (REST RPCs)   │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! junos-exporter --config junos_exporter.json5
//! curl 'http://localhost:9326/metrics?module=default&target=192.0.2.1'
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod collector;
pub mod config;
pub mod document;
pub mod extract;
pub mod http;
pub mod session;

pub use collector::{ScrapeError, Scraper, SharedScraper};
pub use config::{ConfigError, ConfigHandle, ExporterConfig, LogFormat, LoggingConfig};
pub use http::HttpServer;
pub use session::{Connector, DeviceSession, RestConnector};

/// Initialize tracing with the given logging configuration.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}
