//! Prometheus exporter for Juniper Junos devices.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use junos_exporter::{ConfigHandle, HttpServer, RestConnector, Scraper, init_tracing};

/// Prometheus exporter for Juniper Junos devices.
#[derive(Parser, Debug)]
#[command(name = "junos-exporter")]
#[command(about = "Export Junos device telemetry as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long, default_value = "junos_exporter.json5")]
    config: String,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Log level (overrides config).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let handle = Arc::new(ConfigHandle::load(&args.config)?);
    let config = handle.current();

    let mut logging = config.logging.clone();
    if let Some(level) = args.log_level {
        logging.level = level;
    }
    init_tracing(&logging)?;

    info!(
        config = %args.config,
        modules = config.modules.len(),
        "Starting Junos exporter"
    );

    let listen = args.listen.unwrap_or_else(|| config.listen.clone());
    let listen_addr = listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address {}: {}", listen, e))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scraper = Arc::new(Scraper::new(handle.clone(), RestConnector::new()));
    let http_server = HttpServer::new(scraper, listen_addr, config.path.clone());

    #[cfg(unix)]
    let reload_task = spawn_reload(handle.clone(), shutdown_rx.clone());

    let http_shutdown = shutdown_rx.clone();
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(http_shutdown).await {
            error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    shutdown_tx.send(true)?;

    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = http_task.await;
        #[cfg(unix)]
        let _ = reload_task.await;
    })
    .await;

    info!("Exporter stopped");
    Ok(())
}

/// Reload configuration on SIGHUP until shutdown.
#[cfg(unix)]
fn spawn_reload(
    handle: Arc<ConfigHandle>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut sighup =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Cannot listen for SIGHUP, reload disabled: {}", e);
                    return;
                }
            };

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading configuration");
                    if let Err(e) = handle.reload() {
                        debug!(error = %e, "Keeping previous configuration");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    })
}

async fn terminate() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}
