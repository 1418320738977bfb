//! HTTP server for the scrape endpoint.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::collector::{ScrapeError, SharedScraper};
use crate::session::{Connector, SessionError};

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Application state shared across handlers.
struct AppState<C> {
    scraper: SharedScraper<C>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            scraper: self.scraper.clone(),
        }
    }
}

/// Query parameters of a scrape request.
#[derive(Debug, Deserialize)]
struct ScrapeParams {
    module: Option<String>,
    target: Option<String>,
}

/// Create the HTTP router.
pub fn create_router<C: Connector>(scraper: SharedScraper<C>, metrics_path: &str) -> Router {
    let state = AppState { scraper };

    Router::new()
        .route(metrics_path, get(metrics_handler::<C>))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handler for the scrape endpoint.
async fn metrics_handler<C: Connector>(
    State(state): State<AppState<C>>,
    Query(params): Query<ScrapeParams>,
) -> Response {
    let Some(target) = params.target.filter(|t| !t.is_empty()) else {
        return error_response(&ScrapeError::MissingParameter("target"));
    };
    let module = params.module.as_deref().unwrap_or("default");

    match state.scraper.scrape(module, &target).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

async fn not_found_handler() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        "Not Found\n",
    )
        .into_response()
}

/// HTTP status for a failed scrape.
pub fn status_for(error: &ScrapeError) -> StatusCode {
    match error {
        ScrapeError::MissingParameter(_) | ScrapeError::UnknownModule(_) => {
            StatusCode::BAD_REQUEST
        }
        ScrapeError::Session(SessionError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        ScrapeError::Session(_) => StatusCode::BAD_GATEWAY,
        ScrapeError::Extract { .. } | ScrapeError::Exposition(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: &ScrapeError) -> Response {
    (
        status_for(error),
        [(header::CONTENT_TYPE, "text/plain")],
        format!("{}\n", error),
    )
        .into_response()
}

/// HTTP server configuration.
pub struct HttpServer<C> {
    scraper: SharedScraper<C>,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl<C: Connector> HttpServer<C> {
    /// Create a new HTTP server.
    pub fn new(scraper: SharedScraper<C>, listen_addr: SocketAddr, metrics_path: String) -> Self {
        Self {
            scraper,
            listen_addr,
            metrics_path,
        }
    }

    /// Run the HTTP server until the shutdown signal is received.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let router = create_router(self.scraper, &self.metrics_path);

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        info!(
            addr = %self.listen_addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
