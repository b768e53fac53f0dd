mod routes;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::ingest::IngestService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
}

impl AppState {
    #[must_use]
    pub fn new(ingest: IngestService) -> Self {
        Self {
            ingest: Arc::new(ingest),
        }
    }
}

/// Start the web server and run until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the address is invalid or the listener cannot bind.
pub async fn serve<F>(config: &Config, ingest: IngestService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = format!("{}:{}", config.web_host, config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let app = create_app(AppState::new(ingest));

    info!(addr = %addr, "Starting HTTP web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Web server error")?;

    Ok(())
}

/// Create the main application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
