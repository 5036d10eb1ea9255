use anyhow::Result;
use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    artifacts::Artifacts,
    config::Config,
    handlers::{self, AppState},
    metrics,
    pipeline::QuotePipeline,
    signals::setup_signal_handlers,
};

/// Form and JSON bodies are a handful of short fields
const BODY_LIMIT: usize = 16 * 1024;

/// Start the quote server
///
/// Artifacts must already be loaded: nothing binds until they are.
/// 1. Initializes metrics (if enabled)
/// 2. Sets up signal handlers for graceful shutdown
/// 3. Creates the Axum application
/// 4. Binds to the configured address and serves until signalled
pub async fn start_server(config: Config, artifacts: Arc<Artifacts>) -> Result<()> {
    let metrics_route = if config.metrics.enabled {
        info!("Initializing Prometheus metrics...");
        let handle = metrics::init_metrics(artifacts.model.kind())?;
        Some((config.metrics.endpoint.clone(), Arc::new(handle)))
    } else {
        None
    };

    let (shutdown_tx, signal_handle) = setup_signal_handlers();
    let mut shutdown_rx = shutdown_tx.subscribe();

    let state = AppState::new(QuotePipeline::new(artifacts));
    let app = create_router(state, metrics_route);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting plan cost estimator on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    signal_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(
    state: AppState,
    metrics_route: Option<(String, Arc<PrometheusHandle>)>,
) -> Router {
    let app = Router::new()
        .route(
            "/",
            get(handlers::page::show_form).post(handlers::page::submit_form),
        )
        .route("/api/v1/quote", post(handlers::quote::create_quote))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .with_state(state);

    let app = match metrics_route {
        Some((endpoint, handle)) => app.merge(
            Router::new()
                .route(&endpoint, get(handlers::metrics_handler::metrics))
                .with_state(handle),
        ),
        None => app,
    };

    app.layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
}
