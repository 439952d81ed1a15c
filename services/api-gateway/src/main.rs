use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method},
    response::Json,
    routing::get,
    serve, Router,
};
use partscout_enrichment::GeminiClient;
use partscout_processor::RowProcessor;
use partscout_utils::{init_logging, AppConfig};
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

mod error;
mod handlers;
mod metrics;
mod middleware;
mod routes;

use metrics::{spawn_event_recorder, Metrics};
use middleware::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration, using defaults: {}", e);
        let mut config = AppConfig::default();
        config.enrichment.resolve_api_key();
        config
    });

    // Initialize logging
    init_logging(&config.logging)?;
    info!("Starting PartScout API Gateway");

    if !config.enrichment.has_api_key() {
        warn!("No enrichment API key configured; every row will fail until one is set");
    }

    let client = GeminiClient::new(&config.enrichment)?;
    info!(model = client.model(), "Enrichment client ready");

    let processor = RowProcessor::new(Arc::new(client));
    let metrics = Metrics::new()?;
    spawn_event_recorder(metrics.clone(), processor.subscribe());

    let state = AppState {
        processor: processor.clone(),
        config: Arc::new(config.clone()),
        metrics,
    };
    let app = create_app(state, &config);

    // Start server
    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("API Gateway listening on {}", listener.local_addr()?);

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(processor))
        .await?;

    Ok(())
}

fn create_app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))

        // API routes
        .nest("/api/v1", routes::create_api_routes())

        // Middleware stack
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST, Method::DELETE])
                        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
                        .expose_headers([header::CONTENT_DISPOSITION]),
                )
                .layer(DefaultBodyLimit::max(config.server.max_request_size))
                .layer(axum::middleware::from_fn(request_id_middleware)),
        )

        // Application state
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState {
    pub processor: RowProcessor,
    pub config: Arc<AppConfig>,
    pub metrics: Metrics,
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "partscout-gateway",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}

/// Resolves on Ctrl-C and asks the processor to stop after its current row.
async fn shutdown_signal(processor: RowProcessor) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown requested");
    processor.stop().await;
}
