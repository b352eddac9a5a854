use axum::{Router, http::header, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tally::{
    api::{handlers::api_routes, openapi::ApiDoc},
    config::CONFIG,
    core::services::{LedgerService, LedgerSettings},
    infrastructure::{
        logging::in_memory::InMemoryLogging, notification::log::LogDispatcher, storage::in_memory::InMemoryStorage,
    },
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&CONFIG.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let ledger = Arc::new(LedgerService::new(
        InMemoryStorage::new(),
        InMemoryLogging::new(),
        LogDispatcher::new(),
        LedgerSettings::from(&*CONFIG),
    ));

    let app = Router::new()
        // add / route with a simple health check
        .route("/", get(|| async { "OK" }))
        .nest("/api", api_routes(ledger))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new()) // Gzip compression
        .layer(TimeoutLayer::new(Duration::from_secs(30))) // 30-second timeout
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([http::Method::GET, http::Method::POST, http::Method::DELETE])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http()); // Request tracing

    // Start server
    let addr = SocketAddr::from(([127, 0, 0, 1], CONFIG.port));
    info!(currency = %CONFIG.default_currency, "Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
