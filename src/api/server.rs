//! HTTP server implementation

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing::warn;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::api::routes::API_PREFIX;
use crate::config::AppConfig;
use crate::errors::AskRagError;
use crate::rag::ChatService;
use crate::Result;

/// Wrap the API routes with tracing, compression and optional CORS
pub fn build_router(state: AppState, enable_cors: bool) -> Router {
    let mut app = routes::api_routes(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new()),
    );

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Ingest the knowledge base when the collection is still empty.
///
/// A missing directory is only logged so the server can still start.
pub async fn auto_ingest(chat_service: &ChatService, config: &AppConfig) -> Result<()> {
    if !config.rag.auto_ingest {
        return Ok(());
    }

    let existing = chat_service.index().store().count().await?;
    if existing > 0 {
        info!("Vector store already holds {} chunks, skipping ingestion", existing);
        return Ok(());
    }

    let dir = Path::new(&config.rag.knowledge_base_dir);
    info!("📚 Ingesting knowledge base from {}", dir.display());
    match chat_service
        .ingest_directory(dir, &config.rag.file_extensions)
        .await
    {
        Ok(added) => {
            info!("Ingested {} chunks", added);
            Ok(())
        }
        Err(AskRagError::NotFound(msg)) => {
            warn!("Skipping ingestion: {}", msg);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Start the API server
pub async fn serve_api(config: &AppConfig) -> Result<()> {
    info!("🚀 Starting askrag API server...");

    let chat_service = Arc::new(ChatService::from_config(config).await?);
    auto_ingest(&chat_service, config).await?;

    let state = AppState::new(chat_service, &config.security);
    if state.api_key.expected_key.is_none() {
        warn!("No API key configured, protected endpoints are open");
    }

    let app = build_router(state, config.server.enable_cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET    {API_PREFIX}/health                       - Health check");
    info!("  POST   {API_PREFIX}/chat/ask                     - Ask a question");
    info!("  POST   {API_PREFIX}/chat/ask/stream              - Ask with SSE streaming");
    info!("  GET    {API_PREFIX}/chat/conversation/:id        - Conversation history");
    info!("  GET    {API_PREFIX}/chat/conversation/:id/summary - Conversation summary");
    info!("  DELETE {API_PREFIX}/chat/conversation/:id        - Clear a conversation");
    info!("  GET    {API_PREFIX}/admin/vector-store/stats     - Collection statistics");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
