//! API route definitions

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde_json::json;
use serde_json::Value;

use super::auth::api_key_middleware;
use super::handlers::AppState;
use super::handlers::{
    self,
};
use super::rate_limit::rate_limit_middleware;

/// Prefix for every versioned endpoint
pub const API_PREFIX: &str = "/api/v1";

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/health/live", get(handlers::liveness))
        .route("/health/ready", get(handlers::readiness));

    // Question endpoints are the expensive ones
    let limited = Router::new()
        .route("/chat/ask", post(handlers::ask_question))
        .route("/chat/ask/stream", post(handlers::ask_question_stream))
        .route_layer(from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let protected = Router::new()
        .merge(limited)
        .route(
            "/chat/conversation/:id",
            get(handlers::get_conversation).delete(handlers::clear_conversation),
        )
        .route(
            "/chat/conversation/:id/summary",
            get(handlers::get_conversation_summary),
        )
        .route("/chat/stats", get(handlers::get_chat_stats))
        .route("/admin/vector-store/stats", get(handlers::vector_store_stats))
        .route("/admin/vector-store/reset", post(handlers::reset_vector_store))
        .route_layer(from_fn_with_state(
            state.api_key.clone(),
            api_key_middleware,
        ));

    let versioned = Router::new().merge(public).merge(protected);

    Router::new()
        .route("/", get(root))
        .nest(API_PREFIX, versioned)
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}
