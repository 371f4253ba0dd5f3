/// Health and probe handlers
use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::error;

use super::AppState;
use crate::api::types::ApiError;
use crate::api::types::HealthResponse;
use crate::api::types::StatusResponse;
use crate::errors::AskRagError;

/// Component health, `degraded` when some checks fail and `unhealthy` when all do
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = BTreeMap::new();

    let stats = state.chat_service.index().collection_stats().await;
    if let Some(err) = &stats.error {
        error!("Vector store health check failed: {}", err);
    }
    checks.insert("vector_store".to_string(), stats.is_healthy());
    checks.insert(
        "llm".to_string(),
        !state.chat_service.model_name().is_empty(),
    );

    let status = if checks.values().all(|ok| *ok) {
        "healthy"
    } else if checks.values().any(|ok| *ok) {
        "degraded"
    } else {
        "unhealthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
        timestamp: Utc::now(),
    })
}

pub async fn liveness() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// 503 until the vector store can be read
pub async fn readiness(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    let stats = state.chat_service.index().collection_stats().await;
    if let Some(err) = stats.error {
        error!("Readiness check failed: {}", err);
        return Err(AskRagError::Storage("Vector store not ready".to_string()).into());
    }

    Ok((
        StatusCode::OK,
        Json(StatusResponse {
            status: "ready".to_string(),
        }),
    ))
}
