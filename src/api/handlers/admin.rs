/// Vector store administration handlers
use axum::extract::Query;
use axum::extract::State;
use axum::Json;
use tracing::warn;

use super::AppState;
use crate::api::types::ApiError;
use crate::api::types::ResetQuery;
use crate::api::types::ResetResponse;
use crate::vector_store::CollectionStats;

/// GET /api/v1/admin/vector-store/stats
pub async fn vector_store_stats(State(state): State<AppState>) -> Json<CollectionStats> {
    Json(state.chat_service.index().collection_stats().await)
}

/// POST /api/v1/admin/vector-store/reset?confirm=true
pub async fn reset_vector_store(
    State(state): State<AppState>,
    Query(query): Query<ResetQuery>,
) -> Result<Json<ResetResponse>, ApiError> {
    if !query.confirm {
        return Err(ApiError::BadRequest(
            "Must set confirm=true to reset vector store".to_string(),
        ));
    }

    state.chat_service.index().reset_collection().await?;
    warn!("Vector store has been reset");

    Ok(Json(ResetResponse {
        status: "success".to_string(),
        message: "Vector store has been reset".to_string(),
    }))
}
