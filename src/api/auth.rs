use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use tracing::warn;

use super::types::ApiError;
use crate::errors::AskRagError;

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Clone, Default)]
pub struct ApiKeyState {
    /// `None` disables the check
    pub expected_key: Option<String>,
}

impl ApiKeyState {
    pub fn new(expected_key: Option<String>) -> Self {
        Self {
            expected_key: expected_key.filter(|key| !key.is_empty()),
        }
    }
}

/// API key authentication middleware
pub async fn api_key_middleware(
    State(state): State<ApiKeyState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.expected_key.as_deref() else {
        return next.run(request).await;
    };

    let header = request.headers().get(API_KEY_HEADER);
    match header.and_then(|h| h.to_str().ok()) {
        Some(key) if key == expected => next.run(request).await,
        Some(_) => {
            warn!("Invalid API key attempted");
            ApiError::from(AskRagError::Unauthorized("Invalid API key".to_string()))
                .into_response()
        }
        None => {
            warn!("Missing API key in request");
            ApiError::from(AskRagError::Unauthorized("Missing API key".to_string()))
                .into_response()
        }
    }
}
