//! API request and response types

use std::collections::BTreeMap;

use axum::http::header;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::error;
use tracing::warn;

use crate::errors::AskRagError;

/// Seconds a rate-limited client is told to wait
pub const RETRY_AFTER_SECS: u64 = 60;

/// Error body shared by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: BTreeMap<String, bool>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationSummaryResponse {
    pub conversation_id: String,
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatStatsResponse {
    pub active_conversations: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub status: String,
    pub message: String,
}

/// Error returned by handlers, rendered as an [`ErrorResponse`]
#[derive(Debug)]
pub enum ApiError {
    /// A failure from the service layer
    Service(AskRagError),
    /// A request the handler refuses before calling any service
    BadRequest(String),
    /// A body that failed to deserialize
    InvalidBody(String),
}

impl From<AskRagError> for ApiError {
    fn from(err: AskRagError) -> Self {
        Self::Service(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Service(err) => status_for(err),
        }
    }
}

fn status_for(err: &AskRagError) -> StatusCode {
    match err {
        AskRagError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AskRagError::NotFound(_) => StatusCode::NOT_FOUND,
        AskRagError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AskRagError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        AskRagError::EmbeddingService(_)
        | AskRagError::GenerationService(_)
        | AskRagError::InvalidResponse(_)
        | AskRagError::HttpError(_) => StatusCode::BAD_GATEWAY,
        AskRagError::Storage(_) | AskRagError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message, detail) = match &self {
            Self::BadRequest(msg) => ("BadRequest".to_string(), msg.clone(), None),
            Self::InvalidBody(msg) => ("InvalidInput".to_string(), msg.clone(), None),
            Self::Service(err) if status.is_server_error() => {
                error!("Request failed: {}", err);
                (
                    err.kind().to_string(),
                    "An unexpected error occurred".to_string(),
                    Some(err.to_string()),
                )
            }
            Self::Service(err) => {
                warn!("Request rejected: {}", err);
                (err.kind().to_string(), err.to_string(), None)
            }
        };

        let body = ErrorResponse {
            error,
            message,
            detail,
            timestamp: Utc::now(),
        };
        let mut response = (status, Json(body)).into_response();

        match &self {
            Self::Service(AskRagError::RateLimited(_)) => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
            }
            Self::Service(AskRagError::Unauthorized(_)) => {
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("ApiKey"),
                );
            }
            _ => {}
        }
        response
    }
}
