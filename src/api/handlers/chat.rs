/// Chat handlers
use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::response::sse::Sse;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use futures::StreamExt;
use tracing::error;
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::api::types::ApiError;
use crate::api::types::ChatStatsResponse;
use crate::api::types::ConversationSummaryResponse;
use crate::errors::AskRagError;
use crate::models::ChatMessage;
use crate::models::ChatRequest;
use crate::models::ChatResponse;
use crate::rag::StreamEvent;

/// SSE payload closing a streamed answer
pub const STREAM_DONE: &str = "[DONE]";

/// SSE field values may span lines but must not carry carriage returns
fn sse_data(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn parse_body(body: Result<Json<ChatRequest>, JsonRejection>) -> Result<ChatRequest, ApiError> {
    body.map(|Json(request)| request)
        .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))
}

/// POST /api/v1/chat/ask
pub async fn ask_question(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = parse_body(body)?;
    info!(
        "Received question: {}",
        request.question.chars().take(100).collect::<String>()
    );

    let response = state.chat_service.ask_question(request).await?;
    Ok(Json(response))
}

/// POST /api/v1/chat/ask/stream
pub async fn ask_question_stream(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = parse_body(body)?;
    info!(
        "Received streaming question: {}",
        request.question.chars().take(100).collect::<String>()
    );

    let answer = state.chat_service.ask_question_stream(request).await?;
    let conversation_id = answer.conversation_id;

    let events = answer.map(|event| {
        let event = match event {
            Ok(StreamEvent::Delta(text)) => Event::default().data(sse_data(&text)),
            Ok(StreamEvent::Done) => Event::default().data(STREAM_DONE),
            Err(e) => {
                error!("Error during streaming: {}", e);
                Event::default().data(sse_data(&format!("Error: {e}")))
            }
        };
        Ok::<_, Infallible>(event)
    });

    let mut response = Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response();
    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    if let Ok(value) = HeaderValue::from_str(&conversation_id.to_string()) {
        headers.insert(HeaderName::from_static("x-conversation-id"), value);
    }
    Ok(response)
}

/// GET /api/v1/chat/conversation/:id
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let history = state
        .chat_service
        .get_conversation_history(&conversation_id)?;
    Ok(Json(history))
}

/// GET /api/v1/chat/conversation/:id/summary
pub async fn get_conversation_summary(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<ConversationSummaryResponse>, ApiError> {
    let summary = state
        .chat_service
        .get_conversation_summary(&conversation_id)
        .await?
        .ok_or_else(|| AskRagError::NotFound("Conversation not found".to_string()))?;

    Ok(Json(ConversationSummaryResponse {
        conversation_id: conversation_id.to_string(),
        summary,
    }))
}

/// DELETE /api/v1/chat/conversation/:id
pub async fn clear_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.chat_service.clear_conversation(&conversation_id) {
        return Err(AskRagError::NotFound("Conversation not found".to_string()).into());
    }
    info!("Cleared conversation {}", conversation_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/chat/stats
pub async fn get_chat_stats(State(state): State<AppState>) -> Json<ChatStatsResponse> {
    Json(ChatStatsResponse {
        active_conversations: state.chat_service.get_active_conversation_count(),
    })
}
