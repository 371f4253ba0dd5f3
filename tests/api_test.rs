mod common;

use std::sync::Arc;

use askrag::api::auth::ApiKeyState;
use askrag::api::auth::API_KEY_HEADER;
use askrag::api::build_router;
use askrag::api::handlers::AppState;
use askrag::api::rate_limit::RateLimiter;
use askrag::models::ChatResponse;
use askrag::rag::ChatSettings;
use askrag::Result;
use axum::body::Body;
use axum::http::header;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Router;
use common::extensions;
use common::harness_with_model;
use common::write_knowledge_base;
use common::Harness;
use common::ScriptedModel;
use serde_json::json;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const KEY: &str = "test-secret";

struct TestApp {
    router: Router,
    harness: Harness,
    _kb: TempDir,
    _store: TempDir,
}

async fn app_with(limiter: RateLimiter, model: Arc<ScriptedModel>) -> Result<TestApp> {
    let kb = tempfile::tempdir()?;
    let store = tempfile::tempdir()?;
    write_knowledge_base(kb.path());

    let harness = harness_with_model(store.path(), ChatSettings::default(), model);
    harness
        .service
        .ingest_directory(kb.path(), &extensions())
        .await?;

    let state = AppState {
        chat_service: harness.service.clone(),
        api_key: ApiKeyState::new(Some(KEY.to_string())),
        rate_limiter: Arc::new(limiter),
    };

    Ok(TestApp {
        router: build_router(state, false),
        harness,
        _kb: kb,
        _store: store,
    })
}

async fn app_with_limiter(limiter: RateLimiter) -> Result<TestApp> {
    app_with(limiter, ScriptedModel::new()).await
}

async fn app() -> Result<TestApp> {
    app_with_limiter(RateLimiter::disabled()).await
}

fn request(method: Method, uri: &str, body: Option<Value>, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_health_is_public() -> Result<()> {
    let app = app().await?;

    let response = send(&app.router, request(Method::GET, "/api/v1/health", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["vector_store"], true);

    let response = send(
        &app.router,
        request(Method::GET, "/api/v1/health/ready", None, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app.router, request(Method::GET, "/", None, None)).await;
    assert_eq!(body_json(response).await["name"], "askrag");
    Ok(())
}

#[tokio::test]
async fn test_chat_requires_api_key() -> Result<()> {
    let app = app().await?;
    let body = json!({ "question": "What does Ashish do?" });

    let response = send(
        &app.router,
        request(Method::POST, "/api/v1/chat/ask", Some(body.clone()), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app.router,
        request(Method::POST, "/api/v1/chat/ask", Some(body), Some("wrong")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.harness.model.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_ask_and_fetch_conversation() -> Result<()> {
    let app = app().await?;

    let response = send(
        &app.router,
        request(
            Method::POST,
            "/api/v1/chat/ask",
            Some(json!({ "question": "Which languages does Ashish write?" })),
            Some(KEY),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let answer: ChatResponse = serde_json::from_slice(&body_bytes(response).await)?;
    assert_eq!(answer.answer, common::ANSWER);
    assert!(!answer.sources.is_empty());

    let uri = format!("/api/v1/chat/conversation/{}", answer.conversation_id);
    let response = send(&app.router, request(Method::GET, &uri, None, Some(KEY))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let history = body_json(response).await;
    assert_eq!(history.as_array().map(Vec::len), Some(2));

    let response = send(
        &app.router,
        request(Method::GET, "/api/v1/chat/stats", None, Some(KEY)),
    )
    .await;
    assert_eq!(body_json(response).await["active_conversations"], 1);

    let response = send(&app.router, request(Method::DELETE, &uri, None, Some(KEY))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(&app.router, request(Method::DELETE, &uri, None, Some(KEY))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_invalid_questions_are_unprocessable() -> Result<()> {
    let app = app().await?;

    let response = send(
        &app.router,
        request(
            Method::POST,
            "/api/v1/chat/ask",
            Some(json!({ "question": "   " })),
            Some(KEY),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["message"].as_str().is_some());
    assert!(body["timestamp"].as_str().is_some());

    let response = send(
        &app.router,
        request(
            Method::POST,
            "/api/v1/chat/ask",
            Some(json!({ "question": "x".repeat(1001) })),
            Some(KEY),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = send(
        &app.router,
        request(
            Method::POST,
            "/api/v1/chat/ask",
            Some(json!({ "prompt": "missing question field" })),
            Some(KEY),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.harness.model.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_unknown_conversation_is_not_found() -> Result<()> {
    let app = app().await?;
    let id = uuid::Uuid::new_v4();

    for uri in [
        format!("/api/v1/chat/conversation/{id}"),
        format!("/api/v1/chat/conversation/{id}/summary"),
    ] {
        let response = send(&app.router, request(Method::GET, &uri, None, Some(KEY))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    Ok(())
}

#[tokio::test]
async fn test_stream_ends_with_done_marker() -> Result<()> {
    let app = app().await?;

    let response = send(
        &app.router,
        request(
            Method::POST,
            "/api/v1/chat/ask/stream",
            Some(json!({ "question": "Which languages does Ashish write?", "stream": true })),
            Some(KEY),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream")));
    assert!(response.headers().contains_key("x-conversation-id"));

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    for fragment in common::FRAGMENTS {
        assert!(text.contains(&format!("data: {fragment}")), "{text}");
    }
    assert!(text.trim_end().ends_with("data: [DONE]"), "{text}");
    Ok(())
}

#[tokio::test]
async fn test_stream_with_carriage_returns_still_completes() -> Result<()> {
    let model = ScriptedModel::streaming(
        vec!["Rust\r\n".to_string(), "Python\rGo".to_string()],
        false,
    );
    let app = app_with(RateLimiter::disabled(), model).await?;

    let response = send(
        &app.router,
        request(
            Method::POST,
            "/api/v1/chat/ask/stream",
            Some(json!({ "question": "Which languages does Ashish write?", "stream": true })),
            Some(KEY),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(!text.contains('\r'), "{text:?}");
    assert!(text.contains("data: Rust\n"), "{text:?}");
    assert!(text.contains("data: Python\ndata: Go\n"), "{text:?}");
    assert!(text.trim_end().ends_with("data: [DONE]"), "{text}");
    Ok(())
}

#[tokio::test]
async fn test_reset_requires_confirmation() -> Result<()> {
    let app = app().await?;

    let response = send(
        &app.router,
        request(Method::POST, "/api/v1/admin/vector-store/reset", None, Some(KEY)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.harness.service.index().store().count().await? > 0);

    let response = send(
        &app.router,
        request(
            Method::POST,
            "/api/v1/admin/vector-store/reset?confirm=true",
            None,
            Some(KEY),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app.router,
        request(Method::GET, "/api/v1/admin/vector-store/stats", None, Some(KEY)),
    )
    .await;
    assert_eq!(body_json(response).await["count"], 0);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_returns_retry_after() -> Result<()> {
    let app = app_with_limiter(RateLimiter::per_minute(1, true)).await?;
    let ask = || {
        request(
            Method::POST,
            "/api/v1/chat/ask",
            Some(json!({ "question": "Where is Ashish based?" })),
            Some(KEY),
        )
    };

    let response = send(&app.router, ask()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app.router, ask()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok()),
        Some("60")
    );

    // Only question endpoints are limited
    let response = send(
        &app.router,
        request(Method::GET, "/api/v1/chat/stats", None, Some(KEY)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
