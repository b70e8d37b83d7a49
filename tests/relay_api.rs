
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use thinkai::config::DEFAULT_MODEL;
use thinkai::gemini::GeminiClient;
use thinkai::relay::{HINT_PROMPT_TEMPLATE, RelayState, router};

use test_helpers::{post_json, read_json, spawn_upstream};

fn state_with(base_url: &str) -> RelayState {
    RelayState::new(Some(GeminiClient::with_base_url(
        base_url,
        "test-key",
        DEFAULT_MODEL,
    )))
}

#[tokio::test]
async fn chat_without_query_is_bad_request() {
    let app = router(state_with("http://127.0.0.1:9"));

    for body in [json!({}), json!({ "query": "" }), json!({ "query": null })] {
        let response = app
            .clone()
            .oneshot(post_json("/api/chat", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"], "Query is required");
    }
}

#[tokio::test]
async fn hint_without_question_is_bad_request() {
    let app = router(state_with("http://127.0.0.1:9"));

    let response = app.oneshot(post_json("/api/hint", json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "No question provided.");
}

#[tokio::test]
async fn missing_api_key_fails_without_calling_upstream() {
    let upstream = spawn_upstream(
        StatusCode::OK,
        json!({"candidates": [{"content": {"parts": [{"text": "unused"}]}}]}),
    )
    .await;

    let app = router(RelayState::new(None));
    let response = app
        .oneshot(post_json("/api/chat", json!({ "query": "hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Missing Gemini API key");
    assert_eq!(upstream.hit_count(), 0);
}

#[tokio::test]
async fn chat_returns_the_first_candidate_text() {
    let upstream = spawn_upstream(
        StatusCode::OK,
        json!({"candidates": [{"content": {"parts": [{"text": "Paris"}]}}]}),
    )
    .await;

    let app = router(state_with(&upstream.base_url));
    let response = app
        .oneshot(post_json(
            "/api/chat",
            json!({ "query": "What is the capital of France?" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["response"], "Paris");
    assert_eq!(upstream.hit_count(), 1);

    // The direct variant forwards the query verbatim as a user turn.
    let sent = upstream.last_body.lock().await.clone().unwrap();
    assert_eq!(sent["contents"][0]["role"], "user");
    assert_eq!(
        sent["contents"][0]["parts"][0]["text"],
        "What is the capital of France?"
    );
}

#[tokio::test]
async fn chat_without_candidates_uses_the_fallback_text() {
    let upstream = spawn_upstream(StatusCode::OK, json!({})).await;

    let app = router(state_with(&upstream.base_url));
    let response = app
        .oneshot(post_json("/api/chat", json!({ "query": "hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["response"], "Sorry, I couldn't generate a response.");
}

#[tokio::test]
async fn upstream_failure_becomes_an_error_envelope() {
    let upstream = spawn_upstream(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": {"message": "quota exhausted"}}),
    )
    .await;

    let app = router(state_with(&upstream.base_url));
    let response = app
        .oneshot(post_json("/api/chat", json!({ "query": "hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Failed to generate AI response");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("500"), "details should carry the upstream status: {details}");
    assert!(details.contains("quota exhausted"));
}

#[tokio::test]
async fn hint_wraps_the_question_and_returns_a_hint() {
    let upstream = spawn_upstream(
        StatusCode::OK,
        json!({"candidates": [{"content": {"parts": [{"text": "Think of the Eiffel Tower."}]}}]}),
    )
    .await;

    let app = router(state_with(&upstream.base_url));
    let response = app
        .oneshot(post_json(
            "/api/hint",
            json!({ "question": "What is the capital of France?" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["hint"], "Think of the Eiffel Tower.");

    let sent = upstream.last_body.lock().await.clone().unwrap();
    let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.starts_with(HINT_PROMPT_TEMPLATE));
    assert!(prompt.contains("Question: What is the capital of France?"));
}

#[tokio::test]
async fn hint_variant_keeps_its_own_fixed_strings() {
    let no_text = spawn_upstream(StatusCode::OK, json!({})).await;
    let app = router(state_with(&no_text.base_url));
    let response = app
        .oneshot(post_json("/api/hint", json!({ "question": "anything" })))
        .await
        .unwrap();
    assert_eq!(read_json(response).await["hint"], "(No hint received)");

    let failing = spawn_upstream(StatusCode::SERVICE_UNAVAILABLE, json!({})).await;
    let app = router(state_with(&failing.base_url));
    let response = app
        .oneshot(post_json("/api/hint", json!({ "question": "anything" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_json(response).await["error"],
        "Failed to get response from Gemini API."
    );
}
