// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use handoff_core::PluginAdapter;
use handoff_core::types::AdapterType;
use handoff_gateway::{GatewayState, HANDOFF_PATH, HealthState, RetryAuth, router};
use handoff_security::Redactor;
use handoff_test_utils::{MockSummarizer, THREAD_ID, TestHarness, Verdict};

const RETRY_TOKEN: &str = "retry-s3cret";

fn app(harness: &TestHarness) -> Router {
    let state = GatewayState {
        orchestrator: harness.orchestrator.clone(),
        auth: RetryAuth::new(Some(RETRY_TOKEN.to_string())),
        redactor: Redactor::new([RETRY_TOKEN]),
        health: HealthState {
            start_time: Instant::now(),
            service_name: "handoff-test".to_string(),
            adapters: vec![
                harness.conversation.clone() as Arc<dyn PluginAdapter>,
                harness.transport.clone() as Arc<dyn PluginAdapter>,
            ],
            not_configured: vec![AdapterType::AttachmentFetcher],
        },
    };
    router(state, 16 * 1024)
}

fn post(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(HANDOFF_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn ready_lead_returns_sent_then_already_sent() {
    let harness = TestHarness::builder().build().await.unwrap();

    let (status, body) = send(
        app(&harness),
        post(json!({ "threadId": THREAD_ID, "reason": "chat_closed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["sent"], true);
    assert_eq!(body["reason"], "sent");
    assert!(body["messageId"].is_string());

    let (status, body) = send(
        app(&harness),
        post(json!({ "threadId": THREAD_ID, "reason": "pagehide" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "already_sent");
}

#[tokio::test]
async fn gating_outcomes_are_200() {
    let harness = TestHarness::builder()
        .with_summarizer(MockSummarizer::new(Verdict::Outcome(
            handoff_core::types::SummaryOutcome::Malformed("?".into()),
        )))
        .build()
        .await
        .unwrap();

    let (status, body) = send(
        app(&harness),
        post(json!({ "threadId": THREAD_ID, "reason": "idle" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["sent"], false);
    assert_eq!(body["reason"], "not_ready");
}

#[tokio::test]
async fn invalid_thread_id_is_400() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (status, body) = send(
        app(&harness),
        post(json!({ "threadId": "nope", "reason": "idle" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (status, body) = send(
        app(&harness),
        post(json!({ "threadId": THREAD_ID, "reason": "whenever" })),
    )
    .await;
    assert!(status.is_client_error());
    assert_eq!(body["error"], "invalid_input");

    let request = Request::builder()
        .method("POST")
        .uri(HANDOFF_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(app(&harness), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let harness = TestHarness::builder().build().await.unwrap();
    let padding = "x".repeat(32 * 1024);
    let (status, _) = send(
        app(&harness),
        post(json!({ "threadId": THREAD_ID, "reason": "idle", "user": padding })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(harness.conversation.calls(), 0);
}

#[tokio::test]
async fn server_retry_requires_the_token() {
    let harness = TestHarness::builder().build().await.unwrap();
    let body = json!({ "threadId": THREAD_ID, "reason": "server_retry" });

    let (status, response) = send(app(&harness), post(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["error"], "unauthorized");
    assert_eq!(harness.conversation.calls(), 0);

    let mut request = post(body);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {RETRY_TOKEN}").parse().unwrap(),
    );
    let (status, response) = send(app(&harness), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["reason"], "sent");
}

#[tokio::test]
async fn transport_failure_is_502_then_cooldown() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.transport.set_failing(true);

    let (status, body) = send(
        app(&harness),
        post(json!({ "threadId": THREAD_ID, "reason": "chat_closed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "transport");

    let (status, body) = send(
        app(&harness),
        post(json!({ "threadId": THREAD_ID, "reason": "idle" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "cooldown");
}

#[tokio::test]
async fn missing_transport_is_503() {
    let harness = TestHarness::builder().without_transport().build().await.unwrap();
    let (status, body) = send(
        app(&harness),
        post(json!({ "threadId": THREAD_ID, "reason": "idle" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "transport_not_configured");
}

#[tokio::test]
async fn health_lists_adapters() {
    let harness = TestHarness::builder().build().await.unwrap();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&harness), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "handoff-test");
    assert_eq!(body["adapters"].as_array().unwrap().len(), 2);
    assert_eq!(body["adapters"][0]["type"], "conversation");
    assert_eq!(body["not_configured"], json!(["attachment_fetcher"]));
}
