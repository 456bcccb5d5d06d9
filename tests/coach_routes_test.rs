// ABOUTME: Integration tests for the coach turn and health HTTP routes
// ABOUTME: Tests validation, authentication, rate limiting, configuration errors and SSE delivery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;
use std::time::Duration;

use common::{
    bearer, test_controller, test_resources, test_resources_with_limit, test_turn_config,
    RecordingTools,
};
use helpers::axum_test::{AxumTestRequest, SseFrame};
use pierre_coach::constants::endpoints::{COACH_TURN, HEALTH_CHECK};
use pierre_coach::constants::models::FALLBACK_MODEL_ID;
use pierre_coach::constants::tools::GET_TODAY_SUMMARY;
use pierre_coach::rate_limiting::{headers, InMemoryRateLimiter, RateLimiter};
use pierre_coach::resources::CoachResources;
use pierre_coach::routes;
use serde_json::{json, Value};

// ============================================================================
// Test Helpers
// ============================================================================

fn setup_test_environment() -> (axum::Router, Arc<RecordingTools>) {
    let tools = RecordingTools::new();
    let controller = test_controller(None, Arc::clone(&tools), test_turn_config());
    (routes::router(test_resources(controller)), tools)
}

fn turn_body(text: &str) -> Value {
    json!({
        "messages": [{"role": "user", "content": text}],
        "preferences": {"unit": "kg", "soundEnabled": true}
    })
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_fallback_runtime() {
    let (app, _) = setup_test_environment();

    let response = AxumTestRequest::get(HEALTH_CHECK).send(app).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_runtime"], false);
    assert_eq!(body["model"], FALLBACK_MODEL_ID);
    assert_eq!(body["configured"], true);
}

// ============================================================================
// Request Validation
// ============================================================================

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, tools) = setup_test_environment();

    let response = AxumTestRequest::post(COACH_TURN)
        .header("authorization", &bearer("athlete-1"))
        .header("content-type", "application/json")
        .raw_body("{not json")
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(error_code(&response.json()), "INVALID_INPUT");
    assert!(tools.called().is_empty());
}

#[tokio::test]
async fn test_missing_user_message_is_rejected_before_auth() {
    let (app, _) = setup_test_environment();

    let response = AxumTestRequest::post(COACH_TURN)
        .json(&json!({"messages": [{"role": "assistant", "content": "hi"}]}))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(error_code(&response.json()), "MISSING_REQUIRED_FIELD");
}

#[tokio::test]
async fn test_out_of_range_timezone_is_rejected() {
    let (app, _) = setup_test_environment();

    let response = AxumTestRequest::post(COACH_TURN)
        .header("authorization", &bearer("athlete-1"))
        .json(&json!({
            "messages": [{"role": "user", "content": "Show today's summary"}],
            "preferences": {"unit": "kg", "soundEnabled": true, "timezoneOffsetMinutes": 2000}
        }))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (app, tools) = setup_test_environment();

    let response = AxumTestRequest::post(COACH_TURN)
        .json(&turn_body("Show today's summary"))
        .send(app)
        .await;

    assert_eq!(response.status(), 401);
    assert_eq!(error_code(&response.json()), "AUTH_REQUIRED");
    assert!(tools.called().is_empty());
}

#[tokio::test]
async fn test_foreign_token_is_unauthorized() {
    let (app, _) = setup_test_environment();
    let foreign = pierre_coach::auth::JwtAuth::new("some-other-secret-of-sufficient-length")
        .issue_token("athlete-1", chrono::Duration::hours(1))
        .unwrap();

    let response = AxumTestRequest::post(COACH_TURN)
        .header("authorization", &format!("Bearer {foreign}"))
        .json(&turn_body("Show today's summary"))
        .send(app)
        .await;

    assert_eq!(response.status(), 401);
    assert_eq!(error_code(&response.json()), "AUTH_INVALID");
}

// ============================================================================
// Rate Limiting
// ============================================================================

#[tokio::test]
async fn test_rate_limit_refusal_carries_headers() {
    let tools = RecordingTools::new();
    let controller = test_controller(None, Arc::clone(&tools), test_turn_config());
    let resources = test_resources_with_limit(controller, 1);

    let first = AxumTestRequest::post(COACH_TURN)
        .header("authorization", &bearer("athlete-1"))
        .json(&turn_body("Show today's summary"))
        .send(routes::router(Arc::clone(&resources)))
        .await;
    assert_eq!(first.status(), 200);
    assert_eq!(first.header(headers::X_RATE_LIMIT_LIMIT), Some("1"));
    assert_eq!(first.header(headers::X_RATE_LIMIT_REMAINING), Some("0"));

    let second = AxumTestRequest::post(COACH_TURN)
        .header("authorization", &bearer("athlete-1"))
        .json(&turn_body("Show today's summary"))
        .send(routes::router(Arc::clone(&resources)))
        .await;
    assert_eq!(second.status(), 429);
    assert!(second.header(headers::RETRY_AFTER).is_some());
    assert!(second.header(headers::X_RATE_LIMIT_RESET).is_some());
    let body: Value = second.json();
    assert_eq!(error_code(&body), "RATE_LIMIT_EXCEEDED");
    assert_eq!(body["error"]["details"]["limit"], 1);
    assert_eq!(tools.called().len(), 1);

    // Other subjects have their own window
    let other = AxumTestRequest::post(COACH_TURN)
        .header("authorization", &bearer("athlete-2"))
        .json(&turn_body("Show today's summary"))
        .send(routes::router(resources))
        .await;
    assert_eq!(other.status(), 200);
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[tokio::test]
async fn test_misconfigured_runtime_is_server_error() {
    let tools = RecordingTools::new();
    let controller = test_controller(None, Arc::clone(&tools), test_turn_config());
    let auth: Arc<dyn pierre_coach::auth::AuthProvider> =
        Arc::new(pierre_coach::auth::JwtAuth::new(common::TEST_JWT_SECRET));
    let limiter: Arc<dyn RateLimiter> =
        Arc::new(InMemoryRateLimiter::new(10, Duration::from_secs(60)));
    let resources = Arc::new(
        CoachResources::new(Some(auth), limiter, controller)
            .with_misconfiguration("GROQ_API_KEY is not configured"),
    );

    let response = AxumTestRequest::post(COACH_TURN)
        .header("authorization", &bearer("athlete-1"))
        .json(&turn_body("Show today's summary"))
        .send(routes::router(resources))
        .await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json();
    assert_eq!(error_code(&body), "CONFIG_MISSING");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("GROQ_API_KEY"));
    assert!(tools.called().is_empty());
}

#[tokio::test]
async fn test_missing_jwt_secret_is_server_error() {
    let tools = RecordingTools::new();
    let controller = test_controller(None, tools, test_turn_config());
    let limiter: Arc<dyn RateLimiter> =
        Arc::new(InMemoryRateLimiter::new(10, Duration::from_secs(60)));
    let resources = Arc::new(CoachResources::new(None, limiter, controller));

    let response = AxumTestRequest::post(COACH_TURN)
        .header("authorization", &bearer("athlete-1"))
        .json(&turn_body("Show today's summary"))
        .send(routes::router(resources))
        .await;

    assert_eq!(response.status(), 500);
    assert_eq!(error_code(&response.json()), "CONFIG_MISSING");
}

// ============================================================================
// Buffered And Streamed Turns
// ============================================================================

#[tokio::test]
async fn test_buffered_turn_returns_json() {
    let (app, tools) = setup_test_environment();

    let response = AxumTestRequest::post(COACH_TURN)
        .header("authorization", &bearer("athlete-1"))
        .json(&turn_body("Show today's summary"))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert!(!body["assistantText"].as_str().unwrap().is_empty());
    assert!(!body["blocks"].as_array().unwrap().is_empty());
    assert_eq!(body["trace"]["toolsUsed"], json!([GET_TODAY_SUMMARY]));
    assert_eq!(body["trace"]["model"], FALLBACK_MODEL_ID);
    assert_eq!(body["trace"]["fallbackUsed"], true);
    assert_eq!(tools.called(), vec![GET_TODAY_SUMMARY.to_owned()]);
}

#[tokio::test]
async fn test_streamed_turn_frames() {
    let (app, _) = setup_test_environment();

    let response = AxumTestRequest::post(COACH_TURN)
        .header("authorization", &bearer("athlete-1"))
        .header("accept", "text/event-stream")
        .json(&turn_body("Log bench press 5 reps at 80"))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    assert!(response
        .header("content-type")
        .unwrap()
        .starts_with("text/event-stream"));
    assert!(response.header("cache-control").unwrap().contains("no-cache"));
    assert_eq!(response.header("x-accel-buffering"), Some("no"));
    assert!(response.header(headers::X_RATE_LIMIT_LIMIT).is_some());

    let frames = response.sse_events();
    let names: Vec<_> = frames.iter().map(SseFrame::name).collect();
    assert_eq!(
        names,
        vec![
            Some("start"),
            None,
            Some("tool_start"),
            Some("tool_result"),
            Some("final"),
        ]
    );
    assert_eq!(frames[1], SseFrame::Comment(test_turn_config().sse_padding_bytes));

    let SseFrame::Event { data: start, .. } = &frames[0] else {
        panic!("expected start event");
    };
    assert_eq!(start["type"], "start");
    assert_eq!(start["model"], FALLBACK_MODEL_ID);

    let SseFrame::Event { data: last, .. } = &frames[4] else {
        panic!("expected final event");
    };
    assert_eq!(last["response"]["trace"]["fallbackUsed"], true);
    assert_eq!(
        last["response"]["assistantText"],
        "Logged bench press: 5 reps at 80 kg."
    );
}

#[tokio::test]
async fn test_stream_requires_auth_before_opening() {
    let (app, _) = setup_test_environment();

    let response = AxumTestRequest::post(COACH_TURN)
        .header("accept", "text/event-stream")
        .json(&turn_body("Show today's summary"))
        .send(app)
        .await;

    assert_eq!(response.status(), 401);
    assert!(!response
        .header("content-type")
        .unwrap_or_default()
        .starts_with("text/event-stream"));
}
