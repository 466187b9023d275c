//! End-to-end tests for the HTTP endpoints.
//!
//! Each test drives the router in-process with `oneshot`, backed by an
//! in-memory database and scripted AI.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use vowarc_core::ai::fake::ScriptedAi;
use vowarc_core::ai::ExtractedMemory;
use vowarc_core::{Config, Database, MemoryType, Phase, VowArc};
use vowarc_server::create_router;

struct TestApp {
    db: Arc<Database>,
    ai: Arc<ScriptedAi>,
    router: Router,
    token: String,
    user_id: String,
}

fn app(ai: ScriptedAi) -> TestApp {
    let db = Arc::new(Database::open_memory().unwrap());
    let ai = Arc::new(ai);
    let now = chrono::Utc::now();
    let user = db.create_user(now).unwrap();
    let token = db.issue_token(&user.id, now).unwrap();
    let router = create_router(VowArc::new(db.clone(), ai.clone(), Config::default()));
    TestApp {
        db,
        ai,
        router,
        token,
        user_id: user.id,
    }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_is_ok() {
    let t = app(ScriptedAi::new());
    let response = t
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn analyze_evidences_returns_scores_and_highlights() {
    let t = app(ScriptedAi::new().with_uniform_score(0.7));
    let (status, body) = send(
        &t.router,
        Method::POST,
        "/analyze-evidences",
        None,
        Some(json!({
            "evidences": [
                {"id": "a", "content": "Cooked at home", "submittedAt": "2026-02-01T19:00:00Z"},
                {"id": "b", "content": "Skipped takeout", "createdAt": "2026-02-02T19:00:00Z"}
            ],
            "vowContent": "I cook for myself"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["scores"].as_array().unwrap().len(), 2);
    assert_eq!(body["scores"][0]["evidenceId"], "a");
    assert_eq!(body["highlights"][0]["isHighlight"], true);
}

#[tokio::test]
async fn empty_evidences_do_not_call_ai() {
    let t = app(ScriptedAi::new().with_uniform_score(0.7));
    let (status, body) = send(
        &t.router,
        Method::POST,
        "/analyze-evidences",
        None,
        Some(json!({"evidences": []})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scores"], json!([]));
    assert_eq!(body["highlights"], json!([]));
    assert_eq!(t.ai.calls(), 0);
}

#[tokio::test]
async fn ai_outage_is_bad_gateway_with_generic_message() {
    let t = app(ScriptedAi::failing());
    let (status, body) = send(
        &t.router,
        Method::POST,
        "/generate-mirror-feedback",
        None,
        Some(json!({"checkinText": "Meditated for ten minutes"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "analysis_failure");
    assert!(!body["message"].as_str().unwrap().contains("unreachable"));
}

#[tokio::test]
async fn missing_token_is_rejected_before_ai() {
    let t = app(ScriptedAi::new().with_meaning("m", "v"));
    let (status, body) = send(
        &t.router,
        Method::POST,
        "/generate-meaning",
        None,
        Some(json!({"why": "a", "pain": "b", "ideal": "c"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "auth_failure");
    assert_eq!(t.ai.calls(), 0);
}

#[tokio::test]
async fn invalid_token_is_rejected_even_with_bad_body() {
    let t = app(ScriptedAi::new());
    let (status, _) = send(
        &t.router,
        Method::POST,
        "/extract-memories",
        Some("wrong"),
        Some(json!("not an object")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn generate_meaning_persists() {
    let t = app(ScriptedAi::new().with_meaning("I want calm mornings", "I wake at 6:30"));
    let (status, body) = send(
        &t.router,
        Method::POST,
        "/generate-meaning",
        Some(&t.token),
        Some(json!({"why": "Stress", "pain": "Rushed days", "ideal": "Calm"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meaningStatement"], "I want calm mornings");
    assert_eq!(body["vow"], "I wake at 6:30");
    assert_eq!(t.db.get_vow(&t.user_id).unwrap().unwrap().content, "I wake at 6:30");
}

#[tokio::test]
async fn blank_answer_is_bad_request() {
    let t = app(ScriptedAi::new().with_meaning("m", "v"));
    let (status, body) = send(
        &t.router,
        Method::POST,
        "/generate-meaning",
        Some(&t.token),
        Some(json!({"why": "Stress", "pain": "   ", "ideal": "Calm"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failure");
}

#[tokio::test]
async fn extract_memories_with_no_results() {
    let t = app(ScriptedAi::new().with_memories(vec![]));
    let (status, body) = send(
        &t.router,
        Method::POST,
        "/extract-memories",
        Some(&t.token),
        Some(json!({"checkinId": "c1", "transcript": "Uneventful day"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "count": 0}));
}

#[tokio::test]
async fn extract_memories_stores_rows() {
    let t = app(ScriptedAi::new().with_memories(vec![ExtractedMemory {
        content: "Started therapy".into(),
        memory_type: MemoryType::Milestone,
        tags: vec!["health".into()],
        confidence: 0.8,
    }]));
    let (status, body) = send(
        &t.router,
        Method::POST,
        "/extract-memories",
        Some(&t.token),
        Some(json!({"checkinId": "c2", "transcript": "First therapy session today"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    let stored = t
        .db
        .list_active_memories(&t.user_id, chrono::Utc::now())
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].source_type, "checkin");
}

#[tokio::test]
async fn accept_contract_twice() {
    let t = app(ScriptedAi::new());

    let (status, first) = send(&t.router, Method::POST, "/accept-contract", Some(&t.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["currentPhase"], "trial");

    let (status, second) = send(&t.router, Method::POST, "/accept-contract", Some(&t.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["success"], true);

    let stored = t.db.get_user(&t.user_id).unwrap().unwrap();
    assert_eq!(stored.current_phase, Phase::Trial);

    let parse = |v: &Value| {
        serde_json::from_value::<chrono::DateTime<chrono::Utc>>(v.clone()).unwrap()
    };
    let (first_start, second_start) = (parse(&first["trialStartDate"]), parse(&second["trialStartDate"]));
    assert!(second_start >= first_start);
    // Stored with microsecond precision.
    let drift = second_start - stored.trial_start_date.unwrap();
    assert!(drift < chrono::Duration::milliseconds(1));
}

#[tokio::test]
async fn day21_report_and_decision() {
    let t = app(ScriptedAi::new().with_uniform_score(0.5));
    send(&t.router, Method::POST, "/accept-contract", Some(&t.token), None).await;

    let (status, report) = send(&t.router, Method::GET, "/day21-report", Some(&t.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["trialDay"], 1);
    assert_eq!(report["tier"]["tier"], "low");
    assert_eq!(report["recommendedPath"], "exit");

    let (status, body) = send(
        &t.router,
        Method::POST,
        "/day21-decision",
        Some(&t.token),
        Some(json!({"decision": "exit"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentPhase"], "exited");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let t = app(ScriptedAi::new());
    let (status, body) = send(
        &t.router,
        Method::POST,
        "/day21-decision",
        Some(&t.token),
        Some(json!({"decision": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failure");
}
