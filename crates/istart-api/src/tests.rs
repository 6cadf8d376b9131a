//! Router tests: the full API over an in-memory store and a mock Gemini
//! upstream.

use std::{sync::Arc, time::Duration};

use axum::{
  Json, Router,
  body::Body,
  http::{Method, Request, StatusCode},
  routing::post,
};
use chrono::Utc;
use istart_scoring::{GeminiClient, GeminiConfig};
use istart_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiState, api_router};

// ─── Harness ─────────────────────────────────────────────────────────────────

/// Start a fake `generateContent` endpoint that always replies with `reply`
/// as the model text.
async fn mock_gemini(reply: &'static str) -> String {
  let app = Router::new().route(
    "/generate",
    post(move || async move {
      Json(json!({ "candidates": [{ "content": { "parts": [{ "text": reply }] } }] }))
    }),
  );
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  format!("http://{addr}/generate")
}

const SCORE_12: &str = "```json\n{\"score\":12,\"analysis\":\"Solid start.\",\"onTrack\":false,\"suggestion\":\"Finish the parser.\"}\n```";

async fn app_with(endpoint: String, server_key: Option<&str>) -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let scorer = GeminiClient::new(GeminiConfig {
    endpoint,
    api_key: server_key.map(str::to_owned),
    timeout: Duration::from_secs(5),
  })
  .unwrap();
  api_router(ApiState::new(Arc::new(store), scorer))
}

async fn app() -> Router { app_with(mock_gemini(SCORE_12).await, Some("server-key")).await }

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let request = match body {
    Some(body) => builder
      .header("content-type", "application/json")
      .body(Body::from(body.to_string())),
    None => builder.body(Body::empty()),
  }
  .unwrap();

  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

fn project_body(id: &str, deadline: u32) -> Value {
  json!({
    "id": id,
    "name": "Compiler",
    "description": "Write a toy compiler",
    "milestones": ["lexer", "parser", "codegen"],
    "deadline": deadline,
    "startDate": Utc::now().date_naive(),
  })
}

fn log_body(day: i64, score: f64) -> Value {
  json!({
    "day": day,
    "work": "Wrote the lexer",
    "score": score,
    "analysis": "Good.",
    "suggestion": "Keep going.",
    "onTrack": true,
  })
}

// ─── Projects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_list_newest_first() {
  let app = app().await;

  let (status, body) = send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["id"], "p1");
  assert_eq!(body["userId"], "u1");
  assert_eq!(body["cumulativeScore"], 0.0);

  send(&app, Method::POST, "/projects/u1", Some(project_body("p2", 5))).await;

  let (status, body) = send(&app, Method::GET, "/projects/u1", None).await;
  assert_eq!(status, StatusCode::OK);
  let ids: Vec<_> = body.as_array().unwrap().iter().map(|p| p["id"].clone()).collect();
  assert_eq!(ids, vec![json!("p2"), json!("p1")]);

  let (_, body) = send(&app, Method::GET, "/projects/someone-else", None).await;
  assert_eq!(body, json!([]));
}

#[tokio::test]
async fn create_generates_id_when_absent() {
  let app = app().await;
  let mut body = project_body("", 3);
  body.as_object_mut().unwrap().remove("id");

  let (status, body) = send(&app, Method::POST, "/projects/u1", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(body["id"].as_str().unwrap().starts_with("proj-"));
}

#[tokio::test]
async fn invalid_project_is_bad_request() {
  let app = app().await;

  let (status, body) = send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 0))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("deadline"));

  let mut blank = project_body("p1", 5);
  blank["name"] = json!("   ");
  let (status, _) = send(&app, Method::POST, "/projects/u1", Some(blank)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send(&app, Method::POST, "/projects/u1", Some(json!("nope"))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn duplicate_project_id_conflicts() {
  let app = app().await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;
  let (status, _) = send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn get_and_update_missing_project_is_404() {
  let app = app().await;

  let (status, body) = send(&app, Method::GET, "/projects/u1/nope", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "error": "Project not found" }));

  let (status, _) =
    send(&app, Method::PUT, "/projects/u1/nope", Some(json!({ "name": "X" }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_merges_fields() {
  let app = app().await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;

  let patch = json!({ "cumulativeScore": 30.5, "completedMilestones": [1] });
  let (status, body) = send(&app, Method::PUT, "/projects/u1/p1", Some(patch)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["cumulativeScore"], 30.5);
  assert_eq!(body["completedMilestones"], json!([1]));
  assert_eq!(body["name"], "Compiler");

  let (status, _) =
    send(&app, Method::PUT, "/projects/u1/p1", Some(json!({ "deadline": 0 }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn shrinking_milestones_drops_stale_completions() {
  let app = app().await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;
  send(&app, Method::PUT, "/projects/u1/p1", Some(json!({ "completedMilestones": [0, 2] }))).await;

  let patch = json!({ "milestones": ["lexer ", "  ", "parser"] });
  let (status, body) = send(&app, Method::PUT, "/projects/u1/p1", Some(patch)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["milestones"], json!(["lexer", "parser"]));
  assert_eq!(body["completedMilestones"], json!([0]));

  let (status, _) = send(&app, Method::POST, "/projects/u1/p1/milestones/2", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_cascades_to_logs() {
  let app = app().await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;
  send(&app, Method::POST, "/logs/u1/p1", Some(log_body(1, 10.0))).await;

  let (status, body) = send(&app, Method::DELETE, "/projects/u1/p1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["logsRemoved"], 1);

  let (_, body) = send(&app, Method::GET, "/projects/u1", None).await;
  assert_eq!(body, json!([]));
  let (_, body) = send(&app, Method::GET, "/logs/u1/p1", None).await;
  assert_eq!(body, json!([]));

  let (status, _) = send(&app, Method::DELETE, "/projects/u1/p1", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  // The legacy follow-up call still succeeds.
  let (status, body) = send(&app, Method::DELETE, "/logs/u1/p1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["logsRemoved"], 0);
}

// ─── Logs ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn logs_are_listed_by_day() {
  let app = app().await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;

  for day in [2, 1] {
    let (status, body) = send(&app, Method::POST, "/logs/u1/p1", Some(log_body(day, 8.0))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["projectId"], "p1");
  }

  let (_, body) = send(&app, Method::GET, "/logs/u1/p1", None).await;
  let days: Vec<_> = body.as_array().unwrap().iter().map(|l| l["day"].clone()).collect();
  assert_eq!(days, vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn log_validation_and_missing_project() {
  let app = app().await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;

  let (status, _) = send(&app, Method::POST, "/logs/u1/p1", Some(log_body(1, 21.0))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(&app, Method::POST, "/logs/u1/ghost", Some(log_body(1, 5.0))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn user_settings_fetch_or_create_and_upsert() {
  let app = app().await;

  let (status, body) = send(&app, Method::GET, "/users/u1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["userId"], "u1");
  assert_eq!(body["apiKey"], "");

  let (status, body) =
    send(&app, Method::PUT, "/users/u1", Some(json!({ "apiKey": " AIza-test " }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["apiKey"], "AIza-test");

  let (_, body) = send(&app, Method::GET, "/users/u1", None).await;
  assert_eq!(body["apiKey"], "AIza-test");
}

#[tokio::test]
async fn reset_removes_everything_for_the_user() {
  let app = app().await;
  send(&app, Method::PUT, "/users/u1", Some(json!({ "apiKey": "k" }))).await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p2", 5))).await;
  send(&app, Method::POST, "/logs/u1/p1", Some(log_body(1, 4.0))).await;
  send(&app, Method::POST, "/projects/u2", Some(project_body("other", 5))).await;

  let (status, body) = send(&app, Method::DELETE, "/users/u1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "projectsRemoved": 2, "logsRemoved": 1 }));

  let (_, body) = send(&app, Method::GET, "/projects/u1", None).await;
  assert_eq!(body, json!([]));
  let (_, body) = send(&app, Method::GET, "/users/u1", None).await;
  assert_eq!(body["apiKey"], "");
  let (_, body) = send(&app, Method::GET, "/projects/u2", None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
}

// ─── Scoring proxy ───────────────────────────────────────────────────────────

#[tokio::test]
async fn score_requires_prompt() {
  let app = app().await;

  let (status, body) = send(&app, Method::POST, "/score", Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "error": "Prompt is required" }));

  let (status, _) = send(&app, Method::POST, "/score", Some(json!({ "prompt": "" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn score_returns_validated_assessment() {
  let app = app().await;

  let (status, body) =
    send(&app, Method::POST, "/score", Some(json!({ "prompt": "Rate my day" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["score"], 12.0);
  assert_eq!(body["onTrack"], false);
  assert_eq!(body["suggestion"], "Finish the parser.");
}

#[tokio::test]
async fn score_without_key_is_server_error() {
  let app = app_with(mock_gemini(SCORE_12).await, None).await;

  let (status, body) =
    send(&app, Method::POST, "/score", Some(json!({ "prompt": "Rate my day" }))).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["kind"], "key_missing");
}

#[tokio::test]
async fn unreachable_upstream_does_not_leak_the_server_key() {
  // Nothing listens on the discard port.
  let app = app_with("http://127.0.0.1:9/generate".to_owned(), Some("SECRET-SERVER-KEY")).await;

  let (status, body) =
    send(&app, Method::POST, "/score", Some(json!({ "prompt": "Rate my day" }))).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["kind"], "request_failed");
  assert!(!body.to_string().contains("SECRET-SERVER-KEY"));
}

#[tokio::test]
async fn unusable_model_reply_is_classified() {
  let app = app_with(mock_gemini("{\"score\":9}").await, Some("k")).await;

  let (status, body) = send(&app, Method::POST, "/score", Some(json!({ "prompt": "p" }))).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["error"], "Invalid response format from AI");
}

// ─── Tracking flow ───────────────────────────────────────────────────────────

#[tokio::test]
async fn daily_entry_scores_and_accumulates() {
  let app = app().await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;

  let (status, body) = send(
    &app,
    Method::POST,
    "/projects/u1/p1/entries",
    Some(json!({ "work": "Wrote the lexer" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["log"]["day"], 1);
  assert_eq!(body["log"]["score"], 12.0);
  assert_eq!(body["log"]["analysis"], "Solid start.");
  assert_eq!(body["project"]["cumulativeScore"], 12.0);
  assert_eq!(body["progress"]["expectedScore"], 20.0);
  assert_eq!(body["progress"]["pace"], -8.0);
  assert_eq!(body["progress"]["status"], "slightly-behind");
  assert_eq!(body["progress"]["label"], "Slightly Behind");
  assert_eq!(body["progress"]["loggedToday"], true);

  let (_, logs) = send(&app, Method::GET, "/logs/u1/p1", None).await;
  assert_eq!(logs.as_array().unwrap().len(), 1);

  let (status, body) = send(
    &app,
    Method::POST,
    "/projects/u1/p1/entries",
    Some(json!({ "work": "More work" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "Work already logged for today");
}

#[tokio::test]
async fn daily_entry_rejects_blank_work_and_unknown_project() {
  let app = app().await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;

  let (status, _) =
    send(&app, Method::POST, "/projects/u1/p1/entries", Some(json!({ "work": "  " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) =
    send(&app, Method::POST, "/projects/u1/ghost/entries", Some(json!({ "work": "x" }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn daily_entry_uses_the_users_own_key() {
  let app = app_with(mock_gemini(SCORE_12).await, None).await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;

  let (status, body) =
    send(&app, Method::POST, "/projects/u1/p1/entries", Some(json!({ "work": "x" }))).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["kind"], "key_missing");

  send(&app, Method::PUT, "/users/u1", Some(json!({ "apiKey": "user-key" }))).await;
  let (status, _) =
    send(&app, Method::POST, "/projects/u1/p1/entries", Some(json!({ "work": "x" }))).await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn status_reports_progress() {
  let app = app().await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 4))).await;

  let (status, body) = send(&app, Method::GET, "/projects/u1/p1/status", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["day"], 1);
  assert_eq!(body["daysRemaining"], 3);
  assert_eq!(body["expectedScore"], 25.0);
  assert_eq!(body["maxScore"], 80.0);
  assert_eq!(body["status"], "behind");
  assert_eq!(body["loggedToday"], false);
  assert_eq!(body["totalMilestones"], 3);

  let (status, _) = send(&app, Method::GET, "/projects/u1/ghost/status", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn milestone_toggle_round_trips() {
  let app = app().await;
  send(&app, Method::POST, "/projects/u1", Some(project_body("p1", 5))).await;

  let (status, body) = send(&app, Method::POST, "/projects/u1/p1/milestones/2", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["completedMilestones"], json!([2]));

  let (_, body) = send(&app, Method::POST, "/projects/u1/p1/milestones/0", None).await;
  assert_eq!(body["completedMilestones"], json!([2, 0]));

  let (_, body) = send(&app, Method::POST, "/projects/u1/p1/milestones/2", None).await;
  assert_eq!(body["completedMilestones"], json!([0]));

  let (status, _) = send(&app, Method::POST, "/projects/u1/p1/milestones/3", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = send(&app, Method::POST, "/projects/u1/p1/milestones/first", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = send(&app, Method::POST, "/projects/u1/ghost/milestones/0", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
