//! HTTP client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  Result, ScoreError,
  response::{Assessment, parse_assessment},
};

pub const DEFAULT_ENDPOINT: &str =
  "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
  /// Full `generateContent` URL. The key travels in a header, never the URL.
  pub endpoint: String,
  /// Server-wide key, used when the caller has none of its own.
  pub api_key:  Option<String>,
  pub timeout:  Duration,
}

impl Default for GeminiConfig {
  fn default() -> Self {
    Self {
      endpoint: DEFAULT_ENDPOINT.to_owned(),
      api_key:  None,
      timeout:  Duration::from_secs(60),
    }
  }
}

/// Scores work entries through Gemini. Cheap to clone.
#[derive(Debug, Clone)]
pub struct GeminiClient {
  client:   reqwest::Client,
  endpoint: String,
  api_key:  Option<String>,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
  content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
  text: Option<String>,
}

impl GenerateResponse {
  fn into_text(self) -> Option<String> {
    self
      .candidates
      .into_iter()
      .next()?
      .content?
      .parts
      .into_iter()
      .next()?
      .text
      .filter(|t| !t.is_empty())
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

impl GeminiClient {
  pub fn new(config: GeminiConfig) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(config.timeout).build()?;
    Ok(Self {
      client,
      endpoint: config.endpoint,
      api_key: config.api_key.filter(|k| !k.trim().is_empty()),
    })
  }

  pub fn has_server_key(&self) -> bool { self.api_key.is_some() }

  /// Pick the key for a request: the caller's own if non-empty, else the
  /// server key.
  pub fn resolve_key<'a>(&'a self, user_key: Option<&'a str>) -> Result<&'a str> {
    user_key
      .map(str::trim)
      .filter(|k| !k.is_empty())
      .or(self.api_key.as_deref())
      .ok_or(ScoreError::MissingApiKey)
  }

  /// Send `prompt` upstream once and return the raw candidate text.
  pub async fn generate(&self, api_key: &str, prompt: &str) -> Result<String> {
    let body = json!({
      "contents": [{ "parts": [{ "text": prompt }] }]
    });

    let response = self
      .client
      .post(&self.endpoint)
      .header(API_KEY_HEADER, api_key)
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
      let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.pointer("/error/message")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| "Gemini API request failed".to_owned());
      tracing::warn!(status = status.as_u16(), %message, "gemini request failed");
      return Err(ScoreError::Upstream { status: status.as_u16(), message });
    }

    let envelope: GenerateResponse = serde_json::from_str(&text).map_err(ScoreError::Parse)?;
    envelope.into_text().ok_or(ScoreError::EmptyResponse)
  }

  /// Score a prompt, using `user_key` if given and the server key otherwise.
  pub async fn score(&self, prompt: &str, user_key: Option<&str>) -> Result<Assessment> {
    let key = self.resolve_key(user_key)?;
    let text = self.generate(key, prompt).await?;
    let assessment = parse_assessment(&text).inspect_err(|e| {
      tracing::warn!(error = %e, "unusable gemini reply");
    })?;
    tracing::debug!(score = assessment.score, on_track = assessment.on_track, "work scored");
    Ok(assessment)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    sync::{
      Arc,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::post,
  };

  use super::*;

  /// Canned upstream behaviour for one mock server.
  struct Mock {
    status: StatusCode,
    body:   Value,
    calls:  AtomicUsize,
    keys:   std::sync::Mutex<Vec<String>>,
    /// Requests that carried a `key` query parameter.
    leaked: AtomicUsize,
  }

  async fn generate(
    State(mock): State<Arc<Mock>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
  ) -> (StatusCode, Json<Value>) {
    mock.calls.fetch_add(1, Ordering::SeqCst);
    if query.contains_key("key") {
      mock.leaked.fetch_add(1, Ordering::SeqCst);
    }
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
      mock.keys.lock().unwrap().push(key.to_owned());
    }
    (mock.status, Json(mock.body.clone()))
  }

  async fn spawn_mock(status: StatusCode, body: Value) -> (String, Arc<Mock>) {
    let mock = Arc::new(Mock {
      status,
      body,
      calls: AtomicUsize::new(0),
      keys: Default::default(),
      leaked: AtomicUsize::new(0),
    });
    let app = Router::new()
      .route("/generate", post(generate))
      .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (format!("http://{addr}/generate"), mock)
  }

  fn candidate(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
  }

  fn client(endpoint: String, server_key: Option<&str>) -> GeminiClient {
    GeminiClient::new(GeminiConfig {
      endpoint,
      api_key: server_key.map(str::to_owned),
      timeout: Duration::from_secs(5),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn scores_fenced_reply_and_clamps() {
    let reply = "```json\n{\"score\":27,\"analysis\":\"Huge day.\",\"onTrack\":true,\"suggestion\":\"Rest.\"}\n```";
    let (url, mock) = spawn_mock(StatusCode::OK, candidate(reply)).await;

    let assessment = client(url, Some("server-key")).score("prompt", None).await.unwrap();
    assert_eq!(assessment.score, 20.0);
    assert!(assessment.on_track);
    assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
    assert_eq!(*mock.keys.lock().unwrap(), vec!["server-key".to_owned()]);
    assert_eq!(mock.leaked.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn user_key_takes_precedence() {
    let reply = r#"{"score":5,"analysis":"a","onTrack":false,"suggestion":"s"}"#;
    let (url, mock) = spawn_mock(StatusCode::OK, candidate(reply)).await;

    client(url, Some("server-key")).score("prompt", Some("user-key")).await.unwrap();
    assert_eq!(*mock.keys.lock().unwrap(), vec!["user-key".to_owned()]);
  }

  #[tokio::test]
  async fn missing_key_fails_without_calling_upstream() {
    let (url, mock) = spawn_mock(StatusCode::OK, candidate("{}")).await;

    let err = client(url, None).score("prompt", Some("  ")).await.unwrap_err();
    assert!(matches!(err, ScoreError::MissingApiKey));
    assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn upstream_error_message_is_surfaced_once() {
    let body = json!({ "error": { "message": "API key not valid. API_KEY_INVALID" } });
    let (url, mock) = spawn_mock(StatusCode::BAD_REQUEST, body).await;

    let err = client(url, Some("k")).score("prompt", None).await.unwrap_err();
    match err {
      ScoreError::Upstream { status, message } => {
        assert_eq!(status, 400);
        assert!(message.contains("API_KEY_INVALID"));
      }
      other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn upstream_error_without_message_uses_fallback() {
    let (url, _mock) = spawn_mock(StatusCode::SERVICE_UNAVAILABLE, json!({})).await;

    let err = client(url, Some("k")).score("prompt", None).await.unwrap_err();
    assert_eq!(err.to_string(), "Gemini API request failed");
  }

  #[tokio::test]
  async fn no_candidates_is_empty_response() {
    let (url, _mock) = spawn_mock(StatusCode::OK, json!({ "candidates": [] })).await;

    let err = client(url, Some("k")).score("prompt", None).await.unwrap_err();
    assert!(matches!(err, ScoreError::EmptyResponse));
    assert_eq!(err.to_string(), "No response from AI");
  }

  #[tokio::test]
  async fn incomplete_reply_is_invalid_format() {
    let reply = r#"{"score":10,"analysis":"a","suggestion":"s"}"#;
    let (url, _mock) = spawn_mock(StatusCode::OK, candidate(reply)).await;

    let err = client(url, Some("k")).score("prompt", None).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_format");
  }

  #[test]
  fn blank_server_key_counts_as_none() {
    let endpoint = || DEFAULT_ENDPOINT.to_owned();
    assert!(!client(endpoint(), None).has_server_key());
    assert!(!client(endpoint(), Some("   ")).has_server_key());
    assert!(client(endpoint(), Some("k")).has_server_key());
  }

  #[tokio::test]
  async fn connection_failure_does_not_expose_the_key() {
    // Nothing listens on the discard port.
    let client = client("http://127.0.0.1:9/generate".to_owned(), Some("SECRET-SERVER-KEY"));

    let err = client.score("prompt", None).await.unwrap_err();
    assert_eq!(err.kind(), "request_failed");
    assert!(!err.to_string().contains("SECRET-SERVER-KEY"));
    assert!(!format!("{err:?}").contains("SECRET-SERVER-KEY"));
  }
}
