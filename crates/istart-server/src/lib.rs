//! The iStart HTTP server: configuration, liveness, and the middleware stack
//! wrapped around [`istart_api::api_router`].

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use axum::{Json, Router, routing::get};
use istart_api::{ApiState, api_router};
use istart_core::store::TrackerStore;
use istart_scoring::{DEFAULT_ENDPOINT, GeminiConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration.
///
/// Layered from built-in defaults, an optional TOML file, and `ISTART_*`
/// environment variables (e.g. `ISTART_PORT`, `ISTART_GEMINI_API_KEY`).
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  /// SQLite database file; a leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  /// Key used when a user has not stored their own.
  #[serde(default)]
  pub gemini_api_key:       Option<String>,
  #[serde(default = "default_endpoint")]
  pub gemini_endpoint:      String,
  #[serde(default = "default_timeout")]
  pub request_timeout_secs: u64,
}

fn default_host() -> String { "0.0.0.0".to_owned() }
fn default_port() -> u16 { 3001 }
fn default_store_path() -> PathBuf { PathBuf::from("istart.db") }
fn default_endpoint() -> String { DEFAULT_ENDPOINT.to_owned() }
fn default_timeout() -> u64 { 60 }

impl ServerConfig {
  /// Read `path` (if it exists) and the `ISTART_*` environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ISTART").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~/` expanded to `$HOME`.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  /// Use `fallback` as the server Gemini key when none is configured.
  pub fn fill_gemini_key(&mut self, fallback: Option<String>) {
    if self.gemini_api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
      self.gemini_api_key = fallback;
    }
  }

  pub fn gemini(&self) -> GeminiConfig {
    GeminiConfig {
      endpoint: self.gemini_endpoint.clone(),
      api_key:  self.gemini_api_key.clone(),
      timeout:  Duration::from_secs(self.request_timeout_secs),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> Json<Value> {
  Json(json!({ "status": "OK", "message": "iStart API is running" }))
}

/// The complete application: `/health`, the REST API under `/api`, request
/// tracing, and permissive CORS for the browser client.
pub fn app<S>(state: ApiState<S>) -> Router
where
  S: TrackerStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
}
