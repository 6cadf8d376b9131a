//! Async HTTP client wrapping the iStart JSON API.
//!
//! Every call is scoped by the profile's user id, which the client injects
//! into the path.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use istart_core::{
  log::Log,
  project::Project,
  status::ProgressReport,
  user::{ResetSummary, User},
};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

/// Connection settings for the iStart API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub user_id:  String,
}

/// Body sent to `POST /api/projects/:userId`; the server assigns the id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectBody {
  pub name:        String,
  pub description: String,
  pub milestones:  Vec<String>,
  pub deadline:    u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_date:  Option<NaiveDate>,
}

/// Reply to a daily entry submission.
#[derive(Debug, Deserialize)]
pub struct Entry {
  pub log:      Log,
  pub project:  Project,
  pub progress: ProgressReport,
}

/// Async HTTP client for the iStart REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    // Scoring waits on the model, so allow more than a plain CRUD call needs.
    let client = Client::builder()
      .timeout(Duration::from_secs(90))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  /// `{base}/api/{resource}/{user_id}{rest}`
  fn url(&self, resource: &str, rest: &str) -> String {
    format!(
      "{}/api/{resource}/{}{rest}",
      self.config.base_url.trim_end_matches('/'),
      self.config.user_id,
    )
  }

  // ── Projects ──────────────────────────────────────────────────────────────

  /// `GET /api/projects/:userId`
  pub async fn list_projects(&self) -> Result<Vec<Project>> {
    let resp = self
      .client
      .get(self.url("projects", ""))
      .send()
      .await
      .context("GET /projects failed")?;
    decode(resp).await
  }

  /// `GET /api/projects/:userId/:projectId`
  pub async fn get_project(&self, project_id: &str) -> Result<Project> {
    let resp = self
      .client
      .get(self.url("projects", &format!("/{project_id}")))
      .send()
      .await
      .context("GET /projects/:id failed")?;
    decode(resp).await
  }

  /// `POST /api/projects/:userId`
  pub async fn create_project(&self, input: &NewProjectBody) -> Result<Project> {
    let resp = self
      .client
      .post(self.url("projects", ""))
      .json(input)
      .send()
      .await
      .context("POST /projects failed")?;
    decode(resp).await
  }

  /// `DELETE /api/projects/:userId/:projectId`, then the legacy log cleanup
  /// call. Returns how many logs went with the project.
  pub async fn delete_project(&self, project_id: &str) -> Result<u64> {
    let resp = self
      .client
      .delete(self.url("projects", &format!("/{project_id}")))
      .send()
      .await
      .context("DELETE /projects/:id failed")?;
    let body: Value = decode(resp).await?;

    let resp = self
      .client
      .delete(self.url("logs", &format!("/{project_id}")))
      .send()
      .await
      .context("DELETE /logs/:id failed")?;
    let _: Value = decode(resp).await?;

    Ok(body["logsRemoved"].as_u64().unwrap_or(0))
  }

  /// `POST /api/projects/:userId/:projectId/milestones/:index`
  pub async fn toggle_milestone(&self, project_id: &str, index: usize) -> Result<Project> {
    let resp = self
      .client
      .post(self.url("projects", &format!("/{project_id}/milestones/{index}")))
      .send()
      .await
      .context("POST /milestones failed")?;
    decode(resp).await
  }

  // ── Tracking ──────────────────────────────────────────────────────────────

  /// `GET /api/projects/:userId/:projectId/status`
  pub async fn status(&self, project_id: &str) -> Result<ProgressReport> {
    let resp = self
      .client
      .get(self.url("projects", &format!("/{project_id}/status")))
      .send()
      .await
      .context("GET /status failed")?;
    decode(resp).await
  }

  /// `POST /api/projects/:userId/:projectId/entries`
  pub async fn submit_entry(&self, project_id: &str, work: &str) -> Result<Entry> {
    let resp = self
      .client
      .post(self.url("projects", &format!("/{project_id}/entries")))
      .json(&json!({ "work": work }))
      .send()
      .await
      .context("POST /entries failed")?;
    decode(resp).await
  }

  /// `GET /api/logs/:userId/:projectId`
  pub async fn list_logs(&self, project_id: &str) -> Result<Vec<Log>> {
    let resp = self
      .client
      .get(self.url("logs", &format!("/{project_id}")))
      .send()
      .await
      .context("GET /logs failed")?;
    decode(resp).await
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  /// `GET /api/users/:userId`
  pub async fn get_user(&self) -> Result<User> {
    let resp = self
      .client
      .get(self.url("users", ""))
      .send()
      .await
      .context("GET /users failed")?;
    decode(resp).await
  }

  /// `PUT /api/users/:userId`
  pub async fn set_api_key(&self, key: &str) -> Result<User> {
    let resp = self
      .client
      .put(self.url("users", ""))
      .json(&json!({ "apiKey": key }))
      .send()
      .await
      .context("PUT /users failed")?;
    decode(resp).await
  }

  /// `DELETE /api/users/:userId`
  pub async fn reset(&self) -> Result<ResetSummary> {
    let resp = self
      .client
      .delete(self.url("users", ""))
      .send()
      .await
      .context("DELETE /users failed")?;
    decode(resp).await
  }
}

/// Deserialize a success body, or turn the `{"error": ...}` body into an
/// error carrying a friendly message.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
  let status = resp.status();
  if status.is_success() {
    return resp.json().await.context("deserialising response");
  }

  let message = resp
    .json::<Value>()
    .await
    .ok()
    .and_then(|v| v["error"].as_str().map(str::to_owned))
    .unwrap_or_else(|| format!("request failed with {status}"));
  Err(anyhow!(friendly(&message)))
}

/// Rewrite well-known upstream failures into actionable advice.
pub fn friendly(message: &str) -> String {
  if message.contains("API_KEY_INVALID") {
    "Invalid API key. Check your Gemini API key with `istart key set <KEY>`.".to_owned()
  } else if message.contains("QUOTA_EXCEEDED") {
    "API quota exceeded. Please try again later.".to_owned()
  } else if message.contains("API key not configured") {
    "No API key found. Configure your Gemini API key with `istart key set <KEY>`.".to_owned()
  } else {
    message.to_owned()
  }
}
