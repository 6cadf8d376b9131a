//! Server-side tracking flow: daily entries, progress status, milestones.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/projects/:userId/:projectId/entries` | Body: `{"work":"..."}`; scores and records today's work |
//! | `GET`  | `/projects/:userId/:projectId/status` | [`ProgressReport`] for today |
//! | `POST` | `/projects/:userId/:projectId/milestones/:index` | Toggle one milestone |

use axum::{
  Json,
  extract::{Path, State, rejection::{JsonRejection, PathRejection}},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use istart_core::{
  dates::{days_since, has_today_log},
  log::{Log, NewLog},
  project::{Project, ProjectPatch},
  status::ProgressReport,
  store::TrackerStore,
};
use istart_scoring::build_prompt;
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

fn not_found() -> ApiError { ApiError::NotFound("Project not found".to_owned()) }

fn today() -> NaiveDate { Utc::now().date_naive() }

async fn load_project<S: TrackerStore>(
  state: &ApiState<S>,
  user_id: &str,
  project_id: &str,
) -> Result<Project, ApiError> {
  state
    .store
    .get_project(user_id, project_id)
    .await
    .map_err(ApiError::store("Failed to fetch project"))?
    .ok_or_else(not_found)
}

async fn load_logs<S: TrackerStore>(
  state: &ApiState<S>,
  user_id: &str,
  project_id: &str,
) -> Result<Vec<Log>, ApiError> {
  state
    .store
    .list_logs(user_id, project_id)
    .await
    .map_err(ApiError::store("Failed to fetch logs"))
}

// ─── Daily entry ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EntryBody {
  #[serde(default)]
  pub work: String,
}

/// Everything the client needs to refresh after a submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
  pub log:      Log,
  pub project:  Project,
  pub progress: ProgressReport,
}

/// `POST /projects/:userId/:projectId/entries`
///
/// At most one entry per calendar day (UTC). The scored log and the new
/// cumulative score are written in one transaction.
pub async fn submit<S>(
  State(state): State<ApiState<S>>,
  Path((user_id, project_id)): Path<(String, String)>,
  body: Result<Json<EntryBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackerStore,
{
  let Json(body) = body?;
  let project = load_project(&state, &user_id, &project_id).await?;
  let mut logs = load_logs(&state, &user_id, &project_id).await?;

  let work = body.work.trim();
  if work.is_empty() {
    return Err(ApiError::BadRequest("work is required".to_owned()));
  }

  let today = today();
  if has_today_log(&logs, today) {
    return Err(ApiError::Conflict("Work already logged for today".to_owned()));
  }
  let day = days_since(project.start_date, today);

  let user = state
    .store
    .ensure_user(&user_id)
    .await
    .map_err(ApiError::store("Failed to fetch user settings"))?;

  let prompt = build_prompt(&project, &logs, day, work);
  let assessment = state.scorer.score(&prompt, user.api_key()).await?;

  let entry = NewLog {
    day,
    work: work.to_owned(),
    score: assessment.score,
    date: Some(today),
    analysis: assessment.analysis,
    suggestion: assessment.suggestion,
    on_track: assessment.on_track,
  };
  let (log, project) = state
    .store
    .record_daily_log(&user_id, &project_id, entry)
    .await
    .map_err(ApiError::store("Failed to create log"))?;

  tracing::info!(%user_id, %project_id, day, score = log.score, "daily work recorded");

  logs.push(log.clone());
  let progress = ProgressReport::compute(&project, &logs, today);
  Ok((StatusCode::CREATED, Json(EntryResponse { log, project, progress })))
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// `GET /projects/:userId/:projectId/status`
pub async fn status<S>(
  State(state): State<ApiState<S>>,
  Path((user_id, project_id)): Path<(String, String)>,
) -> Result<Json<ProgressReport>, ApiError>
where
  S: TrackerStore,
{
  let project = load_project(&state, &user_id, &project_id).await?;
  let logs = load_logs(&state, &user_id, &project_id).await?;
  Ok(Json(ProgressReport::compute(&project, &logs, today())))
}

// ─── Milestones ──────────────────────────────────────────────────────────────

/// `POST /projects/:userId/:projectId/milestones/:index`
pub async fn toggle_milestone<S>(
  State(state): State<ApiState<S>>,
  path: Result<Path<(String, String, usize)>, PathRejection>,
) -> Result<Json<Project>, ApiError>
where
  S: TrackerStore,
{
  let Path((user_id, project_id, index)) = path?;
  let project = load_project(&state, &user_id, &project_id).await?;
  let completed = project.toggled_milestones(index)?;

  let patch = ProjectPatch {
    completed_milestones: Some(completed),
    ..Default::default()
  };
  let project = state
    .store
    .update_project(&user_id, &project_id, patch)
    .await
    .map_err(ApiError::store("Failed to update project"))?
    .ok_or_else(not_found)?;
  Ok(Json(project))
}
