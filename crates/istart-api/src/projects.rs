//! Handlers for `/projects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/projects/:userId` | Newest first |
//! | `POST`   | `/projects/:userId` | Body: [`NewProject`]; returns 201 |
//! | `GET`    | `/projects/:userId/:projectId` | 404 if not found |
//! | `PUT`    | `/projects/:userId/:projectId` | Body: [`ProjectPatch`] |
//! | `DELETE` | `/projects/:userId/:projectId` | Removes the project and its logs |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use istart_core::{
  project::{NewProject, Project, ProjectPatch},
  store::TrackerStore,
};
use serde_json::{Value, json};

use crate::{ApiState, error::ApiError};

fn not_found() -> ApiError { ApiError::NotFound("Project not found".to_owned()) }

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /projects/:userId`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Path(user_id): Path<String>,
) -> Result<Json<Vec<Project>>, ApiError>
where
  S: TrackerStore,
{
  let projects = state
    .store
    .list_projects(&user_id)
    .await
    .map_err(ApiError::store("Failed to fetch projects"))?;
  Ok(Json(projects))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /projects/:userId/:projectId`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path((user_id, project_id)): Path<(String, String)>,
) -> Result<Json<Project>, ApiError>
where
  S: TrackerStore,
{
  let project = state
    .store
    .get_project(&user_id, &project_id)
    .await
    .map_err(ApiError::store("Failed to fetch project"))?
    .ok_or_else(not_found)?;
  Ok(Json(project))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /projects/:userId`, returns 201 + the stored project.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Path(user_id): Path<String>,
  body: Result<Json<NewProject>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackerStore,
{
  let Json(input) = body?;
  let project = state
    .store
    .create_project(&user_id, input)
    .await
    .map_err(ApiError::store("Failed to create project"))?;
  tracing::info!(%user_id, project_id = %project.id, "project created");
  Ok((StatusCode::CREATED, Json(project)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /projects/:userId/:projectId`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  Path((user_id, project_id)): Path<(String, String)>,
  body: Result<Json<ProjectPatch>, JsonRejection>,
) -> Result<Json<Project>, ApiError>
where
  S: TrackerStore,
{
  let Json(patch) = body?;
  let project = state
    .store
    .update_project(&user_id, &project_id, patch)
    .await
    .map_err(ApiError::store("Failed to update project"))?
    .ok_or_else(not_found)?;
  Ok(Json(project))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /projects/:userId/:projectId`
pub async fn delete<S>(
  State(state): State<ApiState<S>>,
  Path((user_id, project_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: TrackerStore,
{
  let deletion = state
    .store
    .delete_project(&user_id, &project_id)
    .await
    .map_err(ApiError::store("Failed to delete project"))?
    .ok_or_else(not_found)?;
  tracing::info!(%user_id, %project_id, logs_removed = deletion.logs_removed, "project deleted");
  Ok(Json(json!({
    "message": "Project deleted successfully",
    "logsRemoved": deletion.logs_removed,
  })))
}
