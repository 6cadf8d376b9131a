//! Handlers for `/logs` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/logs/:userId/:projectId` | Ordered by day |
//! | `POST`   | `/logs/:userId/:projectId` | Body: [`NewLog`]; returns 201 |
//! | `DELETE` | `/logs/:userId/:projectId` | Idempotent; returns the removed count |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use istart_core::{
  log::{Log, NewLog},
  store::TrackerStore,
};
use serde_json::{Value, json};

use crate::{ApiState, error::ApiError};

/// `GET /logs/:userId/:projectId`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Path((user_id, project_id)): Path<(String, String)>,
) -> Result<Json<Vec<Log>>, ApiError>
where
  S: TrackerStore,
{
  let logs = state
    .store
    .list_logs(&user_id, &project_id)
    .await
    .map_err(ApiError::store("Failed to fetch logs"))?;
  Ok(Json(logs))
}

/// `POST /logs/:userId/:projectId`
///
/// Stores an already-scored log. The project's cumulative score is left to
/// the caller; `POST /projects/:userId/:projectId/entries` does both at once.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Path((user_id, project_id)): Path<(String, String)>,
  body: Result<Json<NewLog>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackerStore,
{
  let Json(input) = body?;
  let log = state
    .store
    .create_log(&user_id, &project_id, input)
    .await
    .map_err(ApiError::store("Failed to create log"))?;
  Ok((StatusCode::CREATED, Json(log)))
}

/// `DELETE /logs/:userId/:projectId`
pub async fn delete_all<S>(
  State(state): State<ApiState<S>>,
  Path((user_id, project_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: TrackerStore,
{
  let removed = state
    .store
    .delete_logs(&user_id, &project_id)
    .await
    .map_err(ApiError::store("Failed to delete logs"))?;
  Ok(Json(json!({ "logsRemoved": removed })))
}
