//! Handlers for `/users` endpoints.

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use istart_core::{
  store::TrackerStore,
  user::{ResetSummary, User, UserSettings},
};

use crate::{ApiState, error::ApiError};

/// `GET /users/:userId`: fetch the settings, creating them on first use.
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError>
where
  S: TrackerStore,
{
  let user = state
    .store
    .ensure_user(&user_id)
    .await
    .map_err(ApiError::store("Failed to fetch user settings"))?;
  Ok(Json(user))
}

/// `PUT /users/:userId`, body: `{"apiKey":"..."}`.
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  Path(user_id): Path<String>,
  body: Result<Json<UserSettings>, JsonRejection>,
) -> Result<Json<User>, ApiError>
where
  S: TrackerStore,
{
  let Json(settings) = body?;
  let user = state
    .store
    .set_api_key(&user_id, settings.api_key.trim())
    .await
    .map_err(ApiError::store("Failed to update user settings"))?;
  Ok(Json(user))
}

/// `DELETE /users/:userId`: remove every project, log, and setting.
pub async fn reset<S>(
  State(state): State<ApiState<S>>,
  Path(user_id): Path<String>,
) -> Result<Json<ResetSummary>, ApiError>
where
  S: TrackerStore,
{
  let summary = state
    .store
    .reset_user(&user_id)
    .await
    .map_err(ApiError::store("Failed to reset user data"))?;
  tracing::info!(
    %user_id,
    projects_removed = summary.projects_removed,
    logs_removed = summary.logs_removed,
    "user data reset"
  );
  Ok(Json(summary))
}
