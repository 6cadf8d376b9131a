//! `POST /score`: the raw scoring proxy.
//!
//! Takes a ready-made prompt, forwards it with the server key, and returns
//! the validated `{score, analysis, onTrack, suggestion}`.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use istart_core::store::TrackerStore;
use istart_scoring::Assessment;
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ScoreBody {
  #[serde(default)]
  pub prompt: Option<String>,
}

pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<ScoreBody>, JsonRejection>,
) -> Result<Json<Assessment>, ApiError>
where
  S: TrackerStore,
{
  let prompt = body
    .ok()
    .and_then(|Json(b)| b.prompt)
    .filter(|p| !p.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("Prompt is required".to_owned()))?;

  let assessment = state.scorer.score(&prompt, None).await?;
  Ok(Json(assessment))
}
