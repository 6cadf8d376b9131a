//! Cleaning and validation of the model's reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, ScoreError};

/// The model's verdict on one day of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
  /// Always within 0-20 after [`parse_assessment`].
  pub score:      f64,
  pub analysis:   String,
  pub on_track:   bool,
  pub suggestion: String,
}

/// Remove a surrounding markdown code fence (```` ```json ```` or
/// ```` ``` ````) if the model added one despite being told not to.
pub fn strip_code_fence(text: &str) -> &str {
  let trimmed = text.trim();
  let Some(body) = trimmed
    .strip_prefix("```json")
    .or_else(|| trimmed.strip_prefix("```"))
  else {
    return trimmed;
  };
  body.strip_suffix("```").unwrap_or(body).trim()
}

pub fn clamp_score(score: f64) -> f64 { score.clamp(0.0, 20.0) }

/// Parse the model's reply into an [`Assessment`].
///
/// Every field must be present with the right JSON type; nothing is
/// defaulted. Out-of-range scores are clamped, not rejected.
pub fn parse_assessment(text: &str) -> Result<Assessment> {
  let value: Value = serde_json::from_str(strip_code_fence(text)).map_err(ScoreError::Parse)?;

  let score = value.get("score").and_then(Value::as_f64);
  let analysis = value.get("analysis").and_then(Value::as_str);
  let on_track = value.get("onTrack").and_then(Value::as_bool);
  let suggestion = value.get("suggestion").and_then(Value::as_str);

  match (score, analysis, on_track, suggestion) {
    (Some(score), Some(analysis), Some(on_track), Some(suggestion)) => Ok(Assessment {
      score: clamp_score(score),
      analysis: analysis.to_owned(),
      on_track,
      suggestion: suggestion.to_owned(),
    }),
    _ => Err(ScoreError::InvalidFormat),
  }
}
