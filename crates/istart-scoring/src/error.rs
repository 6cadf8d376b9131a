//! Error type for `istart-scoring`.

use thiserror::Error;

/// Why a scoring request failed. The `Display` text is safe to show users.
#[derive(Debug, Error)]
pub enum ScoreError {
  /// Neither the user nor the server has an API key configured.
  #[error("Gemini API key not configured")]
  MissingApiKey,

  /// The upstream API answered with a non-2xx status.
  #[error("{message}")]
  Upstream { status: u16, message: String },

  /// The upstream API succeeded but returned no candidate text.
  #[error("No response from AI")]
  EmptyResponse,

  /// The model's reply (or the API envelope) was not valid JSON.
  #[error("Failed to parse AI response")]
  Parse(#[source] serde_json::Error),

  /// The reply was JSON but not `{score, analysis, onTrack, suggestion}`.
  #[error("Invalid response format from AI")]
  InvalidFormat,

  /// The HTTP request itself failed (network, DNS, TLS, timeout).
  #[error("HTTP request failed: {0}")]
  Request(#[source] reqwest::Error),
}

// The request URL is dropped so no endpoint detail reaches callers or logs.
impl From<reqwest::Error> for ScoreError {
  fn from(e: reqwest::Error) -> Self { Self::Request(e.without_url()) }
}

impl ScoreError {
  /// Stable machine-readable classification.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::MissingApiKey => "key_missing",
      Self::Upstream { .. } => "upstream_error",
      Self::EmptyResponse => "empty_response",
      Self::Parse(_) => "parse_error",
      Self::InvalidFormat => "invalid_format",
      Self::Request(_) => "request_failed",
    }
  }
}

pub type Result<T, E = ScoreError> = std::result::Result<T, E>;
