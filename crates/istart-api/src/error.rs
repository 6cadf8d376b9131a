//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as `{"error": "<message>"}`. Store failures that
//! carry an [`istart_core::Error`] somewhere in their source chain are mapped
//! to the matching 4xx; anything else is logged and answered with a fixed
//! per-operation 500 message.

use std::error::Error as StdError;

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use istart_scoring::ScoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  Conflict(String),

  /// Scoring failed; the message is already user-presentable.
  #[error("{0}")]
  Scoring(#[from] ScoreError),

  /// Infrastructure failure. `context` is what the client sees.
  #[error("{context}")]
  Store {
    context: &'static str,
    #[source]
    source:  Box<dyn StdError + Send + Sync>,
  },
}

impl ApiError {
  /// Build a `map_err` adapter for a store call.
  ///
  /// `context` is the fixed message returned when the failure is not a
  /// domain error, e.g. `"Failed to fetch projects"`.
  pub fn store<E>(context: &'static str) -> impl FnOnce(E) -> ApiError
  where
    E: StdError + Send + Sync + 'static,
  {
    move |e| {
      if let Some(mapped) = find_core(&e).and_then(Self::from_core) {
        return mapped;
      }
      Self::Store {
        context,
        source: Box::new(e),
      }
    }
  }

  fn from_core(core: &istart_core::Error) -> Option<Self> {
    use istart_core::Error as Core;
    match core {
      Core::ProjectNotFound(_) => Some(Self::NotFound("Project not found".to_owned())),
      Core::ProjectExists(_) => Some(Self::Conflict(core.to_string())),
      e if e.is_validation() => Some(Self::BadRequest(e.to_string())),
      _ => None,
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Scoring(_) | Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<istart_core::Error> for ApiError {
  fn from(e: istart_core::Error) -> Self {
    Self::from_core(&e).unwrap_or_else(|| Self::Store {
      context: "Internal server error",
      source:  Box::new(e),
    })
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

/// First [`istart_core::Error`] in the source chain of `err`, including `err`
/// itself.
fn find_core<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a istart_core::Error> {
  let mut current = Some(err);
  while let Some(e) = current {
    if let Some(core) = e.downcast_ref::<istart_core::Error>() {
      return Some(core);
    }
    current = e.source();
  }
  None
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match &self {
      Self::Store { context, source } => {
        tracing::error!(error = %source, "{context}");
        json!({ "error": context })
      }
      Self::Scoring(e) => {
        tracing::warn!(kind = e.kind(), error = %e, "scoring failed");
        json!({ "error": e.to_string(), "kind": e.kind() })
      }
      other => json!({ "error": other.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}
