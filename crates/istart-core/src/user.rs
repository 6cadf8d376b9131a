//! User settings, the only per-user record besides projects and logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Settings for one client-generated user identifier.
///
/// The identifier is opaque; it is not an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub user_id:    String,
  /// Generative-language API key; empty when the user has not set one.
  pub api_key:    String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  /// The stored API key, or `None` when it is blank.
  pub fn api_key(&self) -> Option<&str> {
    let key = self.api_key.trim();
    (!key.is_empty()).then_some(key)
  }
}

/// Body accepted by the settings upsert.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
  #[serde(default)]
  pub api_key: String,
}

/// What a bulk reset removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSummary {
  pub projects_removed: usize,
  pub logs_removed:     usize,
}
