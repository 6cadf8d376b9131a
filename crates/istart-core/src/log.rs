//! Daily work logs.
//!
//! A log is written once per daily submission and never updated. Logs are
//! only ever removed together with their project.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Upper bound of a single day's score.
pub const MAX_DAILY_SCORE: f64 = 20.0;

/// One scored day of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
  pub id:         Uuid,
  pub project_id: String,
  pub user_id:    String,
  /// 1-indexed day since the project's start date.
  pub day:        i64,
  pub work:       String,
  pub score:      f64,
  pub date:       NaiveDate,
  pub analysis:   String,
  pub suggestion: String,
  pub on_track:   bool,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::TrackerStore::create_log`].
///
/// `user_id` and `project_id` come from the request path, never the body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLog {
  pub day:        i64,
  #[serde(default)]
  pub work:       String,
  pub score:      f64,
  /// Defaults to the day the log is stored.
  #[serde(default)]
  pub date:       Option<NaiveDate>,
  #[serde(default)]
  pub analysis:   String,
  #[serde(default)]
  pub suggestion: String,
  pub on_track:   bool,
}

impl NewLog {
  /// Trim the free text and check the storage-level constraints.
  pub fn validate(mut self) -> Result<Self> {
    self.work = self.work.trim().to_owned();
    if self.work.is_empty() {
      return Err(Error::MissingField("work"));
    }
    if !self.score.is_finite() || !(0.0..=MAX_DAILY_SCORE).contains(&self.score) {
      return Err(Error::ScoreOutOfRange(self.score));
    }
    Ok(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(score: f64) -> NewLog {
    NewLog {
      day: 1,
      work: "  wrote the parser ".into(),
      score,
      date: None,
      analysis: String::new(),
      suggestion: String::new(),
      on_track: true,
    }
  }

  #[test]
  fn validate_trims_work() {
    let log = entry(12.0).validate().unwrap();
    assert_eq!(log.work, "wrote the parser");
  }

  #[test]
  fn validate_accepts_score_bounds() {
    assert!(entry(0.0).validate().is_ok());
    assert!(entry(20.0).validate().is_ok());
  }

  #[test]
  fn validate_rejects_out_of_range_score() {
    assert!(matches!(entry(20.5).validate(), Err(Error::ScoreOutOfRange(_))));
    assert!(matches!(entry(-1.0).validate(), Err(Error::ScoreOutOfRange(_))));
    assert!(matches!(entry(f64::NAN).validate(), Err(Error::ScoreOutOfRange(_))));
  }

  #[test]
  fn validate_rejects_blank_work() {
    let mut input = entry(5.0);
    input.work = "   ".into();
    assert!(matches!(input.validate(), Err(Error::MissingField("work"))));
  }
}
