//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with microsecond
//! precision, so lexical order matches chronological order. Calendar dates are
//! `YYYY-MM-DD`. Lists are compact JSON. UUIDs are hyphenated lowercase.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use istart_core::{log::Log, project::Project, user::User};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Current time truncated to the precision the store keeps, so values handed
/// back to callers equal what a later read returns.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── JSON lists ──────────────────────────────────────────────────────────────

pub fn encode_labels(labels: &[String]) -> Result<String> {
  Ok(serde_json::to_string(labels)?)
}

pub fn decode_labels(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

pub fn encode_indices(indices: &[usize]) -> Result<String> {
  Ok(serde_json::to_string(indices)?)
}

pub fn decode_indices(s: &str) -> Result<Vec<usize>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawProject::from_row`].
pub const PROJECT_COLUMNS: &str = "project_id, user_id, name, description, milestones, deadline,
   start_date, cumulative_score, completed_milestones, created_at, updated_at";

/// Raw values read directly from a `projects` row.
pub struct RawProject {
  pub project_id:           String,
  pub user_id:              String,
  pub name:                 String,
  pub description:          String,
  pub milestones:           String,
  pub deadline:             i64,
  pub start_date:           String,
  pub cumulative_score:     f64,
  pub completed_milestones: String,
  pub created_at:           String,
  pub updated_at:           String,
}

impl RawProject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      project_id:           row.get(0)?,
      user_id:              row.get(1)?,
      name:                 row.get(2)?,
      description:          row.get(3)?,
      milestones:           row.get(4)?,
      deadline:             row.get(5)?,
      start_date:           row.get(6)?,
      cumulative_score:     row.get(7)?,
      completed_milestones: row.get(8)?,
      created_at:           row.get(9)?,
      updated_at:           row.get(10)?,
    })
  }

  pub fn into_project(self) -> Result<Project> {
    let deadline = u32::try_from(self.deadline)
      .map_err(|_| Error::Corrupt(format!("deadline {} out of range", self.deadline)))?;

    Ok(Project {
      id: self.project_id,
      user_id: self.user_id,
      name: self.name,
      description: self.description,
      milestones: decode_labels(&self.milestones)?,
      deadline,
      start_date: decode_date(&self.start_date)?,
      cumulative_score: self.cumulative_score,
      completed_milestones: decode_indices(&self.completed_milestones)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching the field order of [`RawLog::from_row`].
pub const LOG_COLUMNS: &str = "log_id, project_id, user_id, day, work, score, date,
   analysis, suggestion, on_track, created_at";

/// Raw values read directly from a `logs` row.
pub struct RawLog {
  pub log_id:     String,
  pub project_id: String,
  pub user_id:    String,
  pub day:        i64,
  pub work:       String,
  pub score:      f64,
  pub date:       String,
  pub analysis:   String,
  pub suggestion: String,
  pub on_track:   bool,
  pub created_at: String,
}

impl RawLog {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      log_id:     row.get(0)?,
      project_id: row.get(1)?,
      user_id:    row.get(2)?,
      day:        row.get(3)?,
      work:       row.get(4)?,
      score:      row.get(5)?,
      date:       row.get(6)?,
      analysis:   row.get(7)?,
      suggestion: row.get(8)?,
      on_track:   row.get(9)?,
      created_at: row.get(10)?,
    })
  }

  pub fn into_log(self) -> Result<Log> {
    Ok(Log {
      id:         decode_uuid(&self.log_id)?,
      project_id: self.project_id,
      user_id:    self.user_id,
      day:        self.day,
      work:       self.work,
      score:      self.score,
      date:       decode_date(&self.date)?,
      analysis:   self.analysis,
      suggestion: self.suggestion,
      on_track:   self.on_track,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub api_key:    String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      api_key:    row.get(1)?,
      created_at: row.get(2)?,
      updated_at: row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    self.user_id,
      api_key:    self.api_key,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
