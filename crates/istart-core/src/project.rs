//! Projects: the unit a user tracks progress against.

use chrono::{DateTime, NaiveDate, Utc};
use rand_core::{OsRng, RngCore as _};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, log::MAX_DAILY_SCORE};

// ─── Project ─────────────────────────────────────────────────────────────────

/// A tracked project with a day-based deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
  pub id:                   String,
  pub user_id:              String,
  pub name:                 String,
  pub description:          String,
  /// Milestone labels in display order.
  pub milestones:           Vec<String>,
  /// Length of the project in days; always at least 1.
  pub deadline:             u32,
  pub start_date:           NaiveDate,
  /// Running total of every daily score logged so far.
  pub cumulative_score:     f64,
  /// Indices into `milestones`, in the order they were completed.
  pub completed_milestones: Vec<usize>,
  pub created_at:           DateTime<Utc>,
  pub updated_at:           DateTime<Utc>,
}

impl Project {
  /// Best achievable cumulative score: a perfect score every day.
  pub fn max_score(&self) -> f64 { MAX_DAILY_SCORE * f64::from(self.deadline) }

  /// Completed-milestone list after toggling `index`: removed if present,
  /// appended otherwise.
  pub fn toggled_milestones(&self, index: usize) -> Result<Vec<usize>> {
    if index >= self.milestones.len() {
      return Err(Error::MilestoneOutOfRange {
        index,
        count: self.milestones.len(),
      });
    }

    let mut completed = self.completed_milestones.clone();
    if completed.contains(&index) {
      completed.retain(|&i| i != index);
    } else {
      completed.push(index);
    }
    Ok(completed)
  }
}

// ─── NewProject ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::TrackerStore::create_project`].
///
/// The owning user comes from the request path. `id` is normally supplied by
/// the client; one is generated when it is absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
  #[serde(default)]
  pub id:                   Option<String>,
  #[serde(default)]
  pub name:                 String,
  #[serde(default)]
  pub description:          String,
  #[serde(default)]
  pub milestones:           Vec<String>,
  #[serde(default)]
  pub deadline:             u32,
  /// Defaults to the creation date.
  #[serde(default)]
  pub start_date:           Option<NaiveDate>,
  #[serde(default)]
  pub cumulative_score:     f64,
  #[serde(default)]
  pub completed_milestones: Vec<usize>,
}

impl NewProject {
  /// Trim text fields, drop blank milestones, and check the invariants the
  /// store relies on.
  pub fn validate(mut self) -> Result<Self> {
    self.id = self
      .id
      .map(|id| id.trim().to_owned())
      .filter(|id| !id.is_empty());
    self.name = self.name.trim().to_owned();
    self.description = self.description.trim().to_owned();
    self.milestones = clean_milestones(self.milestones);
    let count = self.milestones.len();
    self.completed_milestones.retain(|&i| i < count);

    if self.name.is_empty() {
      return Err(Error::MissingField("name"));
    }
    if self.description.is_empty() {
      return Err(Error::MissingField("description"));
    }
    if self.deadline < 1 {
      return Err(Error::DeadlineTooShort);
    }
    check_cumulative(self.cumulative_score)?;
    Ok(self)
  }
}

// ─── ProjectPatch ────────────────────────────────────────────────────────────

/// Partial update accepted by `PUT /api/projects/:userId/:projectId`.
///
/// Clients send the whole project document back; fields that are not
/// mutable here (`id`, `userId`, timestamps) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
  pub name:                 Option<String>,
  pub description:          Option<String>,
  pub milestones:           Option<Vec<String>>,
  pub deadline:             Option<u32>,
  pub start_date:           Option<NaiveDate>,
  pub cumulative_score:     Option<f64>,
  pub completed_milestones: Option<Vec<usize>>,
}

impl ProjectPatch {
  pub fn validate(&self) -> Result<()> {
    if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::MissingField("name"));
    }
    if self.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
      return Err(Error::MissingField("description"));
    }
    if self.deadline == Some(0) {
      return Err(Error::DeadlineTooShort);
    }
    if let Some(score) = self.cumulative_score {
      check_cumulative(score)?;
    }
    Ok(())
  }

  /// Merge the present fields into `project`. Does not touch `updated_at`.
  ///
  /// Milestones are cleaned like [`NewProject::validate`] does, and completed
  /// indices that no longer name a milestone are dropped.
  pub fn apply(self, project: &mut Project) {
    if let Some(name) = self.name {
      project.name = name.trim().to_owned();
    }
    if let Some(description) = self.description {
      project.description = description.trim().to_owned();
    }
    if let Some(milestones) = self.milestones {
      project.milestones = clean_milestones(milestones);
    }
    if let Some(deadline) = self.deadline {
      project.deadline = deadline;
    }
    if let Some(start_date) = self.start_date {
      project.start_date = start_date;
    }
    if let Some(score) = self.cumulative_score {
      project.cumulative_score = score;
    }
    if let Some(completed) = self.completed_milestones {
      project.completed_milestones = completed;
    }
    let count = project.milestones.len();
    project.completed_milestones.retain(|&i| i < count);
  }
}

/// Result of a cascading project delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDeletion {
  pub logs_removed: usize,
}

fn clean_milestones(milestones: Vec<String>) -> Vec<String> {
  milestones
    .into_iter()
    .map(|m| m.trim().to_owned())
    .filter(|m| !m.is_empty())
    .collect()
}

fn check_cumulative(score: f64) -> Result<()> {
  if !score.is_finite() || score < 0.0 {
    return Err(Error::NegativeCumulativeScore(score));
  }
  Ok(())
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a project id of the form `proj-<unix millis>-<9 base36 chars>`.
pub fn generate_project_id(now: DateTime<Utc>) -> String {
  let mut n = OsRng.next_u64();
  let suffix: String = (0..9)
    .map(|_| {
      let c = BASE36[(n % 36) as usize] as char;
      n /= 36;
      c
    })
    .collect();
  format!("proj-{}-{suffix}", now.timestamp_millis())
}
