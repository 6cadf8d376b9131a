//! On-track classification.
//!
//! Progress is compared against a straight line from 0 on day 1 to 100 on the
//! deadline day. A cumulative score at or above the line is on track; up to
//! 15 points below is slightly behind; anything further is behind schedule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  dates::{days_remaining, days_since, has_today_log},
  log::Log,
  project::Project,
};

/// Width of the "slightly behind" band below the expected line.
pub const SLACK_POINTS: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
  OnTrack,
  SlightlyBehind,
  Behind,
}

impl ProgressStatus {
  pub fn label(self) -> &'static str {
    match self {
      Self::OnTrack => "On Track",
      Self::SlightlyBehind => "Slightly Behind",
      Self::Behind => "Behind Schedule",
    }
  }
}

/// Score the linear schedule expects by `day` of a `deadline`-day project.
pub fn expected_score(day: i64, deadline: u32) -> f64 {
  100.0 * day as f64 / f64::from(deadline.max(1))
}

/// Classify `cumulative_score` against the expected score for `day`.
pub fn classify(cumulative_score: f64, day: i64, deadline: u32) -> ProgressStatus {
  let pace = cumulative_score - expected_score(day, deadline);
  if pace >= 0.0 {
    ProgressStatus::OnTrack
  } else if pace > -SLACK_POINTS {
    ProgressStatus::SlightlyBehind
  } else {
    ProgressStatus::Behind
  }
}

/// Derived, never-stored view of a project's progress on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
  pub day:                  i64,
  pub deadline:             u32,
  pub days_remaining:       i64,
  pub expected_score:       f64,
  pub cumulative_score:     f64,
  pub max_score:            f64,
  pub pace:                 f64,
  pub status:               ProgressStatus,
  pub label:                String,
  pub logged_today:         bool,
  pub completed_milestones: usize,
  pub total_milestones:     usize,
}

impl ProgressReport {
  pub fn compute(project: &Project, logs: &[Log], today: NaiveDate) -> Self {
    let day = days_since(project.start_date, today);
    let expected = expected_score(day, project.deadline);
    let status = classify(project.cumulative_score, day, project.deadline);

    Self {
      day,
      deadline: project.deadline,
      days_remaining: days_remaining(project.start_date, project.deadline, today),
      expected_score: expected,
      cumulative_score: project.cumulative_score,
      max_score: project.max_score(),
      pace: project.cumulative_score - expected,
      status,
      label: status.label().to_owned(),
      logged_today: has_today_log(logs, today),
      completed_milestones: project.completed_milestones.len(),
      total_milestones: project.milestones.len(),
    }
  }
}
