//! Error types for `istart-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} is required")]
  MissingField(&'static str),

  #[error("deadline must be at least 1 day")]
  DeadlineTooShort,

  #[error("score {0} is outside 0-20")]
  ScoreOutOfRange(f64),

  #[error("cumulative score cannot be negative (got {0})")]
  NegativeCumulativeScore(f64),

  #[error("milestone {index} does not exist (project has {count})")]
  MilestoneOutOfRange { index: usize, count: usize },

  #[error("project {0} already exists")]
  ProjectExists(String),

  #[error("project not found: {0}")]
  ProjectNotFound(String),
}

impl Error {
  /// Whether the error was caused by bad caller input rather than by the
  /// store or the environment.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::MissingField(_)
        | Self::DeadlineTooShort
        | Self::ScoreOutOfRange(_)
        | Self::NegativeCumulativeScore(_)
        | Self::MilestoneOutOfRange { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
