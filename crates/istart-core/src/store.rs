//! The `TrackerStore` trait.
//!
//! Implemented by storage backends (e.g. `istart-store-sqlite`). The REST
//! layer depends on this abstraction, not on any concrete backend.
//!
//! Every operation is scoped by the owning user id; a project or log that
//! belongs to another user is indistinguishable from a missing one.

use std::future::Future;

use crate::{
  log::{Log, NewLog},
  project::{NewProject, Project, ProjectDeletion, ProjectPatch},
  user::{ResetSummary, User},
};

/// Abstraction over an iStart store backend.
///
/// Domain failures (validation, duplicate ids) are reported as
/// [`crate::Error`] values reachable through the backend error's
/// [`source`](std::error::Error::source) chain.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait TrackerStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Fetch the settings for `user_id`, creating an empty record on first use.
  fn ensure_user<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  /// Set the user's API key, creating the record if needed.
  fn set_api_key<'a>(
    &'a self,
    user_id: &'a str,
    api_key: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  /// Remove every project, every log, and the settings record of `user_id`
  /// in one transaction.
  fn reset_user<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<ResetSummary, Self::Error>> + Send + 'a;

  // ── Projects ──────────────────────────────────────────────────────────

  /// All projects of `user_id`, newest first.
  fn list_projects<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Project>, Self::Error>> + Send + 'a;

  /// Returns `None` if the project does not exist for this user.
  fn get_project<'a>(
    &'a self,
    user_id: &'a str,
    project_id: &'a str,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + 'a;

  /// Validate and persist a new project owned by `user_id`.
  fn create_project<'a>(
    &'a self,
    user_id: &'a str,
    input: NewProject,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + 'a;

  /// Merge `patch` into the project and refresh `updated_at`.
  /// Returns `None` if the project does not exist for this user.
  fn update_project<'a>(
    &'a self,
    user_id: &'a str,
    project_id: &'a str,
    patch: ProjectPatch,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + 'a;

  /// Delete the project and all of its logs atomically.
  /// Returns `None` if the project does not exist for this user.
  fn delete_project<'a>(
    &'a self,
    user_id: &'a str,
    project_id: &'a str,
  ) -> impl Future<Output = Result<Option<ProjectDeletion>, Self::Error>> + Send + 'a;

  // ── Logs ──────────────────────────────────────────────────────────────

  /// Logs of one project ordered by day, oldest first.
  fn list_logs<'a>(
    &'a self,
    user_id: &'a str,
    project_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Log>, Self::Error>> + Send + 'a;

  /// Validate and persist a log. Does not touch the project.
  fn create_log<'a>(
    &'a self,
    user_id: &'a str,
    project_id: &'a str,
    input: NewLog,
  ) -> impl Future<Output = Result<Log, Self::Error>> + Send + 'a;

  /// Remove every log of a project; returns how many were removed.
  fn delete_logs<'a>(
    &'a self,
    user_id: &'a str,
    project_id: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Persist a scored daily log and add its score to the project's
  /// cumulative score in a single transaction.
  ///
  /// Fails with [`crate::Error::ProjectNotFound`] if the project is missing.
  fn record_daily_log<'a>(
    &'a self,
    user_id: &'a str,
    project_id: &'a str,
    input: NewLog,
  ) -> impl Future<Output = Result<(Log, Project), Self::Error>> + Send + 'a;
}
