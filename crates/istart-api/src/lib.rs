//! JSON REST API for iStart.
//!
//! Exposes an axum [`Router`] backed by any
//! [`istart_core::store::TrackerStore`] plus a [`GeminiClient`] for scoring.
//! Every route is scoped by a client-supplied user id in the path; there is no
//! authentication. CORS, tracing, and transport are the caller's concern.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", istart_api::api_router(ApiState::new(store, scorer)))
//! ```

pub mod entries;
pub mod error;
pub mod logs;
pub mod projects;
pub mod score;
pub mod users;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use istart_core::store::TrackerStore;
use istart_scoring::GeminiClient;

pub use error::ApiError;

/// Shared handler state.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub scorer: GeminiClient,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, scorer: GeminiClient) -> Self { Self { store, scorer } }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      scorer: self.scorer.clone(),
    }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: TrackerStore + 'static,
{
  Router::new()
    // Projects
    .route("/projects/{user_id}", get(projects::list::<S>).post(projects::create::<S>))
    .route(
      "/projects/{user_id}/{project_id}",
      get(projects::get_one::<S>)
        .put(projects::update::<S>)
        .delete(projects::delete::<S>),
    )
    // Tracking
    .route("/projects/{user_id}/{project_id}/status", get(entries::status::<S>))
    .route("/projects/{user_id}/{project_id}/entries", post(entries::submit::<S>))
    .route(
      "/projects/{user_id}/{project_id}/milestones/{index}",
      post(entries::toggle_milestone::<S>),
    )
    // Logs
    .route(
      "/logs/{user_id}/{project_id}",
      get(logs::list::<S>).post(logs::create::<S>).delete(logs::delete_all::<S>),
    )
    // Users
    .route(
      "/users/{user_id}",
      get(users::get_one::<S>).put(users::update::<S>).delete(users::reset::<S>),
    )
    // Scoring proxy
    .route("/score", post(score::handler::<S>))
    .with_state(state)
}
